use rubrica_api_types::{Resource, SegmentCreateRequest};

use crate::config::{SegmentCreateArgs, SegmentsCommand};

use super::print::{print_json, print_list};
use super::{AppContext, ConsoleError};

pub async fn handle(ctx: &AppContext, command: SegmentsCommand) -> Result<(), ConsoleError> {
    match command {
        SegmentsCommand::List(args) => {
            let snapshot = ctx.list(Resource::Segments, &args).await?;
            print_list(&snapshot)
        }
        SegmentsCommand::Create(args) => create(ctx, args).await,
        SegmentsCommand::Delete(args) => {
            ctx.mutations().delete(Resource::Segments, &args.id).await?;
            println!("deleted");
            Ok(())
        }
    }
}

async fn create(ctx: &AppContext, args: SegmentCreateArgs) -> Result<(), ConsoleError> {
    let payload = SegmentCreateRequest {
        name: args.name,
        description: args.description,
        criteria: args.criteria,
    };
    let record = ctx
        .mutations()
        .create(Resource::Segments, serde_json::to_value(&payload)?)
        .await?;
    print_json(&record)
}
