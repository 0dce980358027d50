use rubrica_api_types::{Resource, TagCreateRequest};

use crate::config::{TagCreateArgs, TagsCommand};

use super::print::{print_json, print_list};
use super::{AppContext, ConsoleError};

pub async fn handle(ctx: &AppContext, command: TagsCommand) -> Result<(), ConsoleError> {
    match command {
        TagsCommand::List(args) => {
            let snapshot = ctx.list(Resource::Tags, &args).await?;
            print_list(&snapshot)
        }
        TagsCommand::Create(args) => create(ctx, args).await,
        TagsCommand::Delete(args) => {
            ctx.mutations().delete(Resource::Tags, &args.id).await?;
            println!("deleted");
            Ok(())
        }
    }
}

async fn create(ctx: &AppContext, args: TagCreateArgs) -> Result<(), ConsoleError> {
    let payload = TagCreateRequest {
        name: args.name,
        color: args.color,
        description: args.description,
    };
    let record = ctx
        .mutations()
        .create(Resource::Tags, serde_json::to_value(&payload)?)
        .await?;
    print_json(&record)
}
