use rubrica_api_types::{Resource, TicketCreateRequest};

use crate::config::{TicketCreateArgs, TicketsCommand};

use super::print::{print_json, print_list};
use super::{AppContext, ConsoleError};

pub async fn handle(ctx: &AppContext, command: TicketsCommand) -> Result<(), ConsoleError> {
    match command {
        TicketsCommand::List(args) => {
            let snapshot = ctx.list(Resource::SupportTickets, &args).await?;
            print_list(&snapshot)
        }
        TicketsCommand::Show(args) => {
            let entry = ctx.show(Resource::SupportTickets, &args.id).await?;
            print_json(&entry.record())
        }
        TicketsCommand::Create(args) => create(ctx, args).await,
        TicketsCommand::Delete(args) => {
            ctx.mutations()
                .delete(Resource::SupportTickets, &args.id)
                .await?;
            println!("deleted");
            Ok(())
        }
    }
}

async fn create(ctx: &AppContext, args: TicketCreateArgs) -> Result<(), ConsoleError> {
    let payload = TicketCreateRequest {
        customer_id: args.customer_id,
        subject: args.subject,
        description: args.description,
        priority: args.priority,
        category: args.category,
    };
    let record = ctx
        .mutations()
        .create(Resource::SupportTickets, serde_json::to_value(&payload)?)
        .await?;
    print_json(&record)
}
