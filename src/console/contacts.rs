use rubrica_api_types::{ContactCreateRequest, Resource};

use crate::config::{ContactCreateArgs, ContactsCommand};

use super::print::{print_json, print_list};
use super::{AppContext, ConsoleError};

pub async fn handle(ctx: &AppContext, command: ContactsCommand) -> Result<(), ConsoleError> {
    match command {
        ContactsCommand::List(args) => {
            let snapshot = ctx.list(Resource::Contacts, &args).await?;
            print_list(&snapshot)
        }
        ContactsCommand::Show(args) => {
            let entry = ctx.show(Resource::Contacts, &args.id).await?;
            print_json(&entry.record())
        }
        ContactsCommand::Create(args) => create(ctx, args).await,
        ContactsCommand::Delete(args) => {
            ctx.mutations().delete(Resource::Contacts, &args.id).await?;
            println!("deleted");
            Ok(())
        }
    }
}

async fn create(ctx: &AppContext, args: ContactCreateArgs) -> Result<(), ConsoleError> {
    let payload = ContactCreateRequest {
        customer_id: args.customer_id,
        first_name: args.first_name,
        last_name: args.last_name,
        title: args.title,
        email: args.email,
        phone: args.phone,
        mobile: None,
        is_primary: args.primary,
    };
    let record = ctx
        .mutations()
        .create(Resource::Contacts, serde_json::to_value(&payload)?)
        .await?;
    print_json(&record)
}
