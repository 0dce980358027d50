use rubrica_api_types::{CustomerCreateRequest, CustomerUpdateRequest, Resource};

use crate::config::{CustomerCreateArgs, CustomerUpdateArgs, CustomersCommand};

use super::print::{print_json, print_list};
use super::{AppContext, ConsoleError};

pub async fn handle(ctx: &AppContext, command: CustomersCommand) -> Result<(), ConsoleError> {
    match command {
        CustomersCommand::List(args) => {
            let snapshot = ctx.list(Resource::Customers, &args).await?;
            print_list(&snapshot)
        }
        CustomersCommand::Show(args) => {
            let entry = ctx.show(Resource::Customers, &args.id).await?;
            print_json(&entry.record())
        }
        CustomersCommand::Create(args) => create(ctx, args).await,
        CustomersCommand::Update(args) => update(ctx, args).await,
        CustomersCommand::Delete(args) => {
            ctx.mutations()
                .delete(Resource::Customers, &args.id)
                .await?;
            println!("deleted");
            Ok(())
        }
    }
}

async fn create(ctx: &AppContext, args: CustomerCreateArgs) -> Result<(), ConsoleError> {
    let payload = CustomerCreateRequest {
        customer_type: args.customer_type,
        company_name: args.company_name,
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        website: args.website,
        notes: args.notes,
        ..Default::default()
    };
    let record = ctx
        .mutations()
        .create(Resource::Customers, serde_json::to_value(&payload)?)
        .await?;
    print_json(&record)
}

async fn update(ctx: &AppContext, args: CustomerUpdateArgs) -> Result<(), ConsoleError> {
    let payload = CustomerUpdateRequest {
        customer_type: args.customer_type,
        status: args.status,
        company_name: args.company_name,
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        phone: args.phone,
        website: args.website,
        notes: args.notes,
        ..Default::default()
    };
    let record = ctx
        .mutations()
        .update(Resource::Customers, &args.id, serde_json::to_value(&payload)?)
        .await?;
    print_json(&record)
}
