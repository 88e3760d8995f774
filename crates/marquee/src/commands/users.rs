//! User command handlers.

use marquee_core::{CreateUserRequest, Dashboard, UpdateUserRequest, User};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;

use super::resource;

pub async fn handle(dashboard: &Dashboard, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List(list) => resource::list::<User>(dashboard, &list, global).await,

        UsersCommand::Create { email, name, role } => {
            let req = CreateUserRequest { email, name, role };
            resource::create::<User>(dashboard, req, global).await
        }

        UsersCommand::Update {
            id,
            email,
            name,
            role,
        } => {
            let req = UpdateUserRequest { email, name, role };
            resource::update::<User>(dashboard, &id, req, global).await
        }

        UsersCommand::Delete { id } => resource::delete::<User>(dashboard, &id, global).await,
    }
}
