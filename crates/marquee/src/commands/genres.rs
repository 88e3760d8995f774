//! Genre command handlers.

use marquee_core::{CreateGenreRequest, Dashboard, Genre, UpdateGenreRequest};

use crate::cli::{GenresArgs, GenresCommand, GlobalOpts};
use crate::error::CliError;

use super::resource;

pub async fn handle(
    dashboard: &Dashboard,
    args: GenresArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GenresCommand::List(list) => resource::list::<Genre>(dashboard, &list, global).await,

        GenresCommand::Create { name, description } => {
            let req = CreateGenreRequest { name, description };
            resource::create::<Genre>(dashboard, req, global).await
        }

        GenresCommand::Update {
            id,
            name,
            description,
        } => {
            let req = UpdateGenreRequest { name, description };
            resource::update::<Genre>(dashboard, &id, req, global).await
        }

        GenresCommand::Delete { id } => resource::delete::<Genre>(dashboard, &id, global).await,
    }
}
