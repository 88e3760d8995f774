//! Rental command handlers.

use marquee_core::{CreateRentalRequest, Dashboard, EntityId, Rental, UpdateRentalRequest};

use crate::cli::{GlobalOpts, RentalsArgs, RentalsCommand};
use crate::error::CliError;

use super::resource;

pub async fn handle(
    dashboard: &Dashboard,
    args: RentalsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RentalsCommand::List(list) => resource::list::<Rental>(dashboard, &list, global).await,

        RentalsCommand::Create {
            user,
            movie,
            price,
            expires_at,
        } => {
            let req = CreateRentalRequest {
                user_id: Some(EntityId::from(user)),
                movie_id: Some(EntityId::from(movie)),
                price_cents: price,
                expires_at,
            };
            resource::create::<Rental>(dashboard, req, global).await
        }

        RentalsCommand::Update {
            id,
            status,
            expires_at,
        } => {
            let req = UpdateRentalRequest { status, expires_at };
            resource::update::<Rental>(dashboard, &id, req, global).await
        }

        RentalsCommand::Delete { id } => resource::delete::<Rental>(dashboard, &id, global).await,
    }
}
