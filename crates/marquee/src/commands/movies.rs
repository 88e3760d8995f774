//! Movie command handlers.

use marquee_core::{CreateMovieRequest, Dashboard, EntityId, Movie, UpdateMovieRequest};

use crate::cli::{GlobalOpts, MovieFields, MoviesArgs, MoviesCommand};
use crate::error::CliError;

use super::resource;

fn tag_ids(tags: Vec<String>) -> Vec<EntityId> {
    tags.into_iter().map(EntityId::from).collect()
}

pub async fn handle(
    dashboard: &Dashboard,
    args: MoviesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        MoviesCommand::List(list) => resource::list::<Movie>(dashboard, &list, global).await,

        MoviesCommand::Create { title, fields } => {
            let MovieFields {
                description,
                year,
                duration,
                genre,
                tags,
                poster_url,
                video_url,
            } = fields;
            let req = CreateMovieRequest {
                title,
                description,
                release_year: year,
                duration_minutes: duration,
                genre_id: genre.map(EntityId::from),
                tag_ids: tag_ids(tags),
                poster_url,
                video_url,
            };
            resource::create::<Movie>(dashboard, req, global).await
        }

        MoviesCommand::Update { id, title, fields } => {
            let MovieFields {
                description,
                year,
                duration,
                genre,
                tags,
                poster_url,
                video_url,
            } = fields;
            // No --tag flags leaves the tag list untouched.
            let tag_ids = (!tags.is_empty()).then(|| tag_ids(tags));
            let req = UpdateMovieRequest {
                title,
                description,
                release_year: year,
                duration_minutes: duration,
                genre_id: genre.map(EntityId::from),
                tag_ids,
                poster_url,
                video_url,
            };
            resource::update::<Movie>(dashboard, &id, req, global).await
        }

        MoviesCommand::Delete { id } => resource::delete::<Movie>(dashboard, &id, global).await,
    }
}
