//! Tag command handlers.

use marquee_core::{CreateTagRequest, Dashboard, Tag, UpdateTagRequest};

use crate::cli::{GlobalOpts, TagsArgs, TagsCommand};
use crate::error::CliError;

use super::resource;

pub async fn handle(dashboard: &Dashboard, args: TagsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TagsCommand::List(list) => resource::list::<Tag>(dashboard, &list, global).await,
        TagsCommand::Create { name } => {
            resource::create::<Tag>(dashboard, CreateTagRequest { name }, global).await
        }
        TagsCommand::Update { id, name } => {
            resource::update::<Tag>(dashboard, &id, UpdateTagRequest { name }, global).await
        }
        TagsCommand::Delete { id } => resource::delete::<Tag>(dashboard, &id, global).await,
    }
}
