//! Command dispatch: bridges CLI args -> core controllers -> output formatting.

pub mod config_cmd;
pub mod genres;
pub mod movies;
pub mod rentals;
pub mod resource;
pub mod tags;
pub mod upload;
pub mod users;
pub mod util;
pub mod whoami;

use marquee_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a dashboard-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Genres(args) => genres::handle(dashboard, args, global).await,
        Command::Tags(args) => tags::handle(dashboard, args, global).await,
        Command::Movies(args) => movies::handle(dashboard, args, global).await,
        Command::Rentals(args) => rentals::handle(dashboard, args, global).await,
        Command::Users(args) => users::handle(dashboard, args, global).await,
        Command::Upload(args) => upload::handle(dashboard, args, global).await,
        Command::Whoami => whoami::handle(dashboard, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the dashboard".into(),
        )),
    }
}
