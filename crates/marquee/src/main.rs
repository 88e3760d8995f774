mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use marquee_core::{Dashboard, NotificationLevel, Notifier};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need an API connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "marquee", &mut std::io::stdout());
            Ok(())
        }

        // Everything else runs inside a signed-in session
        cmd => {
            let dashboard_config = config::build_dashboard_config(&cli.global)?;
            let (notifier, mut notifications) = Notifier::channel();
            let dashboard = Dashboard::with_notifier(dashboard_config, notifier)?;

            dashboard.sign_in().await?;
            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &dashboard, &cli.global).await;
            dashboard.sign_out().await;

            // Errors are reported through the returned CliError instead.
            let color = output::should_color(&cli.global.color);
            while let Ok(n) = notifications.try_recv() {
                if !cli.global.quiet && n.level != NotificationLevel::Error {
                    eprintln!("{}", output::format_notification(&n, color));
                }
            }
            result
        }
    }
}
