//! `marquee whoami`: the signed-in identity and its grants.

use std::time::Duration;

use chrono::Utc;

use marquee_core::{Dashboard, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(session: &Session) -> String {
    let grants = session
        .sorted_grants()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let expires = session.expires_at.map_or_else(
        || "-".into(),
        |t| match (t - Utc::now()).to_std() {
            Ok(left) => format!(
                "{} (in {})",
                t.to_rfc3339(),
                humantime::format_duration(Duration::from_secs(left.as_secs()))
            ),
            Err(_) => format!("{} (expired)", t.to_rfc3339()),
        },
    );
    output::render_detail(&[
        ("User", session.user_id.clone()),
        ("Email", session.email.clone()),
        ("Name", session.name.clone().unwrap_or_else(|| "-".into())),
        ("Grants", if grants.is_empty() { "(none)".into() } else { grants }),
        ("Expires", expires),
    ])
}

pub fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let session = dashboard.session().ok_or(CliError::AuthFailed {
        message: "not signed in".into(),
    })?;
    let out = output::render_single(&global.output, &*session, detail, |s| s.email.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
