//! List / create / update / delete for any catalog resource.
//!
//! Each handler runs the same controller a dashboard page would: listing
//! goes through a `TableController`, writes through a modal so validation,
//! single-flight and notifications behave identically.

use marquee_core::query::{PARAM_ORDER, PARAM_PAGE, PARAM_PAGE_SIZE, PARAM_SORT};
use marquee_core::{
    Action, ColumnDescriptor, Dashboard, EntityId, ModalHandle, PageAccess, QueryParams, Resource,
    SubmitOutcome, TableView,
};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Query building ──────────────────────────────────────────────────

/// Translate list flags into dashboard URL parameters. Flags override the
/// same keys from `--query`.
pub fn list_params<R: Resource>(args: &ListArgs) -> Result<QueryParams, CliError> {
    let columns = R::columns();
    let mut params = args
        .query
        .as_deref()
        .map(QueryParams::parse)
        .unwrap_or_default();

    if let Some(page) = args.page {
        params.set(PARAM_PAGE, page.to_string());
    }
    if let Some(size) = args.page_size {
        params.set(PARAM_PAGE_SIZE, size.to_string());
    }
    if let Some(ref field) = args.sort {
        require_column(&columns, field, "sort", |c| c.sortable)?;
        params.set(PARAM_SORT, field.clone());
        params.remove(PARAM_ORDER);
    }
    if args.desc {
        params.set(PARAM_ORDER, "desc");
    }
    for expr in &args.filter {
        let (field, value) = expr.split_once('=').ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected FIELD=VALUE, got '{expr}'"),
        })?;
        let field = field.trim();
        require_column(&columns, field, "filter", |c| c.filterable)?;
        params.set(field, value.trim());
    }
    Ok(params)
}

fn require_column<R>(
    columns: &[ColumnDescriptor<R>],
    field: &str,
    what: &str,
    allowed: impl Fn(&ColumnDescriptor<R>) -> bool,
) -> Result<(), CliError> {
    if columns.iter().any(|c| c.key == field && allowed(c)) {
        return Ok(());
    }
    let valid: Vec<_> = columns
        .iter()
        .filter(|c| allowed(c))
        .map(|c| c.key)
        .collect();
    Err(CliError::Validation {
        field: what.into(),
        reason: format!(
            "cannot {what} by '{field}'; choose one of: {}",
            if valid.is_empty() {
                "(none)".into()
            } else {
                valid.join(", ")
            }
        ),
    })
}

// ── Permission gate ─────────────────────────────────────────────────

fn require<R: Resource>(dashboard: &Dashboard, action: Action) -> Result<(), CliError> {
    if dashboard.can::<R>(action) {
        return Ok(());
    }
    Err(CliError::PermissionDenied {
        action: action.to_string(),
        resource: R::KIND.collection().into(),
    })
}

// ── Rendering ───────────────────────────────────────────────────────

fn detail<R: Resource>(item: &R) -> String {
    let pairs: Vec<(&str, String)> = R::columns()
        .iter()
        .map(|c| (c.header, c.cell(item)))
        .collect();
    output::render_detail(&pairs)
}

fn print_item<R: Resource>(item: &R, global: &GlobalOpts) {
    let out = output::render_single(&global.output, item, detail::<R>, |r| r.id().to_string());
    output::print_output(&out, global.quiet);
}

fn submit_result<T>(outcome: SubmitOutcome<T>) -> Result<T, CliError> {
    match outcome {
        SubmitOutcome::Submitted(value) => Ok(value),
        SubmitOutcome::Invalid(errors) => Err(CliError::InvalidFields(errors)),
        SubmitOutcome::Failed(message) => Err(CliError::ApiError { message }),
        SubmitOutcome::Busy | SubmitOutcome::Closed => {
            Err(CliError::Internal("form was not accepting input".into()))
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn list<R: Resource>(
    dashboard: &Dashboard,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if dashboard.page_access::<R>() == PageAccess::NotFound {
        return Err(CliError::NotFound {
            resource: "page".into(),
            identifier: R::KIND.collection().into(),
        });
    }

    let table = dashboard.table::<R>(list_params::<R>(args)?);
    table.refresh().await?;

    let view = table.view();
    let TableView::Ready(page) = &*view else {
        return Err(CliError::Internal("table did not settle".into()));
    };

    let out = output::render_list(
        &global.output,
        &page.items,
        &table.headers(),
        table.rows(),
        |r| r.id().to_string(),
    );
    output::print_output(&out, global.quiet);

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        if let Some(pager) = table.pagination() {
            eprintln!("{pager}");
            tracing::debug!(location = %table.location().to_query_string(), "list settled");
        }
    }
    Ok(())
}

pub async fn create<R: Resource>(
    dashboard: &Dashboard,
    values: R::Create,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require::<R>(dashboard, Action::Create)?;

    let port = dashboard.port::<R>();
    let form = dashboard.form::<R::Create>(format!("Create {}", R::KIND.singular()));
    form.open_with(values);
    let created =
        submit_result(form.submit(|v| async move { port.create(&v).await }).await)?;
    print_item(&created, global);
    Ok(())
}

pub async fn update<R: Resource>(
    dashboard: &Dashboard,
    id: &str,
    values: R::Update,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require::<R>(dashboard, Action::Update)?;

    let id = EntityId::from(id);
    let port = dashboard.port::<R>();
    let form = dashboard.form::<R::Update>(format!("Update {}", R::KIND.singular()));
    form.open_with(values);
    let updated =
        submit_result(form.submit(|v| async move { port.update(&id, &v).await }).await)?;
    print_item(&updated, global);
    Ok(())
}

pub async fn delete<R: Resource>(
    dashboard: &Dashboard,
    id: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require::<R>(dashboard, Action::Delete)?;

    let prompt = format!("Delete {} {id}?", R::KIND.singular());
    if !util::confirm(&prompt, global.yes)? {
        return Err(CliError::Cancelled);
    }

    let id = EntityId::from(id);
    let port = dashboard.port::<R>();
    let modal = dashboard.confirm(format!("Delete {}", R::KIND.singular()));
    modal.open();
    submit_result(modal.confirm(|| async move { port.delete(&id).await }).await)?;
    Ok(())
}
