//! `marquee upload`: push media to the blob store and print the URLs.

use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use marquee_core::{
    AcceptSet, Dashboard, LocalFile, RemoteBlobStore, UploadEvent, UploadJob, UploadPipeline,
    UploadStatus,
};

use crate::cli::{GlobalOpts, UploadArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Uploaded {
    file: String,
    mime: String,
    size: usize,
    url: String,
}

impl From<&UploadJob> for Uploaded {
    fn from(job: &UploadJob) -> Self {
        Self {
            file: job.file_name.clone(),
            mime: job.mime.clone(),
            size: job.size,
            url: job
                .result_url
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

fn progress_message(jobs: &[UploadJob]) -> String {
    let done = jobs.iter().filter(|j| j.status == UploadStatus::Done).count();
    let active = jobs
        .iter()
        .filter(|j| j.status == UploadStatus::Uploading)
        .count();
    format!("Uploaded {done}/{} ({active} in flight)", jobs.len())
}

pub async fn handle(
    dashboard: &Dashboard,
    args: UploadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let files = args
        .files
        .iter()
        .map(|p| LocalFile::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;
    let total: usize = files.iter().map(LocalFile::size).sum();

    let (pipeline, mut events) = UploadPipeline::with_concurrency(
        Arc::new(RemoteBlobStore::new(Arc::clone(dashboard.client()))),
        AcceptSet::new(&dashboard.config().upload_accept),
        args.concurrency,
    );

    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .map_err(|e| CliError::Internal(e.to_string()))?,
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!(
        "Uploading {} file(s), {}",
        files.len(),
        ByteSize(u64::try_from(total).unwrap_or(u64::MAX))
    ));

    let batch = pipeline.handle_file_select(files)?;
    let batch_jobs = || -> Vec<UploadJob> {
        let mut jobs: Vec<_> = pipeline
            .jobs()
            .into_iter()
            .filter(|j| j.batch == batch.id)
            .collect();
        jobs.sort_by_key(|j| j.index);
        jobs
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(UploadEvent::Completed { batch: id, .. }) if id == batch.id => break Ok(()),
                Some(UploadEvent::Failed { batch: id, message }) if id == batch.id => {
                    break Err(CliError::UploadFailed { message });
                }
                Some(_) => {}
                None => break Err(CliError::Internal("upload pipeline closed".into())),
            },
            _ = ticker.tick() => spinner.set_message(progress_message(&batch_jobs())),
        }
    };

    if let Err(err) = outcome {
        spinner.abandon_with_message("Upload failed");
        return Err(err);
    }
    spinner.finish_and_clear();

    let jobs = batch_jobs();
    let uploaded: Vec<Uploaded> = jobs.iter().map(Uploaded::from).collect();
    let rows = uploaded
        .iter()
        .map(|u| {
            vec![
                u.file.clone(),
                u.mime.clone(),
                ByteSize(u64::try_from(u.size).unwrap_or(u64::MAX)).to_string(),
                u.url.clone(),
            ]
        })
        .collect();
    let out = output::render_list(
        &global.output,
        &uploaded,
        &["File", "Type", "Size", "URL"],
        rows,
        |u| u.url.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
