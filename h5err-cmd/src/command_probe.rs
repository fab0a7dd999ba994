use anyhow::Result;
use serde::Serialize;
use std::io::{stdout, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use h5err::native::{FilterInfo, Session};
use h5err::{Error, LibraryError};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Report {
    Ok {
        path: PathBuf,
        dataset: Option<String>,
        bytes: Option<usize>,
        pipeline: Vec<FilterInfo>,
    },
    Failed {
        path: PathBuf,
        dataset: Option<String>,
        pipeline: Vec<FilterInfo>,
        error: LibraryError,
    },
}

// Library errors become the report, anything else is an error of ours.
fn report(session: &Session, path: PathBuf, dataset: Option<String>) -> Result<Report> {
    let mut pipeline: Vec<FilterInfo> = Vec::default();
    let zult = (|| -> h5err::Result<Option<usize>> {
        let file = session.open(&path)?;
        let Some(name) = dataset.as_deref() else {
            return Ok(None);
        };
        let ds = session.dataset(&file, name)?;
        pipeline = session.pipeline(&ds)?;
        for filter in pipeline.iter().filter(|f| !f.available) {
            warn!("filter {} ({}) is not available", filter.id, filter.name);
        }
        Ok(Some(session.read_raw(&ds)?.len()))
    })();

    match zult {
        Ok(bytes) => Ok(Report::Ok {
            path,
            dataset,
            bytes,
            pipeline,
        }),
        Err(Error::Library(error)) => Ok(Report::Failed {
            path,
            dataset,
            pipeline,
            error,
        }),
        Err(err) => Err(err.into()),
    }
}

fn write_report<W: Write>(
    session: &Session,
    path: PathBuf,
    dataset: Option<String>,
    mut out: W,
) -> Result<bool> {
    let report = report(session, path, dataset)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    match &report {
        Report::Ok { .. } => Ok(true),
        Report::Failed { error, .. } => {
            info!("probe failed: {error}");
            Ok(false)
        }
    }
}

/// Returns false if the library reported an error.
pub fn probe(session: Session, input: PathBuf, dataset: Option<String>) -> Result<bool> {
    write_report(&session, input, dataset, stdout())
}
