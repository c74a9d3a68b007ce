//! Per-experiment log files
//!
//! Each experiment gets its own handle writing to `<log_dir>/<id>.log`. The
//! handle is passed explicitly to the code that logs; there is no process-wide
//! active logger. Every line is mirrored as a tracing event.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::MergeListener;
use crate::infrastructure::traits::FileSystem;

pub const LOG_EXTENSION: &str = "log";

/// Log handle for one experiment. A disabled handle discards file output.
pub struct ExperimentLog {
    fs: Option<Arc<dyn FileSystem>>,
    path: Option<PathBuf>,
    name: String,
}

impl ExperimentLog {
    /// Opens (and truncates) `<dir>/<name>.log`.
    ///
    /// Handles opened concurrently for the same name share one file.
    ///
    /// Without a directory or with an empty name the handle is disabled. Failing
    /// to create the file also yields a disabled handle; logging never aborts
    /// an experiment.
    pub fn open(fs: Arc<dyn FileSystem>, dir: Option<&Path>, name: &str) -> Self {
        let Some(dir) = dir.filter(|_| !name.is_empty()) else {
            return Self::disabled(name);
        };

        let path = dir.join(format!("{}.{}", sanitize(name), LOG_EXTENSION));
        let created = fs
            .create_dir_all(dir)
            .and_then(|()| fs.write(&path, ""));
        if let Err(e) = created {
            warn!("cannot create log file {}: {}", path.display(), e);
            return Self::disabled(name);
        }

        let log = Self {
            fs: Some(fs),
            path: Some(path),
            name: name.to_string(),
        };
        log.log(format!("Logger \"{}\" was created", name));
        log
    }

    pub fn disabled(name: &str) -> Self {
        Self {
            fs: None,
            path: None,
            name: name.to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn log(&self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        debug!(experiment = %self.name, "{}", msg);
        self.write_line(msg);
    }

    /// Records an error followed by each error in its source chain.
    pub fn log_error(&self, err: &(dyn Error + 'static)) {
        error!(experiment = %self.name, "{}", err);
        self.write_line(&format!("Exception Was Recorded: {}", err));

        let mut source = err.source();
        while let Some(inner) = source {
            self.write_line(&format!("Inner Exception Was Recorded: {}", inner));
            source = inner.source();
        }
    }

    fn write_line(&self, msg: &str) {
        if let (Some(fs), Some(path)) = (&self.fs, &self.path) {
            let line = format!("[LOG {}]: {}", Local::now().format("%H:%M:%S"), msg);
            if let Err(e) = fs.append_line(path, &line) {
                warn!("cannot write log file {}: {}", path.display(), e);
            }
        }
    }
}

impl MergeListener for ExperimentLog {
    fn entry_added(&mut self, key: &str, _value: &str) {
        self.log(format!("Adding {} to ScienceDefs", key));
    }
}

/// Creates `dir` and removes old `.log` files from it. Returns how many were removed.
pub fn clean_log_dir(fs: &dyn FileSystem, dir: &Path) -> ApplicationResult<usize> {
    fs.create_dir_all(dir)
        .with_path_context("create log directory", dir)?;

    let old = fs
        .find_files(dir, LOG_EXTENSION, Some(1))
        .with_path_context("scan log directory", dir)?;
    for file in &old {
        fs.remove_file(file)
            .with_path_context("remove old log", file)?;
    }
    debug!("removed {} old log files from {}", old.len(), dir.display());
    Ok(old.len())
}

/// Maps an experiment id to a safe file stem.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}
