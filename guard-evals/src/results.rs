//! Evaluation report persistence.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::info;

use crate::error::{EvalError, EvalResult};

/// Writes reports as pretty-printed JSON files under one directory.
#[derive(Clone, Debug)]
pub struct ResultsStore {
    dir: PathBuf,
}

impl ResultsStore {
    /// Creates a store rooted at `dir`. Nothing is created until the first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the results directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialises `data` to `<dir>/<filename>`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Propagates serialisation failures and I/O errors while creating the
    /// directory or writing the file.
    pub async fn save<T>(&self, filename: &str, data: &T) -> EvalResult<PathBuf>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec_pretty(data)?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| EvalError::io(&self.dir, err))?;

        let path = self.dir.join(filename);
        fs::write(&path, body)
            .await
            .map_err(|err| EvalError::io(&path, err))?;

        info!(path = %path.display(), "results saved");
        Ok(path)
    }
}
