pub mod record;

pub use record::{History, ReportRecord};

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File-backed history of report records.
///
/// The whole document is rewritten on every save: it is serialized to a
/// temporary file next to the target and renamed over it, so a reader never
/// sees a partially written file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn open_at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history. A missing file is an empty history; an unreadable
    /// or corrupt one is an error and the file is left untouched.
    pub fn load(&self) -> Result<History> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No history at {}, starting fresh", self.path.display());
                return Ok(History::default());
            }
            Err(e) => return Err(self.error(format!("cannot read: {e}"))),
        };
        let history: History =
            serde_json::from_str(&raw).map_err(|e| self.error(format!("corrupt: {e}")))?;
        log::debug!(
            "Loaded {} report(s) from {}",
            history.reports.len(),
            self.path.display()
        );
        Ok(history)
    }

    /// Append `record` and persist the full history.
    pub fn append_and_save(&self, history: &mut History, record: ReportRecord) -> Result<()> {
        history.reports.push(record);
        self.save(history)
    }

    /// Replace the file with `history`.
    pub fn save(&self, history: &History) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| self.error(format!("cannot create directory: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| self.error(format!("cannot create temp file: {e}")))?;
        self.write_document(&mut tmp, history)?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.error(format!("cannot write: {e}")))?;
        tmp.persist(&self.path)
            .map_err(|e| self.error(format!("cannot replace file: {}", e.error)))?;

        log::info!(
            "Saved {} report(s) to {}",
            history.reports.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_document(&self, out: &mut impl Write, history: &History) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, history)
            .map_err(std::io::Error::from)
            .and_then(|()| out.write_all(b"\n"))
            .map_err(|e| self.error(format!("cannot write: {e}")))
    }

    fn error(&self, message: String) -> Error {
        Error::History {
            path: self.path.clone(),
            message,
        }
    }
}
