//! Storage layer: writes the alignment artifacts to an output directory.
//!
//! Every file is written to a temporary sibling first and then persisted
//! over the destination, so a failed run never leaves a truncated artifact.

use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

pub const MAPPING_FILE: &str = "strongs_to_bhsa.json";
pub const AMBIGUOUS_FILE: &str = "ambiguous_mappings.json";
pub const STATS_FILE: &str = "mapping_stats.txt";
pub const REVERSE_FILE: &str = "bhsa_to_strongs.json";
pub const SUPPLEMENTARY_FILE: &str = "bhsa_supplementary_mapping.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization failed for {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| io_err(&dir, source))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `value` as pretty-printed JSON. Non-ASCII text is kept as is.
    pub fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(name);
        self.persist(&path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, value).map_err(|source| {
                StorageError::Serialize {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            writer.write_all(b"\n").map_err(|source| io_err(&path, source))
        })?;
        Ok(path)
    }

    pub fn write_text(&self, name: &str, text: &str) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(name);
        self.persist(&path, |writer| {
            writer
                .write_all(text.as_bytes())
                .map_err(|source| io_err(&path, source))
        })?;
        Ok(path)
    }

    fn persist<F>(&self, path: &Path, fill: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BufWriter<&NamedTempFile>) -> Result<(), StorageError>,
    {
        let temp = NamedTempFile::new_in(&self.dir).map_err(|source| io_err(path, source))?;
        {
            let mut writer = BufWriter::new(&temp);
            fill(&mut writer)?;
            writer.flush().map_err(|source| io_err(path, source))?;
        }
        temp.persist(path)
            .map_err(|e| io_err(path, e.error))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}
