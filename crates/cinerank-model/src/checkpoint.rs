use crate::record::{CleanedRecord, RawRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the raw extraction table.
pub const RAW_FILE: &str = "imdb_top_movies.csv";
/// File name of the cleaned table.
pub const CLEANED_FILE: &str = "imdb_movies_cleaned.csv";

const RAW_HEADERS: [&str; 5] = ["Rank", "Title", "Year", "IMDb_Rating", "Votes"];
const CLEANED_HEADERS: [&str; 6] = ["Rank", "Title", "Year", "IMDb_Rating", "Votes", "Decade"];

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}

/// Locations of the two checkpoint tables inside an output directory.
#[derive(Debug, Clone)]
pub struct Checkpoints {
    pub raw: PathBuf,
    pub cleaned: PathBuf,
}

impl Checkpoints {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Checkpoints {
            raw: dir.join(RAW_FILE),
            cleaned: dir.join(CLEANED_FILE),
        }
    }

    pub fn write_raw(&self, records: &[RawRecord]) -> Result<(), CheckpointError> {
        write_table(&self.raw, &RAW_HEADERS, records)?;
        tracing::info!(path = %self.raw.display(), rows = records.len(), "Wrote raw checkpoint");
        Ok(())
    }

    pub fn read_raw(&self) -> Result<Vec<RawRecord>, CheckpointError> {
        let records = read_table(&self.raw)?;
        tracing::info!(path = %self.raw.display(), rows = records.len(), "Loaded raw checkpoint");
        Ok(records)
    }

    pub fn write_cleaned(&self, records: &[CleanedRecord]) -> Result<(), CheckpointError> {
        write_table(&self.cleaned, &CLEANED_HEADERS, records)?;
        tracing::info!(path = %self.cleaned.display(), rows = records.len(), "Wrote cleaned checkpoint");
        Ok(())
    }

    pub fn read_cleaned(&self) -> Result<Vec<CleanedRecord>, CheckpointError> {
        let records = read_table(&self.cleaned)?;
        tracing::info!(path = %self.cleaned.display(), rows = records.len(), "Loaded cleaned checkpoint");
        Ok(records)
    }
}

/// Write a whole table next to `path`, then rename it into place.
///
/// Readers see either the previous file or the complete new one. The header
/// row is written even for an empty table.
pub fn write_table<T: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: &[T],
) -> Result<(), CheckpointError> {
    let io_err = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| CheckpointError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let dir = parent_dir(path);
    fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer.write_record(headers).map_err(csv_err)?;
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file_mut().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|source| CheckpointError::Persist {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Read a whole table. A missing file is reported as [`CheckpointError::Missing`].
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CheckpointError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(CheckpointError::Missing(path.to_path_buf()))
        }
        Err(source) => {
            return Err(CheckpointError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    csv::Reader::from_reader(file)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| CheckpointError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
