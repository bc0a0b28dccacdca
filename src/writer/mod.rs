//! Output tables for [`EventRow`]s.
//!
//! The format is picked from the output file extension: `.root` files get a ROOT tree,
//! `.parquet` files a Parquet table. Both carry the columns of
//! [`evtdata_columns`](crate::schema::evtdata_columns).
//!
//! Writers fill a scratch file next to the output and move it into place when closed. A writer
//! dropped without [`close`](TupleWriter::close) leaves nothing at the output path.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use tempfile::TempDir;
use thiserror::Error;

use crate::row::EventRow;
use crate::schema::TABLE_NAME;

mod parquet_tuple;
mod root_tuple;

pub use parquet_tuple::ParquetTupleWriter;
pub use root_tuple::RootTupleWriter;

#[derive(Error, Debug)]
pub enum TupleError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parquet(#[from] ParquetError),
    #[error(transparent)]
    Arrow(#[from] ArrowError),
    #[error("ROOT output failed: {0}")]
    Root(String),
    #[error("Cannot tell the output format of {path:?}, expected a .root or .parquet file")]
    UnsupportedFormat { path: PathBuf },
    #[error("Column {column:?} produced values of the wrong type")]
    ColumnMismatch { column: &'static str },
}

pub(crate) fn root_error<E: std::fmt::Display>(context: &str, err: E) -> TupleError {
    TupleError::Root(format!("{context}: {err}")) // oxyroot doesn't export its error type
}

/// Scratch location for an output file, removed on drop unless committed.
pub(crate) struct Staged {
    dir: TempDir,
    target: PathBuf,
}

impl Staged {
    pub(crate) fn new(target: &Path) -> Result<Self, TupleError> {
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let dir = tempfile::Builder::new()
            .prefix(".evtflat-")
            .tempdir_in(parent)?;
        Ok(Self {
            dir,
            target: target.to_path_buf(),
        })
    }

    pub(crate) fn path(&self) -> PathBuf {
        self.dir
            .path()
            .join(self.target.file_name().unwrap_or(OsStr::new(TABLE_NAME)))
    }

    pub(crate) fn target(&self) -> &Path {
        &self.target
    }

    /// Move the finished file to the output path.
    pub(crate) fn commit(self) -> Result<(), TupleError> {
        fs::rename(self.path(), &self.target)?;
        Ok(())
    }
}

/// A table receiving one row per event.
pub trait TupleWriter {
    /// Append one row.
    ///
    /// # Errors
    ///
    /// Fails if the underlying file can't be written.
    fn fill(&mut self, row: &EventRow) -> Result<(), TupleError>;

    /// Number of rows filled so far.
    fn entries(&self) -> usize;

    /// Flush everything and close the file, returning the number of rows written.
    ///
    /// # Errors
    ///
    /// Fails if the remaining rows or the file trailer can't be written.
    fn close(self: Box<Self>) -> Result<usize, TupleError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Root,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self, TupleError> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("root") => Ok(Self::Root),
            Some("parquet") | Some("pq") => Ok(Self::Parquet),
            _ => Err(TupleError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Create the output file at `path` and return a writer for it. `batch_size` is the number of
/// rows buffered between Parquet record batches and is ignored for ROOT output.
///
/// # Errors
///
/// Fails for unknown extensions or if the file can't be created.
pub fn open_tuple(path: &Path, batch_size: usize) -> Result<Box<dyn TupleWriter>, TupleError> {
    Ok(match OutputFormat::from_path(path)? {
        OutputFormat::Root => Box::new(RootTupleWriter::create(path)?),
        OutputFormat::Parquet => Box::new(ParquetTupleWriter::create(path, batch_size)?),
    })
}
