//! Reading run headers and events from JSON-lines files and driving a [`Processor`] over them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::event::{Event, RunHeader};
use crate::processor::{Processor, ProcessorError};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// One line of an input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    RunHeader(RunHeader),
    Event(Event),
}

/// Iterates over the records of a JSON-lines stream, skipping blank lines.
pub struct RecordReader<R> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl RecordReader<BufReader<File>> {
    /// # Errors
    ///
    /// Fails if the file can't be opened.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(
                serde_json::from_str(&line).map_err(|source| SourceError::Parse {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub runs: usize,
    pub events: usize,
}

/// Run `processor` over `records`: `init`, every record in order, then `end`.
///
/// If a record fails to read or process, the loop stops, `end` is still called so the output is
/// closed, and the first error is returned.
///
/// # Errors
///
/// Returns the first read or processing error.
pub fn run<P, I>(processor: &mut P, records: I) -> Result<RunSummary, SourceError>
where
    P: Processor + ?Sized,
    I: IntoIterator<Item = Result<Record, SourceError>>,
{
    processor.init()?;
    let mut summary = RunSummary::default();
    let result = records.into_iter().try_for_each(|record| {
        match record? {
            Record::RunHeader(run) => {
                processor.process_run_header(&run)?;
                summary.runs += 1;
            }
            Record::Event(event) => {
                processor.process_event(&event)?;
                processor.check(&event)?;
                summary.events += 1;
            }
        }
        Ok::<(), SourceError>(())
    });
    let ended = processor.end();
    if let Err(err) = result {
        if let Err(end_err) = ended {
            error!("{} failed to end after an error: {}", processor.name(), end_err);
        }
        return Err(err);
    }
    ended?;
    info!(
        "{}: {} runs, {} events",
        processor.name(),
        summary.runs,
        summary.events
    );
    Ok(summary)
}
