use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::FlattenerConfig;
use crate::event::{Event, RunHeader};
use crate::flatten::{FlattenError, Flattener};
use crate::writer::{open_tuple, TupleError, TupleWriter};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Flatten(#[from] FlattenError),
    #[error(transparent)]
    Tuple(#[from] TupleError),
    #[error("{processor}: {call} called while {state:?}")]
    Lifecycle {
        processor: String,
        call: &'static str,
        state: ProcessorState,
    },
}

/// An event-processing step driven by the event loop.
///
/// The loop calls [`init`](Processor::init) once, then for every run a
/// [`process_run_header`](Processor::process_run_header) followed by that run's events, and
/// finally [`end`](Processor::end) once.
pub trait Processor {
    fn name(&self) -> &str;
    fn description(&self) -> &str {
        ""
    }
    fn init(&mut self) -> Result<(), ProcessorError>;
    fn process_run_header(&mut self, run: &RunHeader) -> Result<(), ProcessorError>;
    fn process_event(&mut self, event: &Event) -> Result<(), ProcessorError>;
    /// Called after [`process_event`](Processor::process_event) for the same event.
    fn check(&mut self, _event: &Event) -> Result<(), ProcessorError> {
        Ok(())
    }
    fn end(&mut self) -> Result<(), ProcessorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Created,
    Running,
    Ended,
}

/// Writes one `evtdata` row per event with the MC particles, PFOs and calorimeter hits of the
/// configured collections.
pub struct EventFlattener {
    config: FlattenerConfig,
    flattener: Flattener,
    writer: Option<Box<dyn TupleWriter>>,
    state: ProcessorState,
    n_run: usize,
    n_evt: usize,
}

impl EventFlattener {
    pub const NAME: &'static str = "EventFlattener";

    pub fn new(config: FlattenerConfig) -> Self {
        let flattener = Flattener::new(config.collection_names(), config.capacity);
        Self {
            config,
            flattener,
            writer: None,
            state: ProcessorState::Created,
            n_run: 0,
            n_evt: 0,
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn n_run(&self) -> usize {
        self.n_run
    }

    pub fn n_evt(&self) -> usize {
        self.n_evt
    }

    fn expect_state(&self, call: &'static str, state: ProcessorState) -> Result<(), ProcessorError> {
        if self.state != state {
            return Err(ProcessorError::Lifecycle {
                processor: Self::NAME.to_string(),
                call,
                state: self.state,
            });
        }
        Ok(())
    }

    fn print_parameters(&self) {
        info!(
            "{} parameters: {}",
            Self::NAME,
            self.config
                .parameters()
                .iter()
                .map(|(name, value)| format!("{name} = {value}"))
                .join(", ")
        );
    }
}

impl Processor for EventFlattener {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Flattens MC particles, PFOs and their truth links into the evtdata tuple"
    }

    fn init(&mut self) -> Result<(), ProcessorError> {
        self.expect_state("init", ProcessorState::Created)?;
        debug!("init called");
        self.print_parameters();
        self.n_run = 0;
        self.n_evt = 0;
        self.writer = Some(open_tuple(&self.config.output_file, self.config.batch_size)?);
        self.state = ProcessorState::Running;
        Ok(())
    }

    fn process_run_header(&mut self, run: &RunHeader) -> Result<(), ProcessorError> {
        self.expect_state("process_run_header", ProcessorState::Running)?;
        debug!("run {} ({})", run.run_number, run.detector_name);
        self.n_run += 1;
        Ok(())
    }

    fn process_event(&mut self, event: &Event) -> Result<(), ProcessorError> {
        self.expect_state("process_event", ProcessorState::Running)?;
        let row = self.flattener.flatten(event, self.n_evt as i32)?;
        if let Some(writer) = self.writer.as_mut() {
            writer.fill(&row)?;
        }
        debug!(
            "processing event: {} in run: {}",
            event.event_number, event.run_number
        );
        self.n_evt += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<(), ProcessorError> {
        self.expect_state("end", ProcessorState::Running)?;
        self.state = ProcessorState::Ended;
        let entries = match self.writer.take() {
            Some(writer) => writer.close()?,
            None => 0,
        };
        info!(
            "{} processed {} events in {} runs, {} entries written to {}",
            Self::NAME,
            self.n_evt,
            self.n_run,
            entries,
            self.config.output_file.display()
        );
        Ok(())
    }
}
