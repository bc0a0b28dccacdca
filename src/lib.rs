//! Flattens Monte-Carlo truth particles, reconstructed particle-flow objects (PFOs) and their
//! truth links into `evtdata`, a table with one row per event, written to ROOT or Parquet.
pub mod config;
pub mod event;
pub mod flatten;
pub mod four_momentum;
pub mod navigator;
pub mod processor;
pub mod row;
pub mod schema;
pub mod source;
pub mod writer;

pub mod prelude {
    pub use crate::config::{ConfigError, FlattenerConfig};
    pub use crate::event::{
        CalorimeterHit, Cluster, Collection, CollectionType, Event, EventError, McParticle,
        ParticleId, ReconstructedParticle, Relation, RunHeader, Subdetector, Track,
    };
    pub use crate::flatten::{CollectionNames, FlattenError, Flattener, GAMMA_ECAL_THRESHOLD};
    pub use crate::four_momentum::FourMomentum;
    pub use crate::navigator::{Related, RelationNavigator};
    pub use crate::processor::{EventFlattener, Processor, ProcessorError, ProcessorState};
    pub use crate::row::{
        Capacity, ClusterSums, EventRow, HitRecord, McParticleRecord, McRelationRecord, PfoRecord,
        TrackRecord,
    };
    pub use crate::schema::{evtdata_columns, Column, ColumnValues, LeafType, TABLE_NAME};
    pub use crate::source::{run, Record, RecordReader, RunSummary, SourceError};
    pub use crate::writer::{open_tuple, OutputFormat, TupleError, TupleWriter};
}
