use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::four_momentum::FourMomentum;

/// Bit of the simulator status word flagging particles created by the detector simulation.
pub const BIT_CREATED_IN_SIMULATION: u32 = 30;

/// Number of subdetector energy channels carried by a [`Cluster`].
pub const N_SUBDETECTORS: usize = 6;

/// Subdetector energy channels, in the order they appear in [`Cluster::subdetector_energies`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subdetector {
    Ecal = 0,
    Hcal = 1,
    Yoke = 2,
    Lcal = 3,
    Lhcal = 4,
    Bcal = 5,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McParticle {
    pub energy: f64,
    pub momentum: [f64; 3],
    pub charge: f32,
    pub pdg: i32,
    pub generator_status: i32,
    pub simulator_status: i32,
    /// Overrides the simulator status bit when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_in_simulation: Option<bool>,
}

impl McParticle {
    pub fn p4(&self) -> FourMomentum {
        FourMomentum::from_parts(self.energy, self.momentum)
    }

    pub fn is_created_in_simulation(&self) -> bool {
        //! `true` if the particle was produced by the detector simulation rather than the
        //! generator.
        self.created_in_simulation
            .unwrap_or(((self.simulator_status as u32) >> BIT_CREATED_IN_SIMULATION) & 1 == 1)
    }
}

/// A helix track. `cov_matrix` is the lower-triangular covariance of
/// `(d0, phi, omega, z0, tan_lambda)`, so entry 0 is the d0 variance and entry 9 the z0 variance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub d0: f32,
    pub phi: f32,
    pub omega: f32,
    pub z0: f32,
    pub tan_lambda: f32,
    pub cov_matrix: [f32; 15],
}

impl Track {
    pub const COV_D0_D0: usize = 0;
    pub const COV_Z0_Z0: usize = 9;

    pub fn d0_significance(&self) -> f32 {
        self.d0 / self.cov_matrix[Self::COV_D0_D0].sqrt()
    }

    pub fn z0_significance(&self) -> f32 {
        self.z0 / self.cov_matrix[Self::COV_Z0_Z0].sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalorimeterHit {
    pub energy: f32,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub energy: f32,
    pub position: [f32; 3],
    pub subdetector_energies: Vec<f32>,
    pub calorimeter_hits: Vec<CalorimeterHit>,
}

impl Cluster {
    pub fn subdetector_energy(&self, subdetector: Subdetector) -> f32 {
        //! Energy deposited in one subdetector channel; channels the cluster doesn't carry are
        //! zero.
        self.subdetector_energies
            .get(subdetector as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleId {
    pub pdg: i32,
    pub likelihood: f32,
    #[serde(rename = "type")]
    pub id_type: i32,
    pub algorithm_type: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructedParticle {
    #[serde(rename = "type")]
    pub particle_type: i32,
    pub energy: f64,
    pub momentum: [f64; 3],
    pub charge: f32,
    pub tracks: Vec<Track>,
    pub clusters: Vec<Cluster>,
    pub particle_ids: Vec<ParticleId>,
}

impl ReconstructedParticle {
    pub fn p4(&self) -> FourMomentum {
        FourMomentum::from_parts(self.energy, self.momentum)
    }
}

/// A weighted link from a reconstructed particle to an MC particle, both addressed by their
/// index in the event's collections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub from: usize,
    pub to: usize,
    #[serde(default = "unit_weight")]
    pub weight: f32,
}

fn unit_weight() -> f32 {
    1.0
}

impl Relation {
    pub fn new(from: usize, to: usize, weight: f32) -> Self {
        Self { from, to, weight }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionType {
    McParticle,
    ReconstructedParticle,
    Relation,
}

/// A named event collection. Elements of one collection all share a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Collection {
    #[serde(rename = "MCParticle")]
    McParticles(Vec<McParticle>),
    #[serde(rename = "ReconstructedParticle")]
    ReconstructedParticles(Vec<ReconstructedParticle>),
    #[serde(rename = "LCRelation")]
    Relations(Vec<Relation>),
}

impl Collection {
    pub fn collection_type(&self) -> CollectionType {
        match self {
            Self::McParticles(_) => CollectionType::McParticle,
            Self::ReconstructedParticles(_) => CollectionType::ReconstructedParticle,
            Self::Relations(_) => CollectionType::Relation,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::McParticles(v) => v.len(),
            Self::ReconstructedParticles(v) => v.len(),
            Self::Relations(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum EventError {
    #[error("Collection {name:?} holds {found:?} elements, expected {expected:?}")]
    WrongCollectionType {
        name: String,
        expected: CollectionType,
        found: CollectionType,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunHeader {
    pub run_number: i32,
    pub detector_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub run_number: i32,
    pub event_number: i32,
    pub collections: IndexMap<String, Collection>,
}

macro_rules! typed_collection {
    ($fn_name:ident, $variant:ident, $elem:ty, $ctype:ident) => {
        /// Fetch a collection by name. A missing collection is `Ok(None)`; a collection of
        /// another element type is an error.
        pub fn $fn_name(&self, name: &str) -> Result<Option<&[$elem]>, EventError> {
            match self.collections.get(name) {
                None => Ok(None),
                Some(Collection::$variant(v)) => Ok(Some(v.as_slice())),
                Some(other) => Err(EventError::WrongCollectionType {
                    name: name.to_string(),
                    expected: CollectionType::$ctype,
                    found: other.collection_type(),
                }),
            }
        }
    };
}

impl Event {
    pub fn new(run_number: i32, event_number: i32) -> Self {
        Self {
            run_number,
            event_number,
            collections: IndexMap::new(),
        }
    }

    pub fn with_collection(mut self, name: &str, collection: Collection) -> Self {
        //! Builder-style insertion, replacing any collection already stored under `name`.
        self.collections.insert(name.to_string(), collection);
        self
    }

    typed_collection!(mc_particles, McParticles, McParticle, McParticle);
    typed_collection!(
        reconstructed_particles,
        ReconstructedParticles,
        ReconstructedParticle,
        ReconstructedParticle
    );
    typed_collection!(relations, Relations, Relation, Relation);
}
