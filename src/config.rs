use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flatten::CollectionNames;
use crate::row::Capacity;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read steering file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
}

/// Steering parameters of the event flattener.
///
/// Parameter names in a steering file follow the host framework's convention:
///
/// ```toml
/// InputMCParticleCollection = "MCParticle"
/// InputPFOCollection = "PandoraPFOs"
/// InputMCTruthLinkCollection = "RecoMCTruthLink"
/// OutputRootFileName = "output.root"
/// batch_size = 1024
///
/// [capacity]
/// mcps = 10000
/// pfos = 10000
/// clrhits = 100000
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlattenerConfig {
    #[serde(rename = "InputMCParticleCollection")]
    pub mc_particle_collection: String,
    #[serde(rename = "InputPFOCollection")]
    pub pfo_collection: String,
    #[serde(rename = "InputMCTruthLinkCollection")]
    pub mc_truth_link_collection: String,
    #[serde(rename = "OutputRootFileName")]
    pub output_file: PathBuf,
    /// Rows per Parquet record batch.
    pub batch_size: usize,
    pub capacity: Capacity,
}

impl Default for FlattenerConfig {
    fn default() -> Self {
        let names = CollectionNames::default();
        Self {
            mc_particle_collection: names.mc_particles,
            pfo_collection: names.pfos,
            mc_truth_link_collection: names.mc_truth_links,
            output_file: PathBuf::from("output.root"),
            batch_size: 1024,
            capacity: Capacity::default(),
        }
    }
}

impl FlattenerConfig {
    /// Parse a steering file's contents.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, unknown keys, or values of the wrong type.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a steering file.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or doesn't parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn collection_names(&self) -> CollectionNames {
        CollectionNames {
            mc_particles: self.mc_particle_collection.clone(),
            pfos: self.pfo_collection.clone(),
            mc_truth_links: self.mc_truth_link_collection.clone(),
        }
    }

    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        //! Parameter names and values, in the order they are logged at initialisation.
        vec![
            ("InputMCParticleCollection", self.mc_particle_collection.clone()),
            ("InputPFOCollection", self.pfo_collection.clone()),
            ("InputMCTruthLinkCollection", self.mc_truth_link_collection.clone()),
            ("OutputRootFileName", self.output_file.display().to_string()),
            ("batch_size", self.batch_size.to_string()),
            ("capacity.mcps", self.capacity.mcps.to_string()),
            ("capacity.pfos", self.capacity.pfos.to_string()),
            ("capacity.clrhits", self.capacity.clrhits.to_string()),
        ]
    }
}
