use serde::{Deserialize, Serialize};

use crate::event::McParticle;

/// Kinematic and truth fields of one MC particle, as written to the `mcp_*` and `mcr_*`
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct McParticleRecord {
    pub e: f32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub phi: f32,
    pub theta: f32,
    pub chrg: f32,
    pub pdg: i32,
    pub genstatus: i32,
    pub simstatus: i32,
    pub iscreatedinsim: bool,
}

impl From<&McParticle> for McParticleRecord {
    fn from(p: &McParticle) -> Self {
        let p4 = p.p4();
        Self {
            e: p4.e as f32,
            px: p4.px as f32,
            py: p4.py as f32,
            pz: p4.pz as f32,
            phi: p4.phi() as f32,
            theta: p4.tuple_theta() as f32,
            chrg: p.charge,
            pdg: p.pdg,
            genstatus: p.generator_status,
            simstatus: p.simulator_status,
            iscreatedinsim: p.is_created_in_simulation(),
        }
    }
}

/// First-track parameters of a PFO. All zero for PFOs without tracks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackRecord {
    pub d0: f32,
    pub d0sig: f32,
    pub z0: f32,
    pub z0sig: f32,
    pub phi: f32,
    pub omega: f32,
    pub tanlambda: f32,
}

/// Cluster information summed (energies) or averaged (position) over all clusters of a PFO.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClusterSums {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub ecal_e: f32,
    pub hcal_e: f32,
    pub yoke_e: f32,
    pub lcal_e: f32,
    pub lhcal_e: f32,
    pub bcal_e: f32,
}

/// The truth match of a PFO: number of related MC particles, and the weight and fields of the
/// best one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct McRelationRecord {
    pub nmcr: i32,
    pub weight: f32,
    pub mcp: McParticleRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PfoRecord {
    pub e: f32,
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub phi: f32,
    pub theta: f32,
    pub chrg: f32,
    /// Particle type code of the PFO.
    pub pdg: i32,
    /// PDG code of the first particle-ID hypothesis.
    pub pid: i32,
    pub ntrk: i32,
    pub track: TrackRecord,
    pub nclus: i32,
    pub cal: ClusterSums,
    pub gamma_e: f32,
    pub mcr: McRelationRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One row of the `evtdata` table.
///
/// Rows are built fresh for every event, so every field not set while flattening an event holds
/// its zero value. The per-array counts are the lengths of the vectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventRow {
    pub evt: i32,
    pub mcps: Vec<McParticleRecord>,
    pub pfos: Vec<PfoRecord>,
    pub clr_hits: Vec<HitRecord>,
}

impl EventRow {
    pub fn new(evt: i32) -> Self {
        Self {
            evt,
            ..Default::default()
        }
    }
    pub fn nmcps(&self) -> i32 {
        self.mcps.len() as i32
    }
    pub fn npfos(&self) -> i32 {
        self.pfos.len() as i32
    }
    pub fn nclrhits(&self) -> i32 {
        self.clr_hits.len() as i32
    }
}

/// Upper bounds on the per-event array lengths. Events exceeding any of them are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capacity {
    pub mcps: usize,
    pub pfos: usize,
    pub clrhits: usize,
}

impl Default for Capacity {
    fn default() -> Self {
        Self {
            mcps: 10_000,
            pfos: 10_000,
            clrhits: 100_000,
        }
    }
}
