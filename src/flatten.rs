//! Per-event extraction of MC particles, PFOs and calorimeter hits into an [`EventRow`].

use itertools::Itertools;
use thiserror::Error;
use tracing::warn;

use crate::event::{
    Event, EventError, McParticle, ReconstructedParticle, Subdetector, N_SUBDETECTORS,
};
use crate::navigator::RelationNavigator;
use crate::row::{
    Capacity, ClusterSums, EventRow, HitRecord, McParticleRecord, McRelationRecord, PfoRecord,
    TrackRecord,
};

/// Minimum summed ECAL energy (exclusive) for a neutral PFO with no HCAL energy to be counted as a
/// photon candidate.
pub const GAMMA_ECAL_THRESHOLD: f32 = 8.0;

#[derive(Error, Debug, PartialEq)]
pub enum FlattenError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error("Event holds {count} entries for {array:?}, above the capacity of {capacity}")]
    CapacityExceeded {
        array: &'static str,
        count: usize,
        capacity: usize,
    },
    #[error("PFO {pfo} is linked to MC particle {mcp}, but {collection:?} holds {available} particles")]
    DanglingRelation {
        pfo: usize,
        mcp: usize,
        collection: String,
        available: usize,
    },
}

/// Names of the collections read from each event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub mc_particles: String,
    pub pfos: String,
    pub mc_truth_links: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            mc_particles: "MCParticle".to_string(),
            pfos: "PandoraPFOs".to_string(),
            mc_truth_links: "RecoMCTruthLink".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flattener {
    names: CollectionNames,
    capacity: Capacity,
}

impl Flattener {
    pub fn new(names: CollectionNames, capacity: Capacity) -> Self {
        Self { names, capacity }
    }

    /// Build the row for one event. `evt` is the row's sequence number in the output table.
    ///
    /// Missing collections leave their part of the row empty. Truth links without an MC
    /// collection still count towards `nmcr` and `weight`, but the matched particle's fields stay
    /// zero. An event whose particle or hit counts exceed the configured [`Capacity`] is rejected
    /// as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`FlattenError::Event`] if a configured name holds a collection of the wrong type,
    /// [`FlattenError::CapacityExceeded`] for oversized events, and
    /// [`FlattenError::DanglingRelation`] if a PFO links to an index past the end of the MC
    /// collection.
    pub fn flatten(&self, event: &Event, evt: i32) -> Result<EventRow, FlattenError> {
        let mc_collection = event.mc_particles(&self.names.mc_particles)?;
        let mcps = mc_collection.unwrap_or(&[]);
        let pfos = event
            .reconstructed_particles(&self.names.pfos)?
            .unwrap_or(&[]);
        let navigator = event
            .relations(&self.names.mc_truth_links)?
            .map(RelationNavigator::new);

        let nhits: usize = pfos
            .iter()
            .flat_map(|p| &p.clusters)
            .map(|c| c.calorimeter_hits.len())
            .sum();
        check_capacity("mcps", mcps.len(), self.capacity.mcps)?;
        check_capacity("pfos", pfos.len(), self.capacity.pfos)?;
        check_capacity("clrhits", nhits, self.capacity.clrhits)?;

        if mc_collection.is_none() && navigator.is_some() && !pfos.is_empty() {
            warn!(
                "event {} has {:?} links but no {:?} collection, matched MC fields are left empty",
                event.event_number, self.names.mc_truth_links, self.names.mc_particles
            );
        }

        let mut row = EventRow::new(evt);
        row.mcps = mcps.iter().map(McParticleRecord::from).collect();
        row.pfos.reserve(pfos.len());
        row.clr_hits.reserve(nhits);
        for (i, pfo) in pfos.iter().enumerate() {
            let mut rec = pfo_record(pfo, &mut row.clr_hits);
            if let Some(nav) = &navigator {
                rec.mcr = self.mc_relation(nav, i, mc_collection)?;
            }
            row.pfos.push(rec);
        }
        Ok(row)
    }

    fn mc_relation(
        &self,
        nav: &RelationNavigator,
        pfo: usize,
        mcps: Option<&[McParticle]>,
    ) -> Result<McRelationRecord, FlattenError> {
        let related = nav.related_to(pfo);
        let Some(best) = related.first() else {
            return Ok(McRelationRecord::default());
        };
        let mut rec = McRelationRecord {
            nmcr: related.len() as i32,
            weight: best.weight,
            ..Default::default()
        };
        let Some(mcps) = mcps else {
            return Ok(rec);
        };
        // all related particles count towards nmcr, so all must resolve
        if let Some(dangling) = related.iter().find(|r| r.index >= mcps.len()) {
            return Err(FlattenError::DanglingRelation {
                pfo,
                mcp: dangling.index,
                collection: self.names.mc_particles.clone(),
                available: mcps.len(),
            });
        }
        if let Some(mcp) = mcps.get(best.index) {
            rec.mcp = McParticleRecord::from(mcp);
        }
        Ok(rec)
    }
}

fn check_capacity(array: &'static str, count: usize, capacity: usize) -> Result<(), FlattenError> {
    if count > capacity {
        return Err(FlattenError::CapacityExceeded {
            array,
            count,
            capacity,
        });
    }
    Ok(())
}

/// Everything but the truth match. Calorimeter hits of the PFO's clusters are appended to `hits`.
fn pfo_record(pfo: &ReconstructedParticle, hits: &mut Vec<HitRecord>) -> PfoRecord {
    let p4 = pfo.p4();
    let mut rec = PfoRecord {
        e: p4.e as f32,
        px: p4.px as f32,
        py: p4.py as f32,
        pz: p4.pz as f32,
        phi: p4.phi() as f32,
        theta: p4.tuple_theta() as f32,
        chrg: pfo.charge,
        pdg: pfo.particle_type,
        ntrk: pfo.tracks.len() as i32,
        nclus: pfo.clusters.len() as i32,
        ..Default::default()
    };

    if let Some(trk) = pfo.tracks.first() {
        rec.track = TrackRecord {
            d0: trk.d0,
            d0sig: trk.d0_significance(),
            z0: trk.z0,
            z0sig: trk.z0_significance(),
            phi: trk.phi,
            omega: trk.omega,
            tanlambda: trk.tan_lambda,
        };
    }

    if !pfo.clusters.is_empty() {
        rec.cal = cluster_sums(pfo, hits);
    }

    if rec.chrg == 0.0 && rec.cal.ecal_e > GAMMA_ECAL_THRESHOLD && rec.cal.hcal_e == 0.0 {
        rec.gamma_e = rec.e;
    }

    if let Some(pid) = pfo.particle_ids.first() {
        rec.pid = pid.pdg;
    }
    rec
}

fn cluster_sums(pfo: &ReconstructedParticle, hits: &mut Vec<HitRecord>) -> ClusterSums {
    let mut sums = ClusterSums::default();
    let (mut xsum, mut ysum, mut zsum) = (0.0f32, 0.0f32, 0.0f32);
    for cluster in &pfo.clusters {
        if cluster.subdetector_energies.len() < N_SUBDETECTORS {
            warn!(
                "cluster carries {} of {} subdetector energies ({}), missing channels count as zero",
                cluster.subdetector_energies.len(),
                N_SUBDETECTORS,
                cluster.subdetector_energies.iter().join(", ")
            );
        }
        xsum += cluster.position[0];
        ysum += cluster.position[1];
        zsum += cluster.position[2];
        sums.ecal_e += cluster.subdetector_energy(Subdetector::Ecal);
        sums.hcal_e += cluster.subdetector_energy(Subdetector::Hcal);
        sums.yoke_e += cluster.subdetector_energy(Subdetector::Yoke);
        sums.lcal_e += cluster.subdetector_energy(Subdetector::Lcal);
        sums.lhcal_e += cluster.subdetector_energy(Subdetector::Lhcal);
        sums.bcal_e += cluster.subdetector_energy(Subdetector::Bcal);
        hits.extend(cluster.calorimeter_hits.iter().map(|h| HitRecord {
            x: h.position[0],
            y: h.position[1],
            z: h.position[2],
        }));
    }
    let n = pfo.clusters.len() as f32;
    sums.x = xsum / n;
    sums.y = ysum / n;
    sums.z = zsum / n;
    sums
}
