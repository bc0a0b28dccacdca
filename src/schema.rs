//! Column layout of the `evtdata` table.
//!
//! Scalar columns hold one `i32` per event. Array columns hold one value per MC particle, PFO, or
//! calorimeter hit, and are bound to the scalar count column (`nmcps`, `npfos`, `nclrhits`) that
//! gives their length in each row.

use crate::row::{EventRow, HitRecord, McParticleRecord, PfoRecord};

pub const TABLE_NAME: &str = "evtdata";
pub const TABLE_TITLE: &str = "events";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafType {
    I32,
    F32,
    Bool,
}

/// The values of one column for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    I32(i32),
    F32s(Vec<f32>),
    I32s(Vec<i32>),
    Bools(Vec<bool>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::I32(_) => 1,
            Self::F32s(v) => v.len(),
            Self::I32s(v) => v.len(),
            Self::Bools(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads one field out of a per-particle record.
pub enum Field<T> {
    F32(fn(&T) -> f32),
    I32(fn(&T) -> i32),
    Bool(fn(&T) -> bool),
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> Field<T> {
    fn leaf_type(&self) -> LeafType {
        match self {
            Self::F32(_) => LeafType::F32,
            Self::I32(_) => LeafType::I32,
            Self::Bool(_) => LeafType::Bool,
        }
    }

    fn collect(&self, records: &[T]) -> ColumnValues {
        match *self {
            Self::F32(f) => ColumnValues::F32s(records.iter().map(f).collect()),
            Self::I32(f) => ColumnValues::I32s(records.iter().map(f).collect()),
            Self::Bool(f) => ColumnValues::Bools(records.iter().map(f).collect()),
        }
    }
}

#[derive(Clone, Copy)]
pub enum Leaf {
    Count(fn(&EventRow) -> i32),
    Mcp(Field<McParticleRecord>),
    Pfo(Field<PfoRecord>),
    Hit(Field<HitRecord>),
}

#[derive(Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub leaf: Leaf,
}

impl Column {
    /// Name of the column bounding this array column, `None` for scalars.
    pub fn count(&self) -> Option<&'static str> {
        match self.leaf {
            Leaf::Count(_) => None,
            Leaf::Mcp(_) => Some("nmcps"),
            Leaf::Pfo(_) => Some("npfos"),
            Leaf::Hit(_) => Some("nclrhits"),
        }
    }

    pub fn leaf_type(&self) -> LeafType {
        match &self.leaf {
            Leaf::Count(_) => LeafType::I32,
            Leaf::Mcp(f) => f.leaf_type(),
            Leaf::Pfo(f) => f.leaf_type(),
            Leaf::Hit(f) => f.leaf_type(),
        }
    }

    pub fn values(&self, row: &EventRow) -> ColumnValues {
        match &self.leaf {
            Leaf::Count(f) => ColumnValues::I32(f(row)),
            Leaf::Mcp(f) => f.collect(&row.mcps),
            Leaf::Pfo(f) => f.collect(&row.pfos),
            Leaf::Hit(f) => f.collect(&row.clr_hits),
        }
    }
}

fn count(name: &'static str, f: fn(&EventRow) -> i32) -> Column {
    Column {
        name,
        leaf: Leaf::Count(f),
    }
}

fn pfo_f(name: &'static str, f: fn(&PfoRecord) -> f32) -> Column {
    Column {
        name,
        leaf: Leaf::Pfo(Field::F32(f)),
    }
}

fn pfo_i(name: &'static str, f: fn(&PfoRecord) -> i32) -> Column {
    Column {
        name,
        leaf: Leaf::Pfo(Field::I32(f)),
    }
}

fn pfo_o(name: &'static str, f: fn(&PfoRecord) -> bool) -> Column {
    Column {
        name,
        leaf: Leaf::Pfo(Field::Bool(f)),
    }
}

fn mcp_f(name: &'static str, f: fn(&McParticleRecord) -> f32) -> Column {
    Column {
        name,
        leaf: Leaf::Mcp(Field::F32(f)),
    }
}

fn mcp_i(name: &'static str, f: fn(&McParticleRecord) -> i32) -> Column {
    Column {
        name,
        leaf: Leaf::Mcp(Field::I32(f)),
    }
}

fn mcp_o(name: &'static str, f: fn(&McParticleRecord) -> bool) -> Column {
    Column {
        name,
        leaf: Leaf::Mcp(Field::Bool(f)),
    }
}

fn hit_f(name: &'static str, f: fn(&HitRecord) -> f32) -> Column {
    Column {
        name,
        leaf: Leaf::Hit(Field::F32(f)),
    }
}

/// All columns of the `evtdata` table, in output order.
pub fn evtdata_columns() -> Vec<Column> {
    vec![
        count("evt", |r| r.evt),
        count("npfos", EventRow::npfos),
        pfo_f("pfo_e", |p| p.e),
        pfo_f("pfo_px", |p| p.px),
        pfo_f("pfo_py", |p| p.py),
        pfo_f("pfo_pz", |p| p.pz),
        pfo_f("pfo_phi", |p| p.phi),
        pfo_f("pfo_theta", |p| p.theta),
        pfo_f("pfo_chrg", |p| p.chrg),
        pfo_i("pfo_pdg", |p| p.pdg),
        pfo_i("pfo_ntrk", |p| p.ntrk),
        pfo_f("pfo_d0", |p| p.track.d0),
        pfo_f("pfo_d0sig", |p| p.track.d0sig),
        pfo_f("pfo_z0", |p| p.track.z0),
        pfo_f("pfo_z0sig", |p| p.track.z0sig),
        pfo_f("pfo_trkphi", |p| p.track.phi),
        pfo_f("pfo_omega", |p| p.track.omega),
        pfo_f("pfo_tanlambda", |p| p.track.tanlambda),
        pfo_i("pfo_nclus", |p| p.nclus),
        pfo_f("pfo_cal_x", |p| p.cal.x),
        pfo_f("pfo_cal_y", |p| p.cal.y),
        pfo_f("pfo_cal_z", |p| p.cal.z),
        pfo_f("pfo_ecal_e", |p| p.cal.ecal_e),
        pfo_f("pfo_hcal_e", |p| p.cal.hcal_e),
        pfo_f("pfo_yoke_e", |p| p.cal.yoke_e),
        pfo_f("pfo_lcal_e", |p| p.cal.lcal_e),
        pfo_f("pfo_lhcal_e", |p| p.cal.lhcal_e),
        pfo_f("pfo_bcal_e", |p| p.cal.bcal_e),
        pfo_f("pfo_gamma_e", |p| p.gamma_e),
        pfo_i("nmcr", |p| p.mcr.nmcr),
        pfo_f("mcr_weight", |p| p.mcr.weight),
        pfo_f("mcr_e", |p| p.mcr.mcp.e),
        pfo_f("mcr_px", |p| p.mcr.mcp.px),
        pfo_f("mcr_py", |p| p.mcr.mcp.py),
        pfo_f("mcr_pz", |p| p.mcr.mcp.pz),
        pfo_f("mcr_phi", |p| p.mcr.mcp.phi),
        pfo_f("mcr_theta", |p| p.mcr.mcp.theta),
        pfo_f("mcr_chrg", |p| p.mcr.mcp.chrg),
        pfo_i("mcr_pdg", |p| p.mcr.mcp.pdg),
        pfo_i("mcr_genstatus", |p| p.mcr.mcp.genstatus),
        pfo_i("mcr_simstatus", |p| p.mcr.mcp.simstatus),
        pfo_o("mcr_iscreatedinsim", |p| p.mcr.mcp.iscreatedinsim),
        count("nmcps", EventRow::nmcps),
        mcp_f("mcp_e", |p| p.e),
        mcp_f("mcp_px", |p| p.px),
        mcp_f("mcp_py", |p| p.py),
        mcp_f("mcp_pz", |p| p.pz),
        mcp_f("mcp_phi", |p| p.phi),
        mcp_f("mcp_theta", |p| p.theta),
        mcp_f("mcp_chrg", |p| p.chrg),
        mcp_i("mcp_pdg", |p| p.pdg),
        mcp_i("mcp_genstatus", |p| p.genstatus),
        mcp_i("mcp_simstatus", |p| p.simstatus),
        mcp_o("mcp_iscreatedinsim", |p| p.iscreatedinsim),
        count("nclrhits", EventRow::nclrhits),
        hit_f("clr_x", |h| h.x),
        hit_f("clr_y", |h| h.y),
        hit_f("clr_z", |h| h.z),
        pfo_i("pfo_pid", |p| p.pid),
    ]
}
