use std::path::Path;

use oxyroot::{RootFile, WriterTree};
use tracing::debug;

use super::{root_error, Staged, TupleError, TupleWriter};
use crate::row::EventRow;
use crate::schema::{evtdata_columns, Column, ColumnValues, LeafType, TABLE_NAME};

/// Buffered branch contents. Boolean arrays are kept as one byte per entry, the size of a ROOT
/// `Bool_t`.
enum BranchBuffer {
    I32(Vec<i32>),
    F32s(Vec<Vec<f32>>),
    I32s(Vec<Vec<i32>>),
    Bytes(Vec<Vec<u8>>),
}

impl BranchBuffer {
    fn new(column: &Column) -> Self {
        match (column.count(), column.leaf_type()) {
            (None, _) => Self::I32(Vec::new()),
            (Some(_), LeafType::F32) => Self::F32s(Vec::new()),
            (Some(_), LeafType::I32) => Self::I32s(Vec::new()),
            (Some(_), LeafType::Bool) => Self::Bytes(Vec::new()),
        }
    }

    fn push(&mut self, column: &Column, values: ColumnValues) -> Result<(), TupleError> {
        match (self, values) {
            (Self::I32(buf), ColumnValues::I32(v)) => buf.push(v),
            (Self::F32s(buf), ColumnValues::F32s(v)) => buf.push(v),
            (Self::I32s(buf), ColumnValues::I32s(v)) => buf.push(v),
            (Self::Bytes(buf), ColumnValues::Bools(v)) => {
                buf.push(v.into_iter().map(u8::from).collect())
            }
            _ => {
                return Err(TupleError::ColumnMismatch {
                    column: column.name,
                })
            }
        }
        Ok(())
    }

    fn into_branch(self, tree: &mut WriterTree, name: &'static str) {
        match self {
            Self::I32(buf) => {
                tree.new_branch(name, buf.into_iter());
            }
            Self::F32s(buf) => {
                tree.new_branch(name, buf.into_iter());
            }
            Self::I32s(buf) => {
                tree.new_branch(name, buf.into_iter());
            }
            Self::Bytes(buf) => {
                tree.new_branch(name, buf.into_iter());
            }
        }
    }
}

/// Writes the `evtdata` table as a ROOT tree.
///
/// Counts are `int` branches. Arrays are `vector<float>` and `vector<int>` branches, with boolean
/// arrays stored as byte vectors, holding one vector per entry, so array lengths come from the vectors themselves
/// rather than from `nmcps`, `npfos` or `nclrhits`.
///
/// Every row is held in memory until [`close`](TupleWriter::close) writes the tree, so memory
/// grows with the number of events. Use Parquet output for large inputs.
pub struct RootTupleWriter {
    columns: Vec<Column>,
    buffers: Vec<BranchBuffer>,
    entries: usize,
    staged: Staged,
}

impl RootTupleWriter {
    /// # Errors
    ///
    /// Fails if no scratch file can be created next to `path`.
    pub fn create(path: &Path) -> Result<Self, TupleError> {
        let staged = Staged::new(path)?;
        let columns = evtdata_columns();
        let buffers = columns.iter().map(BranchBuffer::new).collect();
        Ok(Self {
            columns,
            buffers,
            entries: 0,
            staged,
        })
    }
}

impl TupleWriter for RootTupleWriter {
    fn fill(&mut self, row: &EventRow) -> Result<(), TupleError> {
        for (column, buffer) in self.columns.iter().zip(self.buffers.iter_mut()) {
            buffer.push(column, column.values(row))?;
        }
        self.entries += 1;
        Ok(())
    }

    fn entries(&self) -> usize {
        self.entries
    }

    fn close(self: Box<Self>) -> Result<usize, TupleError> {
        let Self {
            columns,
            buffers,
            entries,
            staged,
        } = *self;
        let path = staged.path();
        let mut file = RootFile::create(&path)
            .map_err(|err| root_error(&format!("Failed to create {}", path.display()), err))?;
        let mut tree = WriterTree::new(TABLE_NAME);
        for (column, buffer) in columns.iter().zip(buffers) {
            buffer.into_branch(&mut tree, column.name);
        }
        tree.write(&mut file)
            .map_err(|err| root_error(&format!("Failed to write tree {TABLE_NAME}"), err))?;
        file.close()
            .map_err(|err| root_error(&format!("Failed to close {}", path.display()), err))?;
        debug!("wrote {} entries to {}", entries, staged.target().display());
        staged.commit()?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{HitRecord, PfoRecord};
    use oxyroot::Named;

    #[test]
    fn writes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.root");
        let mut writer = Box::new(RootTupleWriter::create(&path).unwrap());
        for evt in 0..3 {
            let mut row = EventRow::new(evt);
            row.pfos.push(PfoRecord {
                e: 2.0,
                ..Default::default()
            });
            row.clr_hits.push(HitRecord {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            });
            writer.fill(&row).unwrap();
        }
        assert_eq!(writer.entries(), 3);
        assert_eq!(writer.close().unwrap(), 3);

        let mut file = RootFile::open(&path).unwrap();
        let tree = file.get_tree(TABLE_NAME).unwrap();
        let evt: Vec<i32> = tree
            .branches()
            .find(|b| b.name() == "evt")
            .unwrap()
            .as_iter::<i32>()
            .unwrap()
            .collect();
        assert_eq!(evt, vec![0, 1, 2]);
    }
}
