use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float32Builder, Int32Builder, ListBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use tracing::debug;

use super::{Staged, TupleError, TupleWriter};
use crate::row::EventRow;
use crate::schema::{evtdata_columns, Column, ColumnValues, LeafType, TABLE_NAME, TABLE_TITLE};

fn item_field(data_type: DataType) -> DataType {
    DataType::List(Arc::new(Field::new("item", data_type, true)))
}

fn arrow_field(column: &Column) -> Field {
    let data_type = match (column.count(), column.leaf_type()) {
        (None, _) => DataType::Int32,
        (Some(_), LeafType::F32) => item_field(DataType::Float32),
        (Some(_), LeafType::I32) => item_field(DataType::Int32),
        (Some(_), LeafType::Bool) => item_field(DataType::Boolean),
    };
    Field::new(column.name, data_type, false)
}

/// Arrow schema of the `evtdata` table: `Int32` scalars, `List` arrays.
pub fn evtdata_arrow_schema() -> SchemaRef {
    Arc::new(Schema::new(
        evtdata_columns().iter().map(arrow_field).collect::<Vec<_>>(),
    ))
}

enum ColumnBuilder {
    Scalar(Int32Builder),
    F32s(ListBuilder<Float32Builder>),
    I32s(ListBuilder<Int32Builder>),
    Bools(ListBuilder<BooleanBuilder>),
}

impl ColumnBuilder {
    fn new(column: &Column) -> Self {
        match (column.count(), column.leaf_type()) {
            (None, _) => Self::Scalar(Int32Builder::new()),
            (Some(_), LeafType::F32) => Self::F32s(ListBuilder::new(Float32Builder::new())),
            (Some(_), LeafType::I32) => Self::I32s(ListBuilder::new(Int32Builder::new())),
            (Some(_), LeafType::Bool) => Self::Bools(ListBuilder::new(BooleanBuilder::new())),
        }
    }

    fn append(&mut self, column: &Column, values: ColumnValues) -> Result<(), TupleError> {
        match (self, values) {
            (Self::Scalar(b), ColumnValues::I32(v)) => b.append_value(v),
            (Self::F32s(b), ColumnValues::F32s(v)) => {
                b.values().append_slice(&v);
                b.append(true);
            }
            (Self::I32s(b), ColumnValues::I32s(v)) => {
                b.values().append_slice(&v);
                b.append(true);
            }
            (Self::Bools(b), ColumnValues::Bools(v)) => {
                b.values().append_slice(&v);
                b.append(true);
            }
            _ => {
                return Err(TupleError::ColumnMismatch {
                    column: column.name,
                })
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            Self::Scalar(b) => Arc::new(b.finish()),
            Self::F32s(b) => Arc::new(b.finish()),
            Self::I32s(b) => Arc::new(b.finish()),
            Self::Bools(b) => Arc::new(b.finish()),
        }
    }
}

/// Writes the `evtdata` table to a Parquet file, one record batch per `batch_size` rows.
pub struct ParquetTupleWriter {
    columns: Vec<Column>,
    builders: Vec<ColumnBuilder>,
    schema: SchemaRef,
    writer: ArrowWriter<File>,
    batch_size: usize,
    pending: usize,
    entries: usize,
    staged: Staged,
}

impl ParquetTupleWriter {
    /// # Errors
    ///
    /// Fails if the file can't be created.
    pub fn create(path: &Path, batch_size: usize) -> Result<Self, TupleError> {
        let columns = evtdata_columns();
        let builders = columns.iter().map(ColumnBuilder::new).collect();
        let schema = evtdata_arrow_schema();
        let props = WriterProperties::builder()
            .set_key_value_metadata(Some(vec![
                KeyValue::new("table".to_string(), TABLE_NAME.to_string()),
                KeyValue::new("title".to_string(), TABLE_TITLE.to_string()),
            ]))
            .build();
        let staged = Staged::new(path)?;
        let file = File::create(staged.path())?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        Ok(Self {
            staged,
            columns,
            builders,
            schema,
            writer,
            batch_size: batch_size.max(1),
            pending: 0,
            entries: 0,
        })
    }

    fn flush_batch(&mut self) -> Result<(), TupleError> {
        if self.pending == 0 {
            return Ok(());
        }
        let arrays: Vec<ArrayRef> = self.builders.iter_mut().map(ColumnBuilder::finish).collect();
        let batch = RecordBatch::try_new(self.schema.clone(), arrays)?;
        self.writer.write(&batch)?;
        debug!("wrote a batch of {} rows to {}", self.pending, TABLE_NAME);
        self.pending = 0;
        Ok(())
    }
}

impl TupleWriter for ParquetTupleWriter {
    fn fill(&mut self, row: &EventRow) -> Result<(), TupleError> {
        for (column, builder) in self.columns.iter().zip(self.builders.iter_mut()) {
            builder.append(column, column.values(row))?;
        }
        self.pending += 1;
        self.entries += 1;
        if self.pending >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn entries(&self) -> usize {
        self.entries
    }

    fn close(mut self: Box<Self>) -> Result<usize, TupleError> {
        self.flush_batch()?;
        let this = *self;
        this.writer.close()?;
        debug!("wrote {} entries to {}", this.entries, this.staged.target().display());
        this.staged.commit()?;
        Ok(this.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{McParticleRecord, PfoRecord};
    use arrow::array::{Array, Float32Array, Int32Array, ListArray};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    #[test]
    fn schema_types() {
        let schema = evtdata_arrow_schema();
        assert_eq!(schema.field_with_name("evt").unwrap().data_type(), &DataType::Int32);
        assert_eq!(
            schema.field_with_name("pfo_e").unwrap().data_type(),
            &item_field(DataType::Float32)
        );
        assert_eq!(
            schema.field_with_name("mcp_iscreatedinsim").unwrap().data_type(),
            &item_field(DataType::Boolean)
        );
    }

    #[test]
    fn rows_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evtdata.parquet");
        let mut writer = Box::new(ParquetTupleWriter::create(&path, 2).unwrap());
        for evt in 0..5 {
            let mut row = EventRow::new(evt);
            row.pfos = vec![PfoRecord::default(); evt as usize];
            row.mcps = vec![McParticleRecord {
                e: evt as f32 + 0.5,
                ..Default::default()
            }];
            writer.fill(&row).unwrap();
        }
        assert_eq!(writer.entries(), 5);
        assert_eq!(writer.close().unwrap(), 5);

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        let mut evts = Vec::new();
        let mut npfos = Vec::new();
        let mut mcp_e = Vec::new();
        for batch in &batches {
            let evt = batch
                .column_by_name("evt")
                .unwrap()
                .as_any()
                .downcast_ref::<Int32Array>()
                .unwrap();
            evts.extend(evt.values().iter().copied());
            let pfo_e = batch
                .column_by_name("pfo_e")
                .unwrap()
                .as_any()
                .downcast_ref::<ListArray>()
                .unwrap();
            npfos.extend((0..pfo_e.len()).map(|i| pfo_e.value_length(i)));
            let mcp = batch
                .column_by_name("mcp_e")
                .unwrap()
                .as_any()
                .downcast_ref::<ListArray>()
                .unwrap();
            for i in 0..mcp.len() {
                let values = mcp.value(i);
                let values = values.as_any().downcast_ref::<Float32Array>().unwrap();
                mcp_e.push(values.value(0));
            }
        }
        assert_eq!(evts, vec![0, 1, 2, 3, 4]);
        assert_eq!(npfos, vec![0, 1, 2, 3, 4]);
        assert_eq!(mcp_e, vec![0.5, 1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let writer = Box::new(ParquetTupleWriter::create(&path, 16).unwrap());
        assert_eq!(writer.close().unwrap(), 0);
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap()).unwrap();
        assert_eq!(builder.metadata().file_metadata().num_rows(), 0);
        assert_eq!(builder.schema().fields().len(), evtdata_columns().len());
    }
}
