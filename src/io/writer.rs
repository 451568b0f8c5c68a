use std::io::Write;

use duckdb::arrow::record_batch::RecordBatch;
use duckdb::arrow::util::display::{ArrayFormatter, FormatOptions};

use crate::core::header::PairsHeader;

/// Streams a header and query results as tab-separated pairs text.
///
/// Rows are formatted batch by batch straight into the output; nulls are
/// written as empty fields.
pub struct PairsWriter<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> PairsWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, rows: 0 }
    }

    /// Write header lines with trailing whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the output cannot be written.
    pub fn write_header(&mut self, header: &PairsHeader) -> std::io::Result<()> {
        for line in &header.lines {
            self.out.write_all(line.trim_end().as_bytes())?;
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Write every row of a batch.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a column cannot be formatted or the output
    /// cannot be written.
    pub fn write_batch(&mut self, batch: &RecordBatch) -> std::io::Result<()> {
        let options = FormatOptions::default();
        let formatters = batch
            .columns()
            .iter()
            .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
            .collect::<Result<Vec<_>, _>>()
            .map_err(std::io::Error::other)?;

        for row in 0..batch.num_rows() {
            for (i, formatter) in formatters.iter().enumerate() {
                if i > 0 {
                    self.out.write_all(b"\t")?;
                }
                write!(self.out, "{}", formatter.value(row))?;
            }
            self.out.write_all(b"\n")?;
        }

        self.rows += batch.num_rows() as u64;
        Ok(())
    }

    /// Write all batches, returning the total number of rows written.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn write_batches<I>(&mut self, batches: I) -> std::io::Result<u64>
    where
        I: IntoIterator<Item = RecordBatch>,
    {
        for batch in batches {
            self.write_batch(&batch)?;
        }
        Ok(self.rows)
    }

    #[must_use]
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duckdb::arrow::array::{ArrayRef, Int32Array, StringArray};
    use duckdb::arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch(ids: Vec<Option<&str>>, positions: Vec<Option<i32>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("readID", DataType::Utf8, true),
            Field::new("pos1", DataType::Int32, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(Int32Array::from(positions)),
        ];
        RecordBatch::try_new(schema, columns).unwrap()
    }

    #[test]
    fn test_write_header_trims_trailing_whitespace() {
        let mut writer = PairsWriter::new(Vec::new());
        let header = PairsHeader::new(vec![
            "## pairs format v1.0.0  ".to_string(),
            "#columns: readID pos1\t".to_string(),
        ]);
        writer.write_header(&header).unwrap();

        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "## pairs format v1.0.0\n#columns: readID pos1\n"
        );
    }

    #[test]
    fn test_write_batches() {
        let mut writer = PairsWriter::new(Vec::new());
        let rows = writer
            .write_batches(vec![
                batch(vec![Some("r1"), Some("r2")], vec![Some(10), Some(20)]),
                batch(vec![Some("r3")], vec![None]),
            ])
            .unwrap();

        assert_eq!(rows, 3);
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "r1\t10\nr2\t20\nr3\t\n"
        );
    }

    #[test]
    fn test_empty_batch() {
        let mut writer = PairsWriter::new(Vec::new());
        writer.write_batch(&batch(vec![], vec![])).unwrap();
        assert_eq!(writer.rows_written(), 0);
        assert!(writer.into_inner().is_empty());
    }
}
