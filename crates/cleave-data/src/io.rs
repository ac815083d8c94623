use std::fs::File;
use std::io::{BufReader, Seek};
use std::path::Path;
use std::sync::Arc;

use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use log::debug;

use crate::error::DataResult;
use crate::frame::DataFrame;

const SCHEMA_INFERENCE_RECORDS: usize = 1000;

/// Reads a CSV file with a header row, inferring column types from the leading records.
///
/// Every batch read becomes one partition.
pub fn read_csv(path: impl AsRef<Path>, batch_size: usize) -> DataResult<DataFrame> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let format = Format::default().with_header(true);
    let (schema, _) =
        format.infer_schema(BufReader::new(&file), Some(SCHEMA_INFERENCE_RECORDS))?;
    file.rewind()?;
    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(batch_size.max(1))
        .build(BufReader::new(file))?;
    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    debug!("Read {} batches from {}", batches.len(), path.display());
    DataFrame::try_new(schema, batches)
}

/// Writes all rows to a CSV file with a header row.
///
/// The header is written even when the dataframe has no rows.
pub fn write_csv(path: impl AsRef<Path>, df: &DataFrame) -> DataResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(&df.coalesce()?)?;
    Ok(())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use arrow::array::AsArray;
    use arrow::datatypes::{DataType, Int64Type};

    use super::*;

    #[test]
    fn test_csv_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "id,name\n1,a\n2,b\n3,c\n").unwrap();

        let df = read_csv(&input, 2).unwrap();
        assert_eq!(df.num_partitions(), 2);
        assert_eq!(df.num_rows(), 3);
        assert_eq!(df.schema().field(0).data_type(), &DataType::Int64);
        let ids = df.column("id").unwrap();
        assert_eq!(ids.as_primitive::<Int64Type>().values(), &[1, 2, 3]);

        let output = dir.path().join("output.csv");
        write_csv(&output, &df).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "id,name\n1,a\n2,b\n3,c\n"
        );
    }

    #[test]
    fn test_write_empty_frame_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "id,name\n1,a\n").unwrap();
        let df = read_csv(&input, 16).unwrap();

        let output = dir.path().join("empty.csv");
        write_csv(&output, &DataFrame::empty(df.schema())).unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "id,name\n");
    }
}
