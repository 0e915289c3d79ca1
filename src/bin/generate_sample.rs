//! Write the bundled solar dataset to `sample_data.parquet`, for exercising the
//! Parquet loader (`solar-board --dataset sample_data.parquet`).

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SOLAR_CSV: &str = include_str!("../../assets/solar.csv");

/// Pick the narrowest column type every cell parses as.
fn build_column(cells: &[&str]) -> (DataType, ArrayRef) {
    if let Ok(ints) = cells.iter().map(|c| c.parse::<i64>()).collect::<Result<Vec<_>, _>>() {
        return (DataType::Int64, Arc::new(Int64Array::from(ints)));
    }
    if let Ok(floats) = cells.iter().map(|c| c.parse::<f64>()).collect::<Result<Vec<_>, _>>() {
        return (DataType::Float64, Arc::new(Float64Array::from(floats)));
    }
    (DataType::Utf8, Arc::new(StringArray::from(cells.to_vec())))
}

fn main() -> Result<()> {
    let mut reader = csv::Reader::from_reader(SOLAR_CSV.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .context("reading CSV rows")?;

    let mut fields = Vec::with_capacity(headers.len());
    let mut arrays = Vec::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        let cells: Vec<&str> = rows.iter().map(|r| r.get(idx).unwrap_or("")).collect();
        let (data_type, array) = build_column(&cells);
        fields.push(Field::new(name, data_type, false));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let output_path = "sample_data.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {} records ({} columns) to {output_path}",
        batch.num_rows(),
        batch.num_columns()
    );
    Ok(())
}
