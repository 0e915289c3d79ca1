use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Record};

/// The solar dataset, shipped with the binary so the dashboard has data to
/// show without a file.
const BUNDLED_SOLAR_CSV: &str = include_str!("../../assets/solar.csv");

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one record per line
/// * `.json`    – `[{ "State": "...", "Generation (GWh)": 1.0, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path, grouping_field: &str) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file, grouping_field)
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text, grouping_field)
        }
        "parquet" | "pq" => load_parquet(path, grouping_field),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Load the bundled solar dataset.
pub fn load_bundled(grouping_field: &str) -> Result<Dataset> {
    read_csv(BUNDLED_SOLAR_CSV.as_bytes(), grouping_field).context("parsing bundled dataset")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other row is a record.
/// Cell types are guessed per cell.
pub fn read_csv<R: Read>(input: R, grouping_field: &str) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;

        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), guess_cell_type(value)))
            .collect();

        records.push(Record { fields });
    }

    Ok(Dataset::new(headers, records, grouping_field)?)
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "State": "California", "Number of Solar Plants": 289 },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance across records.
pub fn parse_json(text: &str, grouping_field: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }

        let fields = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_cell(val)))
            .collect();
        records.push(Record { fields });
    }

    Ok(Dataset::new(columns, records, grouping_field)?)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, grouping_field: &str) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let arrays = batch
            .columns()
            .iter()
            .zip(&columns)
            .map(|(col, name)| {
                normalize_column(col).with_context(|| format!("column '{name}'"))
            })
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let fields = columns
                .iter()
                .zip(&arrays)
                .map(|(name, col)| (name.clone(), extract_cell(col, row)))
                .collect();
            records.push(Record { fields });
        }
    }

    Ok(Dataset::new(columns, records, grouping_field)?)
}

/// Columns without a direct `CellValue` mapping (dictionary/categorical
/// strings, string views, dates, timestamps, decimals) are cast to Utf8.
fn normalize_column(col: &Arc<dyn Array>) -> Result<Arc<dyn Array>> {
    match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int32
        | DataType::Int64
        | DataType::Float32
        | DataType::Float64
        | DataType::Boolean => Ok(Arc::clone(col)),
        other => cast(col, &DataType::Utf8)
            .with_context(|| format!("unsupported column type {other:?}")),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map_or(CellValue::Null, |a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        // normalize_column has already cast everything else to Utf8
        _ => CellValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{default_selection, filter};

    #[test]
    fn bundled_dataset_loads_with_state_grouping() {
        let ds = load_bundled("State").unwrap();
        assert_eq!(ds.len(), 8);
        assert_eq!(ds.columns()[0], "State");
        assert_eq!(default_selection(&ds), Some(CellValue::from("California")));

        let view = filter(&ds, &"Texas".into());
        let record = view.records(&ds).next().unwrap();
        assert_eq!(record.get("Number of Solar Plants"), &CellValue::Integer(12));
        assert_eq!(record.get("Average MW Per Plant"), &CellValue::Float(15.6));
    }

    #[test]
    fn csv_cells_are_typed() {
        let text = "State,Plants,Active,Note\nCA,3,true,\nTX,1.5,false,windy\n";
        let ds = read_csv(text.as_bytes(), "State").unwrap();
        let first = &ds.records()[0];
        assert_eq!(first.get("Plants"), &CellValue::Integer(3));
        assert_eq!(first.get("Active"), &CellValue::Bool(true));
        assert_eq!(first.get("Note"), &CellValue::Null);
        assert_eq!(ds.records()[1].get("Plants"), &CellValue::Float(1.5));
        assert_eq!(ds.records()[1].get("Note"), &CellValue::from("windy"));
    }

    #[test]
    fn csv_without_grouping_column_fails() {
        let err = read_csv("Region,V\nWest,1\n".as_bytes(), "State").unwrap_err();
        assert!(format!("{err:#}").contains("State"));
    }

    #[test]
    fn json_records_keep_column_order() {
        let text = r#"[{"State": "CA", "V": 1}, {"State": "TX", "V": 2.5, "Extra": null}]"#;
        let ds = parse_json(text, "State").unwrap();
        assert_eq!(ds.columns(), &["State", "V", "Extra"]);
        assert_eq!(ds.records()[1].get("V"), &CellValue::Float(2.5));
        assert_eq!(ds.records()[0].get("Extra"), &CellValue::Null);
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json(r#"{"State": "CA"}"#, "State").is_err());
        assert!(parse_json(r#"[1, 2]"#, "State").is_err());
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_file(Path::new("data.xlsx"), "State").unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    /// Unique path in the system temp dir for one test's scratch file.
    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("solar-board-{}-{name}", std::process::id()))
    }

    #[test]
    fn json_columns_follow_source_key_order() {
        let text = r#"[{"State": "CA", "Number of Solar Plants": 289, "Generation (GWh)": 10826}]"#;
        let ds = parse_json(text, "State").unwrap();
        assert_eq!(
            ds.columns(),
            &["State", "Number of Solar Plants", "Generation (GWh)"]
        );
    }

    #[test]
    fn load_file_reads_csv_from_disk() {
        let path = scratch_path("solar.csv");
        std::fs::write(&path, "State,V\nCA,1\nTX,2\nCA,3\n").unwrap();
        let ds = load_file(&path, "State").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 3);
        assert_eq!(filter(&ds, &"CA".into()).indices, vec![0, 2]);
    }

    #[test]
    fn parquet_scalar_columns_and_nulls_load() {
        use arrow::array::ArrayRef;
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("State", DataType::Utf8, true),
            Field::new("Plants", DataType::Int64, true),
            Field::new("Capacity", DataType::Float64, true),
            Field::new("Active", DataType::Boolean, true),
        ]));
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(vec![Some("CA"), Some("TX"), None])),
            Arc::new(Int64Array::from(vec![Some(289), None, Some(11)])),
            Arc::new(Float64Array::from(vec![Some(15.3), Some(15.6), None])),
            Arc::new(BooleanArray::from(vec![None, Some(true), Some(false)])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

        let path = scratch_path("scalars.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, "State").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.columns(), &["State", "Plants", "Capacity", "Active"]);
        let recs = ds.records();
        assert_eq!(recs[0].get("Plants"), &CellValue::Integer(289));
        assert_eq!(recs[0].get("Capacity"), &CellValue::Float(15.3));
        assert_eq!(recs[0].get("Active"), &CellValue::Null);
        assert_eq!(recs[1].get("Plants"), &CellValue::Null);
        assert_eq!(recs[1].get("Active"), &CellValue::Bool(true));
        assert_eq!(recs[2].get("State"), &CellValue::Null);
        assert_eq!(recs[2].get("Capacity"), &CellValue::Null);
        assert_eq!(filter(&ds, &"TX".into()).indices, vec![1]);
    }

    #[test]
    fn parquet_dictionary_strings_group_by_value() {
        use arrow::array::{ArrayRef, DictionaryArray};
        use arrow::datatypes::{Field, Int32Type, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let states: DictionaryArray<Int32Type> = vec!["CA", "TX", "CA"].into_iter().collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("State", states.data_type().clone(), false),
            Field::new("V", DataType::Int64, false),
        ]));
        let arrays: Vec<ArrayRef> = vec![Arc::new(states), Arc::new(Int64Array::from(vec![1, 2, 3]))];
        let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

        let path = scratch_path("dictionary.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path, "State").unwrap();
        std::fs::remove_file(&path).ok();

        let expected: Vec<CellValue> = vec!["CA".into(), "TX".into()];
        assert_eq!(ds.distinct_groups(), expected.as_slice());
        assert_eq!(filter(&ds, &"CA".into()).indices, vec![0, 2]);
    }
}
