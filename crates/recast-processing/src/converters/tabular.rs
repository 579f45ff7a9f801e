//! JSON ⇄ CSV conversion

use super::{read_text, run_blocking, Converter, ConverterError, ConverterOptions};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

/// Written first so spreadsheet applications detect UTF-8.
const UTF8_BOM: &str = "\u{feff}";

/// Convert a JSON array of objects (or one object) into CSV.
///
/// The header is the sorted union of all object keys; a record without a key
/// gets an empty cell. Array entries that are not objects are skipped.
pub fn json_to_csv(json: &str) -> Result<String, ConverterError> {
    let data: Value = serde_json::from_str(json)?;
    let records = match data {
        Value::Object(obj) => vec![Value::Object(obj)],
        Value::Array(items) => items,
        _ => {
            return Err(ConverterError::InvalidInput(
                "JSON data must be an array of objects or a single object".to_string(),
            ))
        }
    };

    if records.is_empty() {
        return Ok(String::new());
    }

    let objects: Vec<&Map<String, Value>> = records.iter().filter_map(Value::as_object).collect();
    // Every entry skipped: the header is an empty record
    if objects.is_empty() {
        return Ok(format!("{}\r\n", UTF8_BOM));
    }

    let fieldnames: BTreeSet<&str> = objects
        .iter()
        .flat_map(|obj| obj.keys().map(String::as_str))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(UTF8_BOM.as_bytes().to_vec());

    writer.write_record(&fieldnames)?;
    for obj in objects {
        let row: Vec<String> = fieldnames
            .iter()
            .map(|field| cell_text(obj.get(*field)))
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ConverterError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ConverterError::InvalidInput(format!("CSV output is not UTF-8: {}", e)))
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Convert CSV with a header row into a pretty-printed JSON array of objects.
///
/// Every value is a string; cells missing from a short row become `null`.
pub fn csv_to_json(csv_text: &str) -> Result<String, ConverterError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut obj = Map::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = record
                .get(i)
                .map(|v| Value::String(v.to_string()))
                .unwrap_or(Value::Null);
            obj.insert(header.to_string(), value);
        }
        rows.push(Value::Object(obj));
    }

    Ok(serde_json::to_string_pretty(&Value::Array(rows))?)
}

pub struct JsonToCsvConverter;

#[async_trait]
impl Converter for JsonToCsvConverter {
    fn name(&self) -> &'static str {
        "json-to-csv"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _options: &ConverterOptions,
    ) -> Result<(), ConverterError> {
        let json = read_text(input).await?;
        let csv = run_blocking(move || json_to_csv(&json)).await?;
        tokio::fs::write(output, csv).await?;
        Ok(())
    }
}

pub struct CsvToJsonConverter;

#[async_trait]
impl Converter for CsvToJsonConverter {
    fn name(&self) -> &'static str {
        "csv-to-json"
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _options: &ConverterOptions,
    ) -> Result<(), ConverterError> {
        let csv = read_text(input).await?;
        let json = run_blocking(move || csv_to_json(&csv)).await?;
        tokio::fs::write(output, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_lines(csv: &str) -> Vec<&str> {
        csv.trim_start_matches(UTF8_BOM).lines().collect()
    }

    #[test]
    fn test_single_object_becomes_one_row() {
        let csv = json_to_csv(r#"{"b":2,"a":1}"#).unwrap();
        assert!(csv.starts_with(UTF8_BOM));
        assert_eq!(data_lines(&csv), vec!["a,b", "1,2"]);
    }

    #[test]
    fn test_header_is_union_of_keys_with_empty_defaults() {
        let csv = json_to_csv(r#"[{"a":1},{"b":"x","c":null}]"#).unwrap();
        assert_eq!(data_lines(&csv), vec!["a,b,c", "1,,", ",x,"]);
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let csv = json_to_csv(r#"[{"a":1}, 5, "text", {"a":2}]"#).unwrap();
        assert_eq!(data_lines(&csv), vec!["a", "1", "2"]);
    }

    #[test]
    fn test_nested_values_are_written_as_json() {
        let csv = json_to_csv(r#"[{"tags":["x","y"],"ok":true}]"#).unwrap();
        assert_eq!(data_lines(&csv), vec!["ok,tags", r#"true,"[""x"",""y""]""#]);
    }

    #[test]
    fn test_array_without_objects_yields_empty_header() {
        let csv = json_to_csv("[1, 2, \"x\"]").unwrap();
        assert_eq!(csv, "\u{feff}\r\n");
    }

    #[test]
    fn test_empty_array_produces_empty_output() {
        assert_eq!(json_to_csv("[]").unwrap(), "");
    }

    #[test]
    fn test_scalar_json_is_rejected() {
        let err = json_to_csv("42").unwrap_err();
        assert!(matches!(err, ConverterError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = json_to_csv("{not json").unwrap_err();
        assert!(matches!(err, ConverterError::Json(_)));
    }

    #[test]
    fn test_csv_to_json_values_are_strings() {
        let json = csv_to_json("a,b\n1,2").unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!([{"a": "1", "b": "2"}]));
    }

    #[test]
    fn test_csv_to_json_keeps_header_order_and_unicode() {
        let json = csv_to_json("名前,age\n太郎,30\n").unwrap();
        assert!(json.contains("太郎"));
        assert!(json.find("名前").unwrap() < json.find("age").unwrap());
    }

    #[test]
    fn test_csv_to_json_short_row_yields_null() {
        let json = csv_to_json("a,b\n1\n").unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!([{"a": "1", "b": null}]));
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let original = serde_json::json!([
            {"name": "alice", "city": "Paris", "visits": 3},
            {"name": "bob", "city": "Lyon"}
        ]);
        let csv = json_to_csv(&original.to_string()).unwrap();
        let back: Value =
            serde_json::from_str(&csv_to_json(csv.trim_start_matches(UTF8_BOM)).unwrap()).unwrap();

        assert_eq!(
            back,
            serde_json::json!([
                {"city": "Paris", "name": "alice", "visits": "3"},
                {"city": "Lyon", "name": "bob", "visits": ""}
            ])
        );
    }

    #[tokio::test]
    async fn test_converter_writes_output_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.json");
        // Leading BOM, as produced by the JSON→CSV direction
        std::fs::write(&input, "\u{feff}a,b\n1,2\n").unwrap();

        CsvToJsonConverter
            .convert(&input, &output, &ConverterOptions::default())
            .await
            .unwrap();

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed, serde_json::json!([{"a": "1", "b": "2"}]));
    }
}
