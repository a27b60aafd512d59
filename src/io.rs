//! Source record loading and entity sinks
//!
//! Records are read from a JSON array or from JSON lines. Each record is an
//! object with a `text` string, or a `fields` object whose string values are
//! concatenated in document order. `contact`/`origin` (aliases `email`/`url`)
//! and `id` are optional. A malformed record fails the whole load.

use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::{Entity, SourceRecord};

/// Parse records from JSON-array or JSON-lines text.
pub fn parse_records(input: &str) -> Result<Vec<SourceRecord>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)
            .map_err(|e| Error::invalid_input(format!("record array: {e}")))?;
        return values
            .iter()
            .enumerate()
            .map(|(index, value)| record_from_value(index, value))
            .collect();
    }

    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let value: Value = serde_json::from_str(line)
                .map_err(|e| Error::invalid_input(format!("record {index}: {e}")))?;
            record_from_value(index, &value)
        })
        .collect()
}

/// Read and parse a record file.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<SourceRecord>> {
    let records = parse_records(&std::fs::read_to_string(path.as_ref())?)?;
    tracing::debug!(path = %path.as_ref().display(), records = records.len(), "records loaded");
    Ok(records)
}

fn record_from_value(index: usize, value: &Value) -> Result<SourceRecord> {
    let Value::Object(obj) = value else {
        return Err(Error::invalid_input(format!("record {index}: expected a JSON object")));
    };

    let text = match (obj.get("text"), obj.get("fields")) {
        (Some(Value::String(text)), _) => text.clone(),
        (Some(_), _) => {
            return Err(Error::invalid_input(format!("record {index}: text must be a string")))
        }
        (None, Some(Value::Object(fields))) => concat_fields(index, fields)?,
        (None, Some(_)) => {
            return Err(Error::invalid_input(format!("record {index}: fields must be an object")))
        }
        (None, None) => {
            return Err(Error::invalid_input(format!("record {index}: missing text")))
        }
    };

    let mut record = SourceRecord::new(
        text,
        optional_string(index, obj, &["contact", "email"])?,
        optional_string(index, obj, &["origin", "url"])?,
    );
    match obj.get("id") {
        None | Some(Value::Null) => {}
        Some(Value::String(id)) => record = record.with_id(id.clone()),
        Some(Value::Number(id)) => record = record.with_id(id.to_string()),
        Some(_) => {
            return Err(Error::invalid_input(format!(
                "record {index}: id must be a string or number"
            )))
        }
    }
    Ok(record)
}

/// String values joined without a separator, in document order.
fn concat_fields(index: usize, fields: &Map<String, Value>) -> Result<String> {
    fields
        .iter()
        .map(|(key, value)| {
            value.as_str().ok_or_else(|| {
                Error::invalid_input(format!("record {index}: field {key:?} must be a string"))
            })
        })
        .collect()
}

/// First present key among `keys`; missing or null is empty.
fn optional_string(index: usize, obj: &Map<String, Value>, keys: &[&str]) -> Result<String> {
    match keys.iter().find_map(|k| obj.get(*k)) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Error::invalid_input(format!(
            "record {index}: {} must be a string",
            keys[0]
        ))),
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for extracted entities.
pub trait EntitySink {
    /// Persist a batch, returning the number of rows written.
    fn write_batch(&mut self, entities: &[Entity]) -> Result<usize>;
}

impl EntitySink for Vec<Entity> {
    fn write_batch(&mut self, entities: &[Entity]) -> Result<usize> {
        self.extend_from_slice(entities);
        Ok(entities.len())
    }
}

/// One JSON object per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Rows written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EntitySink for JsonLinesSink<W> {
    fn write_batch(&mut self, entities: &[Entity]) -> Result<usize> {
        for entity in entities {
            serde_json::to_writer(&mut self.writer, entity)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        self.written += entities.len();
        Ok(entities.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let records = parse_records(
            r#"[
                { "text": "Professor Jane Smith", "contact": "j@x.edu", "origin": "https://x.edu" },
                { "text": "Dean Ann Lee", "id": 7 }
            ]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].contact, "j@x.edu");
        assert_eq!(records[0].origin, "https://x.edu");
        assert_eq!(records[1].id.as_deref(), Some("7"));
        assert!(records[1].contact.is_empty());
    }

    #[test]
    fn test_parse_json_lines() {
        let input = "{\"text\": \"a\"}\n\n{\"text\": \"b\", \"id\": \"r2\"}\n";
        let records = parse_records(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "b");
        assert_eq!(records[1].id.as_deref(), Some("r2"));
    }

    #[test]
    fn test_fields_concatenated_in_order() {
        let records = parse_records(
            r#"[{ "email": "e@x.edu", "url": "https://x.edu/p", "fields": { "b": "Professor ", "a": "Jane Smith" } }]"#,
        )
        .unwrap();
        assert_eq!(records[0].text, "Professor Jane Smith");
        assert_eq!(records[0].contact, "e@x.edu");
        assert_eq!(records[0].origin, "https://x.edu/p");
    }

    #[test]
    fn test_missing_text_names_record() {
        let err = parse_records(r#"[{ "text": "ok" }, { "contact": "x" }]"#).unwrap_err();
        match err {
            Error::InvalidInput(msg) => assert!(msg.contains("record 1"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_string_text_rejected() {
        assert!(matches!(
            parse_records(r#"[{ "text": 42 }]"#),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_records(r#"[{ "fields": { "a": 1 } }]"#),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_records(r#"[{ "text": "x", "contact": ["a"] }]"#),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_malformed_json_line() {
        let err = parse_records("{\"text\": \"a\"}\n{not json}\n").unwrap_err();
        assert!(err.to_string().contains("record 1"));
        assert!(parse_records("[1, 2").is_err());
        assert!(parse_records("[\"text\"]").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_load_records_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{\"text\": \"Dean Ann Lee\"}\n").unwrap();
        assert_eq!(load_records(file.path()).unwrap().len(), 1);
        assert!(matches!(load_records("/nonexistent/records.json"), Err(Error::Io(_))));
    }

    fn entity(first: &str) -> Entity {
        Entity {
            first_name: first.into(),
            last_name: "Lee".into(),
            job_title: "Dean".into(),
            contact: "c".into(),
            origin: "o".into(),
        }
    }

    #[test]
    fn test_json_lines_sink() {
        let mut sink = JsonLinesSink::new(Vec::new());
        assert_eq!(sink.write_batch(&[entity("Ann"), entity("Bo")]).unwrap(), 2);
        assert_eq!(sink.write_batch(&[]).unwrap(), 0);
        assert_eq!(sink.written(), 2);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Entity = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, entity("Ann"));
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<Entity> = Vec::new();
        assert_eq!(sink.write_batch(&[entity("Ann")]).unwrap(), 1);
        assert_eq!(sink.len(), 1);
    }
}
