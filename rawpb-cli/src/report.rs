//! Report generation
//!
//! Writes dumped fields as aligned text lines or JSON lines.

use crate::config::OutputFormat;
use crate::dump::{FieldRecord, FieldValue};
use anyhow::Result;
use std::io::Write;

/// Write all records in the requested format
pub fn write_records(records: &[FieldRecord], format: OutputFormat, out: &mut impl Write) -> Result<()> {
    for record in records {
        match format {
            OutputFormat::Text => write_text(record, out)?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut *out, record)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

fn write_text(record: &FieldRecord, out: &mut impl Write) -> Result<()> {
    match (&record.value, &record.text) {
        (FieldValue::Integer(v), _) => {
            writeln!(out, "{:<12} {:<16} {}", record.path, record.wire_type, v)?
        }
        (FieldValue::Bytes(_), Some(text)) => {
            writeln!(out, "{:<12} {:<16} {:?}", record.path, record.wire_type, text)?
        }
        (FieldValue::Bytes(hex), None) => {
            writeln!(out, "{:<12} {:<16} 0x{}", record.path, record.wire_type, hex)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawpb_decoder::WireType;

    fn sample() -> Vec<FieldRecord> {
        vec![
            FieldRecord {
                path: "1".to_string(),
                wire_type: WireType::Varint,
                value: FieldValue::Integer(150),
                text: None,
            },
            FieldRecord {
                path: "2.3".to_string(),
                wire_type: WireType::LengthDelimited,
                value: FieldValue::Bytes("ff".to_string()),
                text: None,
            },
        ]
    }

    #[test]
    fn test_text_report() {
        let mut out = Vec::new();
        write_records(&sample(), OutputFormat::Text, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], format!("{:<12} {:<16} 150", "1", "varint"));
        assert_eq!(lines[1], format!("{:<12} length-delimited 0xff", "2.3"));
    }

    #[test]
    fn test_json_lines_report() {
        let mut out = Vec::new();
        write_records(&sample(), OutputFormat::Json, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let parsed: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed[0]["value"], 150);
        assert_eq!(parsed[1]["path"], "2.3");
        assert_eq!(parsed[1]["value"], "ff");
        assert!(parsed[1].get("text").is_none());
    }
}
