//! Writing appraisal records as JSON or JSON Lines.

use crate::appraisal::AppraisalRecord;
use crate::config::OutputConfig;
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One JSON document per record
    Json,
    /// One compact record per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Serializes appraisal records to a sink.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    records_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only applies to `Json`; JSONL is always one line per record.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            records_written: 0,
        }
    }

    /// Writer using the `[output]` config section. Unknown formats fall back to JSON.
    pub fn from_config(writer: W, config: &OutputConfig) -> Self {
        let format = OutputFormat::parse(&config.format).unwrap_or(OutputFormat::Json);
        Self::new(writer, format, config.pretty)
    }

    pub fn write(&mut self, record: &AppraisalRecord) -> io::Result<()> {
        if self.format == OutputFormat::Json && self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, record).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.records_written += 1;
        Ok(())
    }

    /// Write a session's history. JSON gets a single array; JSONL a line each.
    pub fn write_history(&mut self, records: &[AppraisalRecord]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, records)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, records).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.records_written += records.len();
            }
            OutputFormat::JsonLines => {
                for record in records {
                    self.write(record)?;
                }
            }
        }
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appraisal::{AppraisalRequest, AppraisalResult, Condition};

    fn record(item: &str) -> AppraisalRecord {
        let request = AppraisalRequest::new(item)
            .with_spec("Size", "Large")
            .with_condition(Condition::Used);
        let result = AppraisalResult {
            verified: false,
            note: "No photo".to_string(),
            title: format!("{item} for sale"),
            description: "- Clean".to_string(),
            low_price: "$20".to_string(),
            high_price: "$35".to_string(),
        };
        AppraisalRecord::new(&request, result, "groq", "llama")
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write(&record("Rug")).unwrap();
        assert_eq!(writer.records_written(), 1);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"item\":\"Rug\""));
        assert!(output.contains("\"condition\":\"used\""));
        assert!(output.contains("\"provider\":\"groq\""));
    }

    #[test]
    fn test_pretty_json_spans_lines() {
        let mut buffer = Vec::new();
        OutputWriter::new(&mut buffer, OutputFormat::Json, true)
            .write(&record("Rug"))
            .unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.lines().count() > 3);
    }

    #[test]
    fn test_jsonl_ignores_pretty() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, true);
        writer
            .write_history(&[record("Rug"), record("Lamp")])
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["item"], "Lamp");
    }

    #[test]
    fn test_history_as_json_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer
            .write_history(&[record("Rug"), record("Lamp")])
            .unwrap();
        assert_eq!(writer.records_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let parsed: Vec<AppraisalRecord> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_from_config() {
        let config = OutputConfig {
            format: "ndjson".to_string(),
            pretty: true,
        };
        let mut buffer = Vec::new();
        OutputWriter::from_config(&mut buffer, &config)
            .write(&record("Rug"))
            .unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("csv"), None);
    }
}
