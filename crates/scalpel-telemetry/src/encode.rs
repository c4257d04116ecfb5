//! Record encoders for the file (JSON lines) and console (tab-separated text) sinks.
//!
//! # Design
//! - Both encoders read the same [`Record`], so level names and ordering cannot drift
//!   between sinks; only the rendering differs.
//! - Each encoder produces one complete, newline-terminated line into a buffer that the
//!   sink writes with a single call.

use std::io::Write;

use chrono::{Local, SecondsFormat};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::level::LogLevel;
use crate::record::Record;

const SGR_RESET: &str = "\u{1b}[0m";

/// Output format of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// One JSON object per line.
    Json,
    /// `ts\t[LEVEL]\tcaller\tmessage[\tfields]`, optionally with a coloured tag.
    Console {
        /// Wrap the level tag in ANSI colour codes.
        color: bool,
    },
}

impl Encoding {
    /// Append the encoded record, newline included, to `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record fields cannot be serialised.
    pub fn encode(self, record: &Record, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        match self {
            Self::Json => encode_json(record, buf),
            Self::Console { color } => encode_console(record, color, buf),
        }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    level: LogLevel,
    ts: String,
    caller: String,
    msg: &'a str,
    #[serde(flatten)]
    fields: &'a Map<String, Value>,
}

fn encode_json(record: &Record, buf: &mut Vec<u8>) -> serde_json::Result<()> {
    let line = JsonLine {
        level: record.level,
        ts: record.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        caller: record.caller.trimmed(),
        msg: &record.message,
        fields: &record.fields,
    };
    serde_json::to_writer(&mut *buf, &line)?;
    buf.push(b'\n');
    Ok(())
}

fn encode_console(record: &Record, color: bool, buf: &mut Vec<u8>) -> serde_json::Result<()> {
    let ts = record
        .timestamp
        .with_timezone(&Local)
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let tag = level_tag(record.level, color);
    // Writing into a Vec cannot fail.
    let _ = write!(
        buf,
        "{ts}\t{tag}\t{}\t{}",
        record.caller.trimmed(),
        record.message
    );
    if !record.fields.is_empty() {
        buf.push(b'\t');
        serde_json::to_writer(&mut *buf, &record.fields)?;
    }
    buf.push(b'\n');
    Ok(())
}

/// Render `[LEVEL]`, wrapped in the level's colour when `color` is set.
#[must_use]
pub fn level_tag(level: LogLevel, color: bool) -> String {
    if color {
        format!(
            "\u{1b}[{}m[{}]{SGR_RESET}",
            level.color().sgr(),
            level.capital_str()
        )
    } else {
        format!("[{}]", level.capital_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Caller;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Debug, Deserialize)]
    struct Decoded {
        level: String,
        ts: String,
        caller: String,
        msg: String,
        #[serde(flatten)]
        fields: Map<String, Value>,
    }

    fn record(level: LogLevel, fields: &[(&str, Value)]) -> Record {
        Record::new(
            level,
            Caller {
                file: "crates/app/src/service.rs".to_string(),
                line: 7,
            },
            "request served",
            fields,
        )
    }

    #[test]
    fn json_line_round_trips_every_field() -> anyhow::Result<()> {
        let original = record(LogLevel::Warn, &[("status", json!(503)), ("path", json!("/x"))]);
        let mut buf = Vec::new();
        Encoding::Json.encode(&original, &mut buf)?;
        assert_eq!(buf.last(), Some(&b'\n'));
        assert_eq!(buf.iter().filter(|byte| **byte == b'\n').count(), 1);

        let decoded: Decoded = serde_json::from_slice(&buf)?;
        assert_eq!(decoded.level.parse::<LogLevel>()?, original.level);
        let ts: DateTime<Utc> = DateTime::parse_from_rfc3339(&decoded.ts)?.with_timezone(&Utc);
        assert_eq!(ts, original.timestamp);
        assert_eq!(decoded.caller, "src/service.rs:7");
        assert_eq!(decoded.msg, original.message);
        assert_eq!(decoded.fields, original.fields);
        Ok(())
    }

    #[test]
    fn console_line_is_tab_separated() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        Encoding::Console { color: false }.encode(&record(LogLevel::Info, &[]), &mut buf)?;
        let line = String::from_utf8(buf)?;
        let parts: Vec<&str> = line.trim_end().split('\t').collect();
        assert_eq!(parts.len(), 4);
        assert!(DateTime::parse_from_rfc3339(parts[0]).is_ok());
        assert_eq!(parts[1], "[INFO]");
        assert_eq!(parts[2], "src/service.rs:7");
        assert_eq!(parts[3], "request served");
        Ok(())
    }

    #[test]
    fn console_line_appends_fields_as_json() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        Encoding::Console { color: false }
            .encode(&record(LogLevel::Error, &[("attempt", json!(2))]), &mut buf)?;
        let line = String::from_utf8(buf)?;
        assert!(line.ends_with("\t{\"attempt\":2}\n"));
        Ok(())
    }

    #[test]
    fn colored_tags_are_distinct_except_fatal_class() {
        let tags: Vec<String> = LogLevel::ALL
            .iter()
            .map(|level| level_tag(*level, true))
            .collect();
        for (level, tag) in LogLevel::ALL.iter().zip(&tags) {
            assert!(tag.contains(&format!("[{}]", level.capital_str())));
            assert!(tag.starts_with('\u{1b}'));
            assert!(tag.ends_with(SGR_RESET));
        }
        let colors: HashSet<&str> = tags
            .iter()
            .filter_map(|tag| tag.split('m').next())
            .collect();
        assert_eq!(colors.len(), 5);

        let fatal_prefix = |level: LogLevel| {
            level_tag(level, true)
                .split('[')
                .nth(1)
                .map(ToString::to_string)
        };
        assert_eq!(fatal_prefix(LogLevel::DPanic), fatal_prefix(LogLevel::Fatal));
        assert_eq!(fatal_prefix(LogLevel::Panic), fatal_prefix(LogLevel::Fatal));
        assert_ne!(fatal_prefix(LogLevel::Error), fatal_prefix(LogLevel::Fatal));
    }

    #[test]
    fn uncolored_tags_are_plain() {
        assert_eq!(level_tag(LogLevel::DPanic, false), "[DPANIC]");
    }
}
