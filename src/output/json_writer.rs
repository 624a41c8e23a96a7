//! JSON output writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// Writes any serializable result to `path` as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Renders any serializable result as pretty JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{Measure, PeriodUnit, aggregate_by_period};
    use crate::message::ChatMessage;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn messages() -> Vec<ChatMessage> {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap();
        vec![
            ChatMessage::new("Alice", "Hello", ts),
            ChatMessage::new("Bob", "Hi there", ts).with_sentiment_score(3.0),
        ]
    }

    #[test]
    fn test_to_json_messages() {
        let json = to_json(&messages()).unwrap();
        assert!(json.contains(r#""user": "Alice""#));
        assert!(json.contains(r#""timestamp": "2024-06-15T12:30:00Z""#));
        assert!(json.contains(r#""sentimentScore": 3.0"#));
        // Unscored message omits the field
        assert_eq!(json.matches("sentimentScore").count(), 1);
    }

    #[test]
    fn test_write_json_series() {
        let series = aggregate_by_period(&messages(), PeriodUnit::Month, Measure::MessageCount);
        let file = NamedTempFile::new().unwrap();
        write_json(&series, file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["buckets"][0]["periodKey"], "2024-06");
        assert_eq!(value["buckets"][0]["Bob"], 1.0);
    }
}
