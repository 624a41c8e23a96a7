//! JSON Lines output writer.
//!
//! One message per line, suited to streaming consumers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::message::ChatMessage;

/// Writes messages to `path`, one JSON object per line.
pub fn write_jsonl(messages: &[ChatMessage], path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for msg in messages {
        serde_json::to_writer(&mut writer, msg)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Renders messages as JSON Lines.
pub fn to_jsonl(messages: &[ChatMessage]) -> Result<String> {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&serde_json::to_string(msg)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    #[test]
    fn test_jsonl_one_line_per_message() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
        let messages = vec![
            ChatMessage::new("Alice", "line one\nline two", ts),
            ChatMessage::new("Bob", "hi", ts),
        ];

        let file = NamedTempFile::new().unwrap();
        write_jsonl(&messages, file.path()).unwrap();
        let content = std::fs::read_to_string(file.path()).unwrap();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: ChatMessage = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.message, "line one\nline two");
        assert_eq!(to_jsonl(&messages).unwrap(), content);
    }

    #[test]
    fn test_jsonl_empty() {
        assert_eq!(to_jsonl(&[]).unwrap(), "");
    }
}
