//! CSV output writer.
//!
//! Tables use `;` as delimiter, so message text with commas stays readable.

use std::fs::File;
use std::path::Path;

use super::CsvTable;
use crate::analytics::{PeriodSeries, WordComparison};
use crate::error::{ChatlensError, Result};
use crate::message::ChatMessage;

/// Writes a table to `path`.
pub fn write_csv<T: CsvTable + ?Sized>(table: &T, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
    write_table(&mut writer, table)?;
    writer.flush()?;
    Ok(())
}

/// Renders a table as a string.
pub fn to_csv<T: CsvTable + ?Sized>(table: &T) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());
    write_table(&mut writer, table)?;
    let bytes = writer.into_inner().map_err(|e| ChatlensError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ChatlensError::Io(std::io::Error::other(e)))
}

fn write_table<W: std::io::Write, T: CsvTable + ?Sized>(writer: &mut csv::Writer<W>, table: &T) -> Result<()> {
    writer.write_record(table.header())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    Ok(())
}

/// Columns: `Timestamp`, `User`, `Message`, `Sentiment` (empty when unscored).
impl CsvTable for [ChatMessage] {
    fn header(&self) -> Vec<String> {
        ["Timestamp", "User", "Message", "Sentiment"]
            .map(String::from)
            .to_vec()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|msg| {
                vec![
                    msg.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                    msg.user.clone(),
                    msg.message.clone(),
                    msg.sentiment_score.map(|s| s.to_string()).unwrap_or_default(),
                ]
            })
            .collect()
    }
}

/// Columns: `Period`, then one per user. Users missing from a bucket get an
/// empty cell.
impl CsvTable for PeriodSeries {
    fn header(&self) -> Vec<String> {
        std::iter::once("Period".to_string())
            .chain(self.users.iter().cloned())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.buckets
            .iter()
            .map(|bucket| {
                std::iter::once(bucket.period_key.clone())
                    .chain(
                        self.users
                            .iter()
                            .map(|u| bucket.get(u).map(|v| v.to_string()).unwrap_or_default()),
                    )
                    .collect()
            })
            .collect()
    }
}

/// Columns: `Person`, `Word`, `Ratio`, `Count`; first speaker's ranking first.
impl CsvTable for WordComparison {
    fn header(&self) -> Vec<String> {
        ["Person", "Word", "Ratio", "Count"].map(String::from).to_vec()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let ranked = [(&self.person1, &self.top_words1), (&self.person2, &self.top_words2)];
        ranked
            .into_iter()
            .flat_map(|(person, entries)| {
                entries.iter().map(move |e| {
                    vec![
                        person.clone(),
                        e.text.clone(),
                        format!("{:.4}", e.value),
                        e.count.to_string(),
                    ]
                })
            })
            .collect()
    }
}
