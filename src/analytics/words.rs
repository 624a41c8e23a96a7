//! Word frequencies and the exclusivity ranking.
//!
//! For two participants with word counts `c1` and `c2`, the exclusivity
//! ratio of a word is `(c1 + 1) / (c2 + 1)`. Words said more by the first
//! participant rank in `top_words1` by that ratio; words said more by the
//! second rank in `top_words2` by its inverse. A word said equally often by
//! both appears in neither list.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::participants;
use crate::config::AnalysisConfig;
use crate::error::{ChatlensError, Result};
use crate::message::ChatMessage;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// One ranked word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordEntry {
    /// The word, lower-cased
    pub text: String,
    /// Exclusivity ratio, always >= 1 in a ranking
    pub value: f64,
    /// Occurrences by the participant owning the list
    pub count: usize,
}

/// Word ranking for the first two participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordComparison {
    /// First participant by appearance
    pub person1: String,
    /// Second participant by appearance
    pub person2: String,
    /// Words most exclusive to `person1`, highest ratio first
    pub top_words1: Vec<WordEntry>,
    /// Words most exclusive to `person2`, highest inverted ratio first
    pub top_words2: Vec<WordEntry>,
    /// Raw counts for `person1`
    #[serde(skip_serializing)]
    pub frequencies1: BTreeMap<String, usize>,
    /// Raw counts for `person2`
    #[serde(skip_serializing)]
    pub frequencies2: BTreeMap<String, usize>,
}

impl WordComparison {
    /// Exclusivity ratio of `word` (any case).
    pub fn ratio(&self, word: &str) -> f64 {
        let word = word.to_lowercase();
        let c1 = self.frequencies1.get(&word).copied().unwrap_or(0);
        let c2 = self.frequencies2.get(&word).copied().unwrap_or(0);
        exclusivity_ratio(c1, c2)
    }

    /// Most frequent words of each participant, by raw count.
    ///
    /// `value` holds the count. Ties are broken alphabetically.
    pub fn top_counts(&self, n: usize) -> (Vec<WordEntry>, Vec<WordEntry>) {
        (most_frequent(&self.frequencies1, n), most_frequent(&self.frequencies2, n))
    }
}

/// Splits text into lower-cased Unicode word tokens.
///
/// ```
/// use chatlens::analytics::tokenize;
///
/// assert_eq!(tokenize("Hi, Élodie! 2 cats", false), vec!["hi", "élodie", "2", "cats"]);
/// assert_eq!(tokenize("Hi, Élodie! 2 cats", true), vec!["hi", "élodie", "cats"]);
/// ```
pub fn tokenize(text: &str, exclude_numeric: bool) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| !exclude_numeric || !token.chars().any(char::is_numeric))
        .map(str::to_lowercase)
        .collect()
}

/// `(c1 + 1) / (c2 + 1)`.
pub fn exclusivity_ratio(c1: usize, c2: usize) -> f64 {
    (c1 + 1) as f64 / (c2 + 1) as f64
}

/// Ranks words by how exclusive they are to each of the first two speakers.
///
/// Messages of any third speaker are ignored. The result depends only on
/// the input: ties are broken alphabetically.
///
/// # Errors
///
/// [`ChatlensError::InsufficientParticipants`] if fewer than two distinct
/// speakers exist.
pub fn analyze_words(messages: &[ChatMessage], config: &AnalysisConfig) -> Result<WordComparison> {
    let users = participants(messages);
    let [person1, person2, ..] = users.as_slice() else {
        return Err(ChatlensError::InsufficientParticipants { found: users.len() });
    };

    let mut frequencies1: BTreeMap<String, usize> = BTreeMap::new();
    let mut frequencies2: BTreeMap<String, usize> = BTreeMap::new();

    for msg in messages {
        let table = if msg.user == *person1 {
            &mut frequencies1
        } else if msg.user == *person2 {
            &mut frequencies2
        } else {
            continue;
        };
        for token in tokenize(&msg.message, config.exclude_numeric_tokens) {
            *table.entry(token).or_insert(0) += 1;
        }
    }

    let mut words: Vec<&String> = frequencies1.keys().chain(frequencies2.keys()).collect();
    words.sort();
    words.dedup();

    let mut favours1: Vec<WordEntry> = Vec::new();
    let mut favours2: Vec<WordEntry> = Vec::new();

    for word in words {
        let c1 = frequencies1.get(word).copied().unwrap_or(0);
        let c2 = frequencies2.get(word).copied().unwrap_or(0);
        let ratio = exclusivity_ratio(c1, c2);
        if c1 > c2 {
            favours1.push(WordEntry {
                text: word.clone(),
                value: ratio,
                count: c1,
            });
        } else if c2 > c1 {
            favours2.push(WordEntry {
                text: word.clone(),
                value: 1.0 / ratio,
                count: c2,
            });
        }
    }

    // Words arrive alphabetically; a stable sort keeps that order among ties
    favours1.sort_by(|a, b| b.value.total_cmp(&a.value));
    favours2.sort_by(|a, b| b.value.total_cmp(&a.value));
    favours1.truncate(config.top_n);
    favours2.truncate(config.top_n);

    Ok(WordComparison {
        person1: (*person1).to_string(),
        person2: (*person2).to_string(),
        top_words1: favours1,
        top_words2: favours2,
        frequencies1,
        frequencies2,
    })
}

fn most_frequent(table: &BTreeMap<String, usize>, n: usize) -> Vec<WordEntry> {
    let mut entries: Vec<WordEntry> = table
        .iter()
        .map(|(text, &count)| WordEntry {
            text: text.clone(),
            value: count as f64,
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(n);
    entries
}
