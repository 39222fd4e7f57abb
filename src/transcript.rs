//! Transcript parsing: one utterance per delimited line.
//!
//! Each line carries the spoken text followed by four trailing metadata
//! fields; of those the third-from-last is the onset, the second-from-last
//! the offset (both in samples), and the last the speaker label.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::vocab::Vocabulary;

/// Speaker whose utterances are eligible as training labels.
pub const TARGET_SPEAKER: &str = "Speaker1";

/// One parsed unit of transcript text with speaker and timing metadata.
///
/// Word pairs produced by [`generate_word_pairs`](crate::grams::generate_word_pairs)
/// share this shape: `tokens` then holds 1 or 2 ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utterance {
    /// Encoded text, one id per word.
    pub tokens: Vec<u32>,
    /// True when the last field equals [`TARGET_SPEAKER`].
    pub target_speaker: bool,
    /// First sample of the utterance.
    pub onset: i64,
    /// Last sample of the utterance.
    pub offset: i64,
}

impl Utterance {
    /// Utterance span in samples.
    pub fn duration(&self) -> i64 {
        self.offset - self.onset
    }
}

/// Parse a delimited transcript file into [`Utterance`]s.
///
/// Per line, split on `delim`: every field except the last four is text —
/// lower-cased, trimmed, double-quotes stripped, dropped when empty or in
/// `excluded` — and the survivors are joined with single spaces and encoded
/// with `vocab`.  Lines whose joined text is empty are dropped.  Lines with
/// fewer than 4 fields are malformed and fail the parse, naming the file
/// and 1-based line number.
pub fn read_transcript(
    path: &Path,
    delim: char,
    vocab: &Vocabulary,
    excluded: &HashSet<String>,
) -> Result<Vec<Utterance>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading transcript {}", path.display()))?;

    let mut utterances = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let lineno = idx + 1;
        let fields: Vec<&str> = line.split(delim).collect();
        if fields.len() < 4 {
            bail!(
                "{}:{lineno}: expected at least 4 fields, got {}",
                path.display(),
                fields.len()
            );
        }
        let n = fields.len();

        let words: Vec<String> = fields[..n - 4]
            .iter()
            .map(|f| f.to_lowercase().trim().replace('"', ""))
            .filter(|w| !w.is_empty() && !excluded.contains(w))
            .collect();
        if words.is_empty() {
            continue;
        }
        let text = words.join(" ");

        let onset = parse_sample(fields[n - 3])
            .with_context(|| format!("{}:{lineno}: bad onset", path.display()))?;
        let offset = parse_sample(fields[n - 2])
            .with_context(|| format!("{}:{lineno}: bad offset", path.display()))?;

        utterances.push(Utterance {
            tokens: vocab.encode(&text),
            target_speaker: fields[n - 1].trim() == TARGET_SPEAKER,
            onset,
            offset,
        });
    }
    Ok(utterances)
}

/// Sample indices appear as floats in transcripts; truncate toward zero.
fn parse_sample(field: &str) -> Result<i64> {
    let v: f64 = field
        .trim()
        .parse()
        .with_context(|| format!("not a number: {field:?}"))?;
    Ok(v as i64)
}
