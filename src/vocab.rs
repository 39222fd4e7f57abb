//! Word-level vocabulary: bidirectional token ↔ id mapping.
//!
//! A [`Vocabulary`] is built or loaded once per run and read-only afterwards,
//! so it can be shared freely across threads.  Ids are dense (`0..len`),
//! which lets the collator one-hot encode labels by direct indexing.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Symbol for out-of-vocabulary words.
pub const UNK_TOKEN: &str = "<unk>";
/// Symbol used to right-pad label sequences.
pub const PAD_TOKEN: &str = "<pad>";
/// Default sequence-start symbol.
pub const START_TOKEN: &str = "<s>";
/// Default sequence-stop symbol.
pub const STOP_TOKEN: &str = "</s>";

/// Bidirectional token ↔ id map with dense ids.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    ids: HashMap<String, u32>,
    tokens: Vec<String>,
    unk: u32,
    pad: u32,
}

/// On-disk form: a flat JSON object mapping tokens to ids.
#[derive(Debug, Deserialize)]
struct VocabFile {
    #[serde(flatten)]
    map: HashMap<String, u32>,
}

impl Vocabulary {
    /// Load a vocabulary from a JSON file.
    ///
    /// The file is a flat object mapping tokens to ids:
    /// ```json
    /// { "<pad>": 0, "<unk>": 1, "<s>": 2, "</s>": 3, "we": 4, ... }
    /// ```
    ///
    /// Ids must cover `0..len` with no gaps or duplicates, and the map must
    /// contain [`UNK_TOKEN`] and [`PAD_TOKEN`].
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening vocabulary {}", path.display()))?;
        let parsed: VocabFile = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing vocabulary {}", path.display()))?;
        Self::from_map(parsed.map)
            .with_context(|| format!("invalid vocabulary {}", path.display()))
    }

    /// Build a vocabulary from an explicit token → id map.
    ///
    /// Fails unless ids are dense (`0..len`, no duplicates) and the special
    /// symbols `<unk>` and `<pad>` are present.
    pub fn from_map(ids: HashMap<String, u32>) -> Result<Self> {
        let n = ids.len() as u32;
        let mut tokens = vec![String::new(); ids.len()];
        let mut seen = vec![false; ids.len()];
        for (tok, &id) in &ids {
            if id >= n {
                bail!("ids must be dense 0..{n}: token {tok:?} has id {id}");
            }
            if seen[id as usize] {
                bail!("duplicate id {id} (token {tok:?})");
            }
            seen[id as usize] = true;
            tokens[id as usize] = tok.clone();
        }
        let unk = *ids
            .get(UNK_TOKEN)
            .with_context(|| format!("missing {UNK_TOKEN:?} symbol"))?;
        let pad = *ids
            .get(PAD_TOKEN)
            .with_context(|| format!("missing {PAD_TOKEN:?} symbol"))?;
        Ok(Self { ids, tokens, unk, pad })
    }

    /// Build a vocabulary from an iterator of words.
    ///
    /// The special symbols `<pad>`, `<unk>`, `<s>`, `</s>` take ids 0–3;
    /// each distinct word is appended in iteration order.
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut ids = HashMap::new();
        let mut tokens = Vec::new();
        for tok in [PAD_TOKEN, UNK_TOKEN, START_TOKEN, STOP_TOKEN]
            .into_iter()
            .chain(words)
        {
            if !ids.contains_key(tok) {
                ids.insert(tok.to_string(), tokens.len() as u32);
                tokens.push(tok.to_string());
            }
        }
        let unk = ids[UNK_TOKEN];
        let pad = ids[PAD_TOKEN];
        Self { ids, tokens, unk, pad }
    }

    /// Encode whitespace-separated text into token ids.
    ///
    /// Words not in the vocabulary map to the `<unk>` id.  No boundary
    /// tokens are added here.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        text.split_whitespace()
            .map(|w| self.ids.get(w).copied().unwrap_or(self.unk))
            .collect()
    }

    /// Id of `token`, if present.
    pub fn id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    /// Token with the given id, if in range.
    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Id of the `<unk>` symbol.
    pub fn unk_id(&self) -> u32 {
        self.unk
    }

    /// Id of the `<pad>` symbol.
    pub fn pad_id(&self) -> u32 {
        self.pad
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// True when the vocabulary holds no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
