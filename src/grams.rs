//! Word-pair construction: the example-generation core.
//!
//! Walks parsed utterances with a sliding window of 2 and emits valid
//! bigram training examples, then deduplicates, filters out-of-vocabulary
//! pairs, and adds sequence boundary tokens.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::transcript::Utterance;
use crate::vocab::Vocabulary;

/// Scan adjacent utterance pairs and emit word-pair examples.
///
/// For each window `(first, second)` three independent rules apply, and
/// more than one may fire on the same window:
///
/// 1. `first` is target-speaker with exactly 2 tokens → emit `first`.
/// 2. `second` is target-speaker with exactly 2 tokens → emit `second`.
/// 3. both are target-speaker singletons and `first.onset < second.onset`
///    → emit the merged pair spanning `[first.onset, second.offset]`.
///
/// A 2-token utterance in the interior of the sequence appears in two
/// consecutive windows and is therefore emitted twice; duplicates are
/// removed downstream by [`remove_duplicates`].  Inputs of length 0 or 1
/// produce no output.
pub fn generate_word_pairs(utterances: &[Utterance]) -> Vec<Utterance> {
    let mut grams = Vec::new();
    for pair in utterances.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if first.target_speaker && first.tokens.len() == 2 {
            grams.push(first.clone());
        }
        if second.target_speaker && second.tokens.len() == 2 {
            grams.push(second.clone());
        }
        if first.target_speaker
            && second.target_speaker
            && first.tokens.len() == 1
            && second.tokens.len() == 1
            && first.onset < second.onset
        {
            let mut tokens = first.tokens.clone();
            tokens.extend_from_slice(&second.tokens);
            grams.push(Utterance {
                tokens,
                target_speaker: true,
                onset: first.onset,
                offset: second.offset,
            });
        }
    }
    grams
}

/// Remove exact duplicates.
///
/// The key decomposes the token sequence into first/second word slots
/// (a gram has 1 or 2 tokens, so the second slot may be absent) joined
/// with the speaker flag, onset, and offset.  The first occurrence wins
/// and survivor order is deterministic.
pub fn remove_duplicates(grams: Vec<Utterance>) -> Vec<Utterance> {
    let mut seen: HashSet<(Option<u32>, Option<u32>, bool, i64, i64)> = HashSet::new();
    grams
        .into_iter()
        .filter(|g| {
            seen.insert((
                g.tokens.first().copied(),
                g.tokens.get(1).copied(),
                g.target_speaker,
                g.onset,
                g.offset,
            ))
        })
        .collect()
}

/// Which split the examples feed, controlling the OOV policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTag {
    /// Training data: no `<unk>` anywhere in a pair.
    Train,
    /// Evaluation data: only fully-unknown pairs are removed.
    Eval,
}

/// Drop out-of-vocabulary grams according to the split policy.
///
/// Training must never teach the model to emit `<unk>`, so any pair
/// containing it is dropped.  Evaluation still scores partially-unknown
/// pairs, so only `[<unk>, <unk>]` is removed there.
pub fn remove_oovs(grams: Vec<Utterance>, vocab: &Vocabulary, tag: DataTag) -> Vec<Utterance> {
    let unk = vocab.unk_id();
    match tag {
        DataTag::Train => grams
            .into_iter()
            .filter(|g| !g.tokens.contains(&unk))
            .collect(),
        DataTag::Eval => grams
            .into_iter()
            .filter(|g| g.tokens[..] != [unk, unk])
            .collect(),
    }
}

/// Insert the start-token id at position 0 and append the stop-token id.
///
/// Mutates `labels` in place; on return the caller's vector is two tokens
/// longer.  Fails when either symbol is missing from the vocabulary.
pub fn add_boundary_tokens(
    labels: &mut Vec<u32>,
    vocab: &Vocabulary,
    start_token: &str,
    stop_token: &str,
) -> Result<()> {
    let start = vocab
        .id(start_token)
        .with_context(|| format!("start token {start_token:?} not in vocabulary"))?;
    let stop = vocab
        .id(stop_token)
        .with_context(|| format!("stop token {stop_token:?} not in vocabulary"))?;
    labels.insert(0, start);
    labels.push(stop);
    Ok(())
}
