//! Brainwave-to-English dataset.
//!
//! Holds paired (signal segment, label sequence) examples in a
//! deterministic length-sorted order, drops out-of-bounds examples, and
//! tracks label-token frequencies for downstream loss weighting.

use anyhow::{bail, Result};
use ndarray::Array2;
use std::collections::HashMap;
use tracing::info;

/// Longest admissible signal segment, in time steps.
pub const MAX_SEG_LEN: usize = 384;
/// Shortest admissible label sequence, boundary tokens included.
pub const MIN_LABEL_LEN: usize = 4;
/// Longest admissible label sequence, boundary tokens included.
pub const MAX_LABEL_LEN: usize = 128;

/// One retained training example.
#[derive(Debug, Clone)]
pub struct DatasetExample {
    /// Signal segment, `[time, electrodes]`.
    pub signal: Array2<f32>,
    /// Label token ids, boundary markers included.
    pub labels: Vec<u32>,
}

/// Paired signal/label examples, sorted ascending by
/// `(segment length, label length, original index)`.
///
/// The sort keeps length-bucketed batching cheap for callers: adjacent
/// examples pad to similar lengths.
pub struct Brain2enDataset {
    examples: Vec<DatasetExample>,
    /// Longest retained signal segment.
    pub max_seq_len: usize,
    /// Longest retained label sequence.
    pub max_sent_len: usize,
    /// Occurrences of each label token across retained examples.
    pub train_freq: HashMap<u32, usize>,
    /// Examples dropped by the length bounds.
    pub skipped: usize,
}

impl Brain2enDataset {
    /// Build a dataset from parallel signal/label sequences.
    ///
    /// Examples with segments longer than [`MAX_SEG_LEN`] or label
    /// sequences outside `[MIN_LABEL_LEN, MAX_LABEL_LEN]` are skipped and
    /// counted, not errors.  Mismatched input lengths are an error.
    pub fn new(signals: Vec<Array2<f32>>, labels: Vec<Vec<u32>>) -> Result<Self> {
        if signals.len() != labels.len() {
            bail!(
                "{} signals but {} label sequences",
                signals.len(),
                labels.len()
            );
        }

        let mut indices: Vec<(usize, usize, usize)> = signals
            .iter()
            .zip(&labels)
            .enumerate()
            .map(|(i, (s, l))| (i, s.nrows(), l.len()))
            .collect();
        indices.sort_by_key(|&(i, seg, lab)| (seg, lab, i));

        let mut signal_slots: Vec<Option<Array2<f32>>> = signals.into_iter().map(Some).collect();
        let mut label_slots: Vec<Option<Vec<u32>>> = labels.into_iter().map(Some).collect();

        let mut examples = Vec::new();
        let mut max_seq_len = 0;
        let mut max_sent_len = 0;
        let mut train_freq: HashMap<u32, usize> = HashMap::new();
        let mut skipped = 0;

        for (i, seg_len, lab_len) in indices {
            if seg_len > MAX_SEG_LEN || lab_len < MIN_LABEL_LEN || lab_len > MAX_LABEL_LEN {
                skipped += 1;
                continue;
            }
            // indices are unique, so each slot is taken exactly once
            let signal = signal_slots[i].take().unwrap();
            let labs = label_slots[i].take().unwrap();
            for &tok in &labs {
                *train_freq.entry(tok).or_insert(0) += 1;
            }
            max_seq_len = max_seq_len.max(seg_len);
            max_sent_len = max_sent_len.max(labs.len());
            examples.push(DatasetExample {
                signal,
                labels: labs,
            });
        }
        info!(skipped, retained = examples.len(), "dataset built");

        Ok(Self {
            examples,
            max_seq_len,
            max_sent_len,
            train_freq,
            skipped,
        })
    }

    /// Number of retained examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True when no examples were retained.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Example at `idx` in sorted order; `None` outside `[0, len)`.
    pub fn get(&self, idx: usize) -> Option<&DatasetExample> {
        self.examples.get(idx)
    }

    /// Iterate retained examples in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &DatasetExample> {
        self.examples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(t: usize) -> Array2<f32> {
        Array2::from_elem((t, 2), 1.0)
    }

    #[test]
    fn oversized_segments_are_skipped() {
        let ds = Brain2enDataset::new(
            vec![seg(500), seg(100)],
            vec![vec![2, 5, 6, 3], vec![2, 7, 8, 3]],
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.skipped, 1);
        assert_eq!(ds.max_seq_len, 100);
    }

    #[test]
    fn label_length_bounds_are_enforced() {
        let ds = Brain2enDataset::new(
            vec![seg(10), seg(10), seg(10)],
            vec![vec![2, 3], vec![2, 5, 6, 3], vec![9; 129]],
        )
        .unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.skipped, 2);
        assert_eq!(ds.get(0).unwrap().labels, vec![2, 5, 6, 3]);
    }

    #[test]
    fn examples_sort_by_segment_then_label_then_index() {
        let ds = Brain2enDataset::new(
            vec![seg(20), seg(10), seg(10)],
            vec![vec![2, 5, 6, 3], vec![2, 5, 6, 7, 3], vec![2, 5, 6, 3]],
        )
        .unwrap();
        let lens: Vec<(usize, usize)> = ds
            .iter()
            .map(|ex| (ex.signal.nrows(), ex.labels.len()))
            .collect();
        assert_eq!(lens, vec![(10, 4), (10, 5), (20, 4)]);
    }

    #[test]
    fn frequency_counts_cover_retained_labels_only() {
        let ds = Brain2enDataset::new(
            vec![seg(10), seg(500)],
            vec![vec![2, 5, 5, 3], vec![2, 9, 9, 3]],
        )
        .unwrap();
        assert_eq!(ds.train_freq.get(&5), Some(&2));
        assert_eq!(ds.train_freq.get(&2), Some(&1));
        assert_eq!(ds.train_freq.get(&9), None);
    }

    #[test]
    fn get_out_of_range_is_none() {
        let ds = Brain2enDataset::new(vec![seg(10)], vec![vec![2, 5, 6, 3]]).unwrap();
        assert!(ds.get(0).is_some());
        assert!(ds.get(1).is_none());
    }

    #[test]
    fn mismatched_inputs_are_an_error() {
        assert!(Brain2enDataset::new(vec![seg(10)], vec![]).is_err());
    }
}
