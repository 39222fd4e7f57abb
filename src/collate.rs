//! Batch collation: padding, one-hot expansion, attention masks.
//!
//! Turns a batch of variable-length [`DatasetExample`]s into padded
//! tensors plus the teacher-forcing shift, causal attention bias, and
//! padding mask.  Fully deterministic given its inputs.

use anyhow::{bail, Context, Result};
use ndarray::{s, Array2, Array3};

use crate::config::PipelineConfig;
use crate::dataset::DatasetExample;
use crate::vocab::Vocabulary;

/// One collated batch.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Signal segments `[B, T_max, C]`, zero right-padded in time.
    pub src: Array3<f32>,
    /// One-hot decoder input `[B, L−1, V]` (last label position dropped).
    pub trg: Array3<f32>,
    /// Integer targets `[B, L−1]` (first label position dropped).
    pub trg_y: Array2<u32>,
    /// Additive causal bias `[1, L−1, L−1]`: 0 where `j ≤ i`, −inf otherwise.
    pub pos_mask: Array3<f32>,
    /// `[B, L−1]`, true where `trg_y` is the pad id.
    pub pad_mask: Array2<bool>,
}

impl Batch {
    /// Number of examples in the batch.
    pub fn batch_size(&self) -> usize {
        self.src.shape()[0]
    }
}

/// Collates dataset examples into [`Batch`]es.
///
/// Resolves the pad id once at construction so collation itself cannot
/// fail on vocabulary lookups.
#[derive(Debug, Clone)]
pub struct Collator {
    pad_id: u32,
    vocab_size: usize,
}

impl Collator {
    pub fn new(cfg: &PipelineConfig, vocab: &Vocabulary) -> Result<Self> {
        let pad_id = vocab
            .id(&cfg.pad_token)
            .with_context(|| format!("pad token {:?} not in vocabulary", cfg.pad_token))?;
        Ok(Self {
            pad_id,
            vocab_size: vocab.len(),
        })
    }

    /// Collate a batch, in order:
    ///
    /// 1. zero-pad signals to the batch maximum time length and stack;
    /// 2. pad labels to the batch maximum with the pad id and stack;
    /// 3. one-hot expand the padded labels;
    /// 4. split into `trg` (all but last position) and `trg_y` (all but
    ///    first — the teacher-forcing shift);
    /// 5. build the causal attention bias over `trg_y`'s length;
    /// 6. mark pad positions of `trg_y`.
    ///
    /// Empty batches, mixed electrode counts, and single-token label
    /// maxima are errors.
    pub fn collate(&self, batch: &[&DatasetExample]) -> Result<Batch> {
        let Some(first) = batch.first() else {
            bail!("cannot collate an empty batch");
        };
        let n_elec = first.signal.ncols();
        if batch.iter().any(|ex| ex.signal.ncols() != n_elec) {
            bail!("electrode counts differ within batch");
        }

        let b = batch.len();
        let max_t = batch.iter().map(|ex| ex.signal.nrows()).max().unwrap();
        let max_l = batch.iter().map(|ex| ex.labels.len()).max().unwrap();
        if max_l < 2 {
            bail!("need at least 2 label tokens to form a shifted target");
        }

        let mut src = Array3::<f32>::zeros((b, max_t, n_elec));
        for (i, ex) in batch.iter().enumerate() {
            src.slice_mut(s![i, ..ex.signal.nrows(), ..])
                .assign(&ex.signal);
        }

        let mut labels = Array2::<u32>::from_elem((b, max_l), self.pad_id);
        for (i, ex) in batch.iter().enumerate() {
            for (j, &tok) in ex.labels.iter().enumerate() {
                labels[[i, j]] = tok;
            }
        }

        let mut one_hot = Array3::<f32>::zeros((b, max_l, self.vocab_size));
        for i in 0..b {
            for j in 0..max_l {
                let tok = labels[[i, j]] as usize;
                if tok >= self.vocab_size {
                    bail!("label id {tok} outside vocabulary of size {}", self.vocab_size);
                }
                one_hot[[i, j, tok]] = 1.0;
            }
        }

        let trg = one_hot.slice(s![.., ..max_l - 1, ..]).to_owned();
        let trg_y = labels.slice(s![.., 1..]).to_owned();
        let pos_mask = causal_mask(max_l - 1);
        let pad_mask = trg_y.mapv(|v| v == self.pad_id);

        Ok(Batch {
            src,
            trg,
            trg_y,
            pos_mask,
            pad_mask,
        })
    }
}

/// Additive causal attention bias `[1, l, l]`.
///
/// Position `(i, j)` is 0.0 when `j ≤ i` (self and earlier positions)
/// and −inf otherwise.
pub fn causal_mask(l: usize) -> Array3<f32> {
    Array3::from_shape_fn(
        (1, l, l),
        |(_, i, j)| if j <= i { 0.0 } else { f32::NEG_INFINITY },
    )
}
