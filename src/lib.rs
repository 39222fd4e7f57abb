//! # brain2en — ECoG-to-English example preparation
//!
//! `brain2en` aligns electrode recordings with transcribed speech and turns
//! them into padded (signal, label) training batches for a
//! sequence-to-sequence model.
//!
//! ## Pipeline overview
//!
//! ```text
//! transcript.txt                 conversation/preprocessed/*_{e}.mat
//!   │                              │
//!   ├─ read_transcript()           ├─ electrode_matrix()    parallel load,
//!   │    tokens + speaker + times  │                        per-electrode
//!   ├─ generate_word_pairs()       │                        z-score, [T, C]
//!   ├─ remove_duplicates()         │
//!   ├─ remove_oovs()               │
//!   │                              │
//!   └──────────► build_examples() ◄┘
//!                  │    window_params() + is_bad_window()
//!                  │    signal slice + boundary tokens
//!                  ▼
//!            Brain2enDataset      length-sorted, bounds-filtered
//!                  │
//!                  ▼
//!            Collator::collate()  (src, trg, trg_y, pos_mask, pad_mask)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use brain2en::{
//!     build_examples, electrode_matrix, generate_word_pairs, read_transcript,
//!     remove_duplicates, remove_oovs, Brain2enDataset, Collator, DataTag,
//!     PipelineConfig, Vocabulary,
//! };
//! use std::collections::HashSet;
//! use std::path::Path;
//!
//! let vocab = Vocabulary::load(Path::new("vocab.json")).unwrap();
//! let cfg = PipelineConfig::default();
//!
//! let utterances = read_transcript(
//!     Path::new("conversation/transcript.txt"),
//!     ',',
//!     &vocab,
//!     &HashSet::new(),
//! ).unwrap();
//!
//! let grams = generate_word_pairs(&utterances);
//! let grams = remove_duplicates(grams);
//! let grams = remove_oovs(grams, &vocab, DataTag::Train);
//!
//! let electrodes: Vec<u32> = (1..=64).collect();
//! let ecogs = electrode_matrix(Path::new("conversation"), &electrodes).unwrap();
//! let (signals, labels) = build_examples(&grams, &ecogs, &vocab, &cfg).unwrap();
//! let dataset = Brain2enDataset::new(signals, labels).unwrap();
//!
//! let collator = Collator::new(&cfg, &vocab).unwrap();
//! let refs: Vec<_> = dataset.iter().take(8).collect();
//! let batch = collator.collate(&refs).unwrap();
//! println!("src {:?}", batch.src.shape());
//! ```

pub mod collate;
pub mod config;
pub mod dataset;
pub mod grams;
pub mod io;
pub mod mat5;
pub mod normalize;
pub mod signal;
pub mod transcript;
pub mod vocab;
pub mod window;

use anyhow::Result;
use ndarray::{s, Array2};
use tracing::debug;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `brain2en::Foo` without having to know the internal module layout.

// collate
pub use collate::{causal_mask, Batch, Collator};

// config
pub use config::PipelineConfig;

// dataset
pub use dataset::{
    Brain2enDataset, DatasetExample, MAX_LABEL_LEN, MAX_SEG_LEN, MIN_LABEL_LEN,
};

// grams
pub use grams::{
    add_boundary_tokens, generate_word_pairs, remove_duplicates, remove_oovs, DataTag,
};

// io — safetensors helpers
pub use io::{write_examples, StWriter};

// mat5
pub use mat5::{mat_bytes, parse_mat_bytes, read_mat_series};

// normalize
pub use normalize::zscore_inplace;

// signal
pub use signal::{
    electrode_matrix, find_electrode_file, load_electrode, PREPROCESSED_DIR, SERIES_VAR,
};

// transcript
pub use transcript::{read_transcript, Utterance, TARGET_SPEAKER};

// vocab
pub use vocab::{Vocabulary, PAD_TOKEN, START_TOKEN, STOP_TOKEN, UNK_TOKEN};

// window
pub use window::{is_bad_window, window_params, WindowParams};

/// Map word pairs onto signal segments and boundary-annotated labels.
///
/// For each gram the window is computed from its onset/offset and the
/// configured offsets, validated against the matrix length and
/// [`PipelineConfig::window`], and — when valid — sliced as rows
/// `[begin, end)` of `ecogs`.  Invalid windows are skipped with a debug
/// log, not errors: grams near the recording edges are expected casualties.
///
/// Returns parallel vectors ready for [`Brain2enDataset::new`].
///
/// # Errors
///
/// Fails when the configured start/stop symbols are missing from `vocab`.
pub fn build_examples(
    grams: &[Utterance],
    ecogs: &Array2<f32>,
    vocab: &Vocabulary,
    cfg: &PipelineConfig,
) -> Result<(Vec<Array2<f32>>, Vec<Vec<u32>>)> {
    let n_times = ecogs.nrows();
    let mut signals = Vec::new();
    let mut labels = Vec::new();

    for gram in grams {
        let w = window_params(gram, cfg);
        if is_bad_window(w.begin, w.end, n_times, cfg.window) {
            debug!(
                onset = gram.onset,
                offset = gram.offset,
                begin = w.begin,
                end = w.end,
                "window outside signal bounds, skipping"
            );
            continue;
        }
        let segment = ecogs.slice(s![w.begin as usize..w.end as usize, ..]).to_owned();
        let mut lab = gram.tokens.clone();
        add_boundary_tokens(&mut lab, vocab, &cfg.start_token, &cfg.stop_token)?;
        signals.push(segment);
        labels.push(lab);
    }
    Ok((signals, labels))
}
