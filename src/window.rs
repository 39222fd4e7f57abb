//! Window parameter computation.
//!
//! Maps a word pair's `[onset, offset]` span onto a slice of the electrode
//! matrix time axis, widened by the configured offsets, and validates the
//! slice against the signal bounds.

use crate::config::PipelineConfig;
use crate::transcript::Utterance;

/// Slice boundaries and bin count for one word pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    /// Word-pair span in samples (`offset − onset`), before widening.
    pub seq_length: i64,
    /// First sample of the window (`onset + start_offset`); may be negative.
    pub begin: i64,
    /// One past the last sample of the window (`offset + end_offset`).
    pub end: i64,
    /// Number of bins covering the window: `ceil((end − begin) / bin_fs)`.
    pub bin_size: i64,
}

/// Compute the window parameters for one word pair.
pub fn window_params(gram: &Utterance, cfg: &PipelineConfig) -> WindowParams {
    let seq_length = gram.offset - gram.onset;
    let begin = gram.onset + cfg.start_offset;
    let end = gram.offset + cfg.end_offset;
    let bin_size = ((end - begin) as f64 / cfg.bin_fs).ceil() as i64;
    WindowParams { seq_length, begin, end, bin_size }
}

/// True when `[begin, end)` cannot be sliced from a signal of `n_times`
/// samples or spans fewer than `min_window` samples.
///
/// A window is bad when it starts before the signal, starts or ends past
/// it, ends before sample 0, or is shorter than `min_window` (which also
/// covers inverted windows for any positive `min_window`).
pub fn is_bad_window(begin: i64, end: i64, n_times: usize, min_window: i64) -> bool {
    let t = n_times as i64;
    begin < 0 || begin > t || end < 0 || end > t || end - begin < min_window || end - begin < 0
}
