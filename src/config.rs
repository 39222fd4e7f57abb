//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter for example preparation.
//! All fields have sensible defaults that match the values used to train the
//! brain-to-English model.

/// Configuration for the example-preparation pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use brain2en::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     start_offset: -256,   // open the window 256 samples before the word
///     end_offset:   256,
///     ..PipelineConfig::default()
/// };
/// ```
///
/// Or just call [`PipelineConfig::default()`] for the training settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Samples added to a word pair's onset to obtain the window start.
    ///
    /// Negative values open the window before the first word begins, so the
    /// extracted segment carries pre-articulation signal.
    ///
    /// Default: `-512`.
    pub start_offset: i64,

    /// Samples added to a word pair's offset to obtain the window end.
    ///
    /// Default: `512`.
    pub end_offset: i64,

    /// Samples per bin.
    ///
    /// The number of bins in a window is `ceil((end − begin) / bin_fs)`.
    ///
    /// Default: `32.0`.
    pub bin_fs: f64,

    /// Minimum admissible window length in samples.
    ///
    /// Windows shorter than this are rejected by
    /// [`is_bad_window`](crate::window::is_bad_window) and produce no example.
    ///
    /// Default: `64`.
    pub window: i64,

    /// Symbol prepended to every label sequence.  Must be present in the
    /// vocabulary.
    ///
    /// Default: `"<s>"`.
    pub start_token: String,

    /// Symbol appended to every label sequence.  Must be present in the
    /// vocabulary.
    ///
    /// Default: `"</s>"`.
    pub stop_token: String,

    /// Symbol whose id right-pads label sequences during collation.
    ///
    /// Default: `"<pad>"`.
    pub pad_token: String,
}

impl Default for PipelineConfig {
    /// Returns the training configuration:
    /// ±512-sample context · 32-sample bins · 64-sample minimum window.
    fn default() -> Self {
        Self {
            start_offset: -512,
            end_offset: 512,
            bin_fs: 32.0,
            window: 64,
            start_token: "<s>".into(),
            stop_token: "</s>".into(),
            pad_token: "<pad>".into(),
        }
    }
}
