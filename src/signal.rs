//! Electrode matrix assembly.
//!
//! Discovers per-electrode recordings under `<conv>/preprocessed/`, loads
//! them in parallel, z-scores each series, and stacks the survivors into a
//! `[T, C]` feature matrix (one column per electrode, input order).
//!
//! A missing electrode file is a warning, not an error: the electrode is
//! excluded and the matrix is narrower.  Callers that require a fixed
//! electrode count must check `ncols()` themselves.

use anyhow::{bail, Context, Result};
use ndarray::Array2;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::mat5::read_mat_series;
use crate::normalize::zscore_inplace;

/// Variable under which each per-electrode series is stored in its MAT file.
pub const SERIES_VAR: &str = "p1st";

/// Subdirectory of a conversation holding the per-electrode files.
pub const PREPROCESSED_DIR: &str = "preprocessed";

/// Locate the file `<conv_dir>/preprocessed/*_{electrode}.mat`.
///
/// When several files match, the lexicographically first wins so repeated
/// runs see the same data.
pub fn find_electrode_file(conv_dir: &Path, electrode: u32) -> Option<PathBuf> {
    let dir = conv_dir.join(PREPROCESSED_DIR);
    let suffix = format!("_{electrode}.mat");
    let entries = std::fs::read_dir(&dir).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix))
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Load one electrode's series, or `None` (with a warning) when no file
/// matches.  Unreadable or corrupt files are errors.
pub fn load_electrode(conv_dir: &Path, electrode: u32) -> Result<Option<Vec<f32>>> {
    match find_electrode_file(conv_dir, electrode) {
        None => {
            warn!(
                electrode,
                dir = %conv_dir.join(PREPROCESSED_DIR).display(),
                "electrode file not found, excluding"
            );
            Ok(None)
        }
        Some(path) => {
            let series = read_mat_series(&path, SERIES_VAR)
                .with_context(|| format!("loading electrode {electrode}"))?;
            Ok(Some(series))
        }
    }
}

/// Load `electrodes` in parallel and assemble the `[T, C]` feature matrix.
///
/// The parallel map yields results in input order, so column `c` of the
/// output corresponds to the `c`-th *present* electrode of `electrodes`.
/// Each surviving series is z-scored against its own statistics before
/// stacking.  All series must share one length; zero surviving electrodes
/// is an error.
pub fn electrode_matrix(conv_dir: &Path, electrodes: &[u32]) -> Result<Array2<f32>> {
    let loaded: Vec<Option<Vec<f32>>> = electrodes
        .par_iter()
        .map(|&e| load_electrode(conv_dir, e))
        .collect::<Result<_>>()?;

    let mut series: Vec<Vec<f32>> = loaded.into_iter().flatten().collect();
    if series.is_empty() {
        bail!(
            "no electrode files found under {}",
            conv_dir.join(PREPROCESSED_DIR).display()
        );
    }
    let n_times = series[0].len();
    if let Some(s) = series.iter().find(|s| s.len() != n_times) {
        bail!(
            "electrode series lengths differ in {} ({} vs {n_times})",
            conv_dir.display(),
            s.len()
        );
    }

    for s in series.iter_mut() {
        zscore_inplace(s);
    }

    let mut out = Array2::<f32>::zeros((n_times, series.len()));
    for (c, s) in series.iter().enumerate() {
        for (t, &v) in s.iter().enumerate() {
            out[[t, c]] = v;
        }
    }
    Ok(out)
}
