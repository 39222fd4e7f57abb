/// Shared helpers for pipeline tests.
use brain2en::{mat_bytes, Utterance, Vocabulary};
use std::path::{Path, PathBuf};

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

#[allow(unused)]
/// Vocabulary covering the words in `tests/fixtures/transcript.csv`.
/// Specials take ids 0-3, first word id is 4.
pub fn test_vocab() -> Vocabulary {
    Vocabulary::from_words(["we", "should", "go", "there", "now", "okay", "sure"])
}

#[allow(unused)]
pub fn utt(tokens: &[u32], target: bool, onset: i64, offset: i64) -> Utterance {
    Utterance {
        tokens: tokens.to_vec(),
        target_speaker: target,
        onset,
        offset,
    }
}

#[allow(unused)]
/// Create `<root>/preprocessed/NY_conv_{electrode}.mat` holding `series`.
pub fn write_electrode_file(root: &Path, electrode: u32, series: &[f64]) {
    let dir = root.join("preprocessed");
    std::fs::create_dir_all(&dir).unwrap();
    let bytes = mat_bytes("p1st", series);
    std::fs::write(dir.join(format!("NY_conv_{electrode}.mat")), bytes).unwrap();
}

#[allow(unused)]
/// Fresh per-test scratch directory under the target dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("test-scratch")
        .join(format!("{name}-{}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).unwrap();
    }
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
