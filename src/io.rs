//! Safetensors output for prepared example sets.
//!
//! The training side reads one tensor pair per example:
//!   signal_N   [T, C]  f32   windowed, z-scored signal segment
//!   label_N    [L]     i32   token ids including boundary markers
//!   n_examples [1]     i32

use anyhow::{bail, Result};
use ndarray::Array2;
use std::path::Path;

/// Simple safetensors file writer for F32 and I32 tensors.
///
/// Usage:
/// ```rust,no_run
/// use brain2en::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("signal", &[1.0f32, 2.0, 3.0], &[1, 3]);
/// w.add_i32("label", &[4, 5], &[2]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl Default for StWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StWriter {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries
            .push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    pub fn add_f32_arr2(&mut self, name: &str, arr: &Array2<f32>) {
        let data: Vec<f32> = arr.iter().copied().collect();
        self.add_f32(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries
            .push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes
            .into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

/// Write prepared examples to a safetensors file.
///
/// `signals[i]`: [T, C]   `labels[i]`: token ids, length L
pub fn write_examples(
    signals: &[Array2<f32>],
    labels: &[Vec<u32>],
    path: &Path,
) -> Result<()> {
    if signals.len() != labels.len() {
        bail!(
            "{} signals but {} label sequences",
            signals.len(),
            labels.len()
        );
    }

    let mut w = StWriter::new();
    for (i, (sig, lab)) in signals.iter().zip(labels).enumerate() {
        w.add_f32_arr2(&format!("signal_{i}"), sig);
        let ids: Vec<i32> = lab.iter().map(|&t| t as i32).collect();
        w.add_i32(&format!("label_{i}"), &ids, &[ids.len()]);
    }
    w.add_i32("n_examples", &[signals.len() as i32], &[1]);
    w.write(path)
}
