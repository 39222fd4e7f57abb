//! Minimal MAT-file (Level 5) reader.
//!
//! Reads one named numeric matrix from an uncompressed little-endian MAT
//! file and returns it squeezed to a 1-D f32 series — enough for the
//! per-electrode `p1st` matrices.  No dependency on a MAT crate: the file
//! is a flat sequence of tagged data elements, parsed directly from bytes.
//!
//! Compressed (`miCOMPRESSED`) elements and big-endian files are reported
//! as errors, not skipped.

use anyhow::{bail, Context, Result};
use std::path::Path;

// MAT 5 data-element types.
const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

// Array classes (first byte of the array-flags word).
const MX_DOUBLE_CLASS: u32 = 6;
const MX_UINT32_CLASS: u32 = 13;

const HEADER_LEN: usize = 128;

/// Read the matrix named `var` from the MAT file at `path`, flattened to f32.
pub fn read_mat_series(path: &Path, var: &str) -> Result<Vec<f32>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_mat_bytes(&bytes, var).with_context(|| format!("parsing {}", path.display()))
}

/// Parse MAT 5 bytes and return the matrix named `var`, flattened to f32.
///
/// Element order within the matrix does not matter for the 1-D series this
/// reader serves; multi-dimensional matrices come back in storage
/// (column-major) order.
pub fn parse_mat_bytes(bytes: &[u8], var: &str) -> Result<Vec<f32>> {
    if bytes.len() < HEADER_LEN {
        bail!("file too small for a MAT 5 header ({} bytes)", bytes.len());
    }
    match &bytes[126..HEADER_LEN] {
        b"IM" => {}
        b"MI" => bail!("big-endian MAT files are not supported"),
        _ => bail!("not a MAT 5 file (bad endian indicator)"),
    }

    let mut pos = HEADER_LEN;
    while pos < bytes.len() {
        let (dtype, nbytes, tag_len) = read_tag(bytes, pos)?;
        let data_start = pos + tag_len;
        let data_end = data_start + nbytes;
        if data_end > bytes.len() {
            bail!("truncated data element at byte {pos}");
        }
        match dtype {
            MI_COMPRESSED => bail!("compressed MAT data elements are not supported"),
            MI_MATRIX => {
                let (name, data) = parse_matrix(&bytes[data_start..data_end])?;
                if name == var {
                    return Ok(data);
                }
            }
            _ => {}
        }
        pos += element_len(tag_len, nbytes);
    }
    bail!("variable {var:?} not found")
}

/// One data-element tag: (type, payload bytes, tag length).
///
/// The small-element format packs ≤ 4 payload bytes into the tag's second
/// half; it is signalled by a non-zero upper half of the first word.
fn read_tag(bytes: &[u8], pos: usize) -> Result<(u32, usize, usize)> {
    if pos + 8 > bytes.len() {
        bail!("truncated element tag at byte {pos}");
    }
    let word = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
    if word >> 16 != 0 {
        Ok((word & 0xFFFF, (word >> 16) as usize, 4))
    } else {
        let nbytes = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        Ok((word, nbytes, 8))
    }
}

/// Total element size including tag and alignment padding.
/// Payloads align to 8-byte boundaries; small elements occupy exactly 8.
fn element_len(tag_len: usize, nbytes: usize) -> usize {
    if tag_len == 4 {
        8
    } else {
        tag_len + nbytes + (8 - nbytes % 8) % 8
    }
}

fn sub(buf: &[u8], start: usize, len: usize) -> Result<&[u8]> {
    if start + len > buf.len() {
        bail!("truncated subelement at byte {start}");
    }
    Ok(&buf[start..start + len])
}

/// Parse a miMATRIX payload: array flags, dimensions, name, real part.
/// The imaginary part of complex matrices, if present, is ignored.
fn parse_matrix(buf: &[u8]) -> Result<(String, Vec<f32>)> {
    let mut pos = 0;

    // array flags
    let (dtype, nbytes, tag_len) = read_tag(buf, pos)?;
    if dtype != MI_UINT32 || nbytes != 8 {
        bail!("malformed array-flags subelement");
    }
    let flags = u32::from_le_bytes(sub(buf, pos + tag_len, 4)?.try_into().unwrap());
    let class = flags & 0xFF;
    if !(MX_DOUBLE_CLASS..=MX_UINT32_CLASS).contains(&class) {
        bail!("unsupported matrix class {class} (numeric classes only)");
    }
    pos += element_len(tag_len, nbytes);

    // dimensions
    let (dtype, nbytes, tag_len) = read_tag(buf, pos)?;
    if dtype != MI_INT32 {
        bail!("malformed dimensions subelement");
    }
    let dims: Vec<usize> = sub(buf, pos + tag_len, nbytes)?
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes(b.try_into().unwrap()) as usize)
        .collect();
    pos += element_len(tag_len, nbytes);

    // array name
    let (dtype, nbytes, tag_len) = read_tag(buf, pos)?;
    if dtype != MI_INT8 {
        bail!("malformed array-name subelement");
    }
    let name = std::str::from_utf8(sub(buf, pos + tag_len, nbytes)?)
        .context("array name is not UTF-8")?
        .to_string();
    pos += element_len(tag_len, nbytes);

    // real part
    let (dtype, nbytes, tag_len) = read_tag(buf, pos)?;
    let data = decode_numeric(dtype, sub(buf, pos + tag_len, nbytes)?)
        .with_context(|| format!("matrix {name:?}"))?;

    let expected: usize = dims.iter().product();
    if data.len() != expected {
        bail!(
            "matrix {name:?}: {} values for dimensions {dims:?}",
            data.len()
        );
    }
    Ok((name, data))
}

fn decode_numeric(dtype: u32, raw: &[u8]) -> Result<Vec<f32>> {
    let out = match dtype {
        MI_DOUBLE => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes(b.try_into().unwrap()) as f32)
            .collect(),
        MI_SINGLE => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(b.try_into().unwrap()))
            .collect(),
        MI_INT8 => raw.iter().map(|&b| b as i8 as f32).collect(),
        MI_UINT8 => raw.iter().map(|&b| b as f32).collect(),
        MI_INT16 => raw
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes(b.try_into().unwrap()) as f32)
            .collect(),
        MI_UINT16 => raw
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes(b.try_into().unwrap()) as f32)
            .collect(),
        MI_INT32 => raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes(b.try_into().unwrap()) as f32)
            .collect(),
        MI_UINT32 => raw
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes(b.try_into().unwrap()) as f32)
            .collect(),
        _ => bail!("unsupported real-part type {dtype}"),
    };
    Ok(out)
}

/// Serialise `values` as an uncompressed little-endian MAT 5 file holding
/// one `[1, n]` double matrix named `var`.  Used by tests and fixtures.
pub fn mat_bytes(var: &str, values: &[f64]) -> Vec<u8> {
    let mut out = Vec::new();

    // header: descriptive text padded to 124 bytes, version, endian tag
    let text = b"MATLAB 5.0 MAT-file, written by brain2en";
    out.extend_from_slice(text);
    out.resize(124, b' ');
    out.extend_from_slice(&0x0100_u16.to_le_bytes());
    out.extend_from_slice(b"IM");

    let name_padded = {
        let mut n = var.as_bytes().to_vec();
        n.resize(var.len() + (8 - var.len() % 8) % 8, 0);
        n
    };
    let name_elem_len = 8 + name_padded.len();
    let matrix_len = 16 + 16 + name_elem_len + 8 + values.len() * 8;

    // miMATRIX tag
    out.extend_from_slice(&MI_MATRIX.to_le_bytes());
    out.extend_from_slice(&(matrix_len as u32).to_le_bytes());
    // array flags: mxDOUBLE class, nzmax 0
    out.extend_from_slice(&MI_UINT32.to_le_bytes());
    out.extend_from_slice(&8_u32.to_le_bytes());
    out.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes());
    // dimensions: [1, n]
    out.extend_from_slice(&MI_INT32.to_le_bytes());
    out.extend_from_slice(&8_u32.to_le_bytes());
    out.extend_from_slice(&1_i32.to_le_bytes());
    out.extend_from_slice(&(values.len() as i32).to_le_bytes());
    // name
    out.extend_from_slice(&MI_INT8.to_le_bytes());
    out.extend_from_slice(&(var.len() as u32).to_le_bytes());
    out.extend_from_slice(&name_padded);
    // real part
    out.extend_from_slice(&MI_DOUBLE.to_le_bytes());
    out.extend_from_slice(&((values.len() * 8) as u32).to_le_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_double_series() {
        let bytes = mat_bytes("p1st", &[1.0, 2.5, -3.0, 4.0]);
        let series = parse_mat_bytes(&bytes, "p1st").unwrap();
        assert_eq!(series, vec![1.0, 2.5, -3.0, 4.0]);
    }

    #[test]
    fn missing_variable_is_an_error() {
        let bytes = mat_bytes("p1st", &[1.0]);
        let err = parse_mat_bytes(&bytes, "other").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn second_matrix_is_found() {
        let mut bytes = mat_bytes("first", &[9.0]);
        bytes.extend_from_slice(&mat_bytes("p1st", &[7.0, 8.0])[HEADER_LEN..]);
        assert_eq!(parse_mat_bytes(&bytes, "p1st").unwrap(), vec![7.0, 8.0]);
    }

    #[test]
    fn name_longer_than_eight_bytes_round_trips() {
        // exercises name padding to the next 8-byte boundary
        let bytes = mat_bytes("electrode_series", &[1.0, 2.0]);
        assert_eq!(
            parse_mat_bytes(&bytes, "electrode_series").unwrap(),
            vec![1.0, 2.0]
        );
    }

    #[test]
    fn bad_endian_indicator_is_an_error() {
        let mut bytes = mat_bytes("p1st", &[1.0]);
        bytes[126] = b'M';
        bytes[127] = b'I';
        let err = parse_mat_bytes(&bytes, "p1st").unwrap_err();
        assert!(err.to_string().contains("big-endian"));
    }

    #[test]
    fn truncated_file_is_an_error() {
        let bytes = mat_bytes("p1st", &[1.0, 2.0]);
        assert!(parse_mat_bytes(&bytes[..140], "p1st").is_err());
        assert!(parse_mat_bytes(&bytes[..64], "p1st").is_err());
    }

    #[test]
    fn compressed_elements_are_an_error() {
        let mut bytes = mat_bytes("p1st", &[1.0])[..HEADER_LEN].to_vec();
        bytes.extend_from_slice(&MI_COMPRESSED.to_le_bytes());
        bytes.extend_from_slice(&4_u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let err = parse_mat_bytes(&bytes, "p1st").unwrap_err();
        assert!(err.to_string().contains("compressed"));
    }
}
