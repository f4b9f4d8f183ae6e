//! Byte-plane transposition of fixed-width word streams.
//!
//! A stream of 32-bit words is reordered so that all byte-0s come first,
//! then all byte-1s, and so on. Neighboring floats in a component column
//! share sign and exponent bytes, so the planes expose long near-constant
//! runs to the LZMA dictionary.

/// Interleaves `data` (a multiple of `word` bytes) into byte planes.
pub(crate) fn interleave(data: &[u8], word: usize) -> Vec<u8> {
    debug_assert!(data.len() % word == 0);
    let count = data.len() / word;
    let mut out = vec![0u8; data.len()];
    for (i, chunk) in data.chunks_exact(word).enumerate() {
        for (plane, &byte) in chunk.iter().enumerate() {
            out[plane * count + i] = byte;
        }
    }
    out
}

/// Serializes fixed-arity float tuples column-major: all first components,
/// then all second components, and so on, little-endian.
pub(crate) fn f32_columns<const N: usize>(values: &[[f32; N]]) -> Vec<u8> {
    let count = values.len();
    let mut out = vec![0u8; count * N * 4];
    for (i, value) in values.iter().enumerate() {
        for (column, component) in value.iter().enumerate() {
            out[(column * count + i) * 4..][..4].copy_from_slice(&component.to_le_bytes());
        }
    }
    out
}

/// Inverse of [`f32_columns`]; `None` when the byte count does not divide
/// into `count` tuples.
pub(crate) fn f32_from_columns<const N: usize>(bytes: &[u8], count: usize) -> Option<Vec<[f32; N]>> {
    if bytes.len() != count * N * 4 {
        return None;
    }
    let mut out = vec![[0f32; N]; count];
    for (i, value) in out.iter_mut().enumerate() {
        for (column, component) in value.iter_mut().enumerate() {
            let at = (column * count + i) * 4;
            *component = f32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
        }
    }
    Some(out)
}

/// Inverse of [`interleave`]. Decoded data may be corrupt, so a length that
/// does not divide by `word` is left to the caller's exact-size checks; the
/// tail bytes beyond the last whole word are passed through untouched.
pub(crate) fn deinterleave(data: &[u8], word: usize) -> Vec<u8> {
    let count = data.len() / word;
    let mut out = vec![0u8; data.len()];
    for i in 0..count {
        for plane in 0..word {
            out[i * word + plane] = data[plane * count + i];
        }
    }
    out[count * word..].copy_from_slice(&data[count * word..]);
    out
}
