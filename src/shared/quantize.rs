//! Generic fixed-point channel quantization for UV and attribute maps.
//!
//! Each channel is quantized independently with the map's precision, delta
//! coded in vertex order, and laid out column-major. Values may be negative;
//! the wire stores wrapping 32-bit two's-complement.

/// Quantizes and delta-codes `N`-channel tuples.
pub(crate) fn encode_channel_deltas<const N: usize>(values: &[[f32; N]], precision: f32) -> Vec<u8> {
    let step = precision as f64;
    let count = values.len();
    let mut out = vec![0u8; count * N * 4];
    let mut prev = [0u32; N];
    for (i, value) in values.iter().enumerate() {
        for channel in 0..N {
            let q = (value[channel] as f64 / step).round() as i64 as u32;
            let delta = q.wrapping_sub(prev[channel]);
            out[(channel * count + i) * 4..][..4].copy_from_slice(&delta.to_le_bytes());
            prev[channel] = q;
        }
    }
    out
}

/// Inverse of [`encode_channel_deltas`]; `None` on a length mismatch.
pub(crate) fn decode_channel_deltas<const N: usize>(
    bytes: &[u8],
    count: usize,
    precision: f32,
) -> Option<Vec<[f32; N]>> {
    if bytes.len() != count * N * 4 {
        return None;
    }
    let step = precision as f64;
    let mut out = vec![[0f32; N]; count];
    let mut prev = [0u32; N];
    for (i, value) in out.iter_mut().enumerate() {
        for channel in 0..N {
            let at = (channel * count + i) * 4;
            let delta = u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
            let q = prev[channel].wrapping_add(delta);
            prev[channel] = q;
            value[channel] = (q as i32 as f64 * step) as f32;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_within_half_step() {
        let precision = 1.0f32 / 4096.0;
        let values = vec![[0.0f32, 0.0], [1.0, 0.0], [0.33, -0.75], [1.0, 1.0]];
        let bytes = encode_channel_deltas(&values, precision);
        let back: Vec<[f32; 2]> = decode_channel_deltas(&bytes, values.len(), precision).unwrap();
        for (orig, dec) in values.iter().zip(&back) {
            for channel in 0..2 {
                assert!((orig[channel] - dec[channel]).abs() <= precision / 2.0 + 1e-7);
            }
        }
    }

    #[test]
    fn exact_multiples_are_lossless() {
        let precision = 0.25f32;
        let values = vec![[0.5f32, -1.25, 2.0, 0.0], [0.75, 0.75, -4.0, 0.25]];
        let bytes = encode_channel_deltas(&values, precision);
        let back: Vec<[f32; 4]> = decode_channel_deltas(&bytes, values.len(), precision).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(decode_channel_deltas::<2>(&[0u8; 8], 2, 0.5).is_none());
    }
}
