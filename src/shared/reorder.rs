//! Triangle rearrangement and index delta coding shared by the MG1 and MG2
//! pipelines.
//!
//! Triangles are rotated so the smallest index leads (winding preserved),
//! sorted by `(first, second)`, and the vertices are renumbered in
//! first-touch order so that index values grow almost monotonically. A final
//! re-sort restores `(first, second)` order after the renumbering, which
//! keeps the first-index delta stream non-negative; second and third deltas
//! are signed.

use crate::core::bit_coder::ReaderErr;

/// Bytes per delta-coded triangle on the wire.
pub(crate) const TRIANGLE_WIRE_LEN: usize = 12;

/// Rotates each triangle cyclically so its smallest index comes first.
pub(crate) fn rotate_triangles(indices: &mut [[u32; 3]]) {
    for tri in indices.iter_mut() {
        let [a, b, c] = *tri;
        if b < a && b <= c {
            *tri = [b, c, a];
        } else if c < a && c <= b {
            *tri = [c, a, b];
        }
    }
}

/// Stable lexicographic sort by the first two corners.
pub(crate) fn sort_triangles(indices: &mut [[u32; 3]]) {
    indices.sort_by_key(|&[a, b, _]| (a, b));
}

/// Renumbers vertices in first-touch order over the (sorted) triangle list.
/// Unreferenced vertices keep their relative order at the tail. Indices are
/// rewritten in place; the returned permutation maps new index -> old index.
pub(crate) fn remap_vertices(indices: &mut [[u32; 3]], vertex_count: usize) -> Vec<u32> {
    const UNSEEN: u32 = u32::MAX;
    let mut old_to_new = vec![UNSEEN; vertex_count];
    let mut new_to_old = Vec::with_capacity(vertex_count);
    for tri in indices.iter() {
        for &corner in tri {
            if old_to_new[corner as usize] == UNSEEN {
                old_to_new[corner as usize] = new_to_old.len() as u32;
                new_to_old.push(corner);
            }
        }
    }
    for old in 0..vertex_count {
        if old_to_new[old] == UNSEEN {
            old_to_new[old] = new_to_old.len() as u32;
            new_to_old.push(old as u32);
        }
    }
    for tri in indices.iter_mut() {
        for corner in tri.iter_mut() {
            *corner = old_to_new[*corner as usize];
        }
    }
    new_to_old
}

/// The full reorder pass: rotate, sort, renumber, re-sort. Returns the
/// new -> old vertex permutation to apply to every per-vertex array.
pub(crate) fn reorder(indices: &mut [[u32; 3]], vertex_count: usize) -> Vec<u32> {
    rotate_triangles(indices);
    sort_triangles(indices);
    let permutation = remap_vertices(indices, vertex_count);
    sort_triangles(indices);
    permutation
}

/// Gathers `values` into the order given by a new -> old permutation.
pub(crate) fn apply_permutation<T: Copy>(values: &[T], new_to_old: &[u32]) -> Vec<T> {
    new_to_old.iter().map(|&old| values[old as usize]).collect()
}

/// Inverts a new -> old permutation into old -> new.
pub(crate) fn invert_permutation(new_to_old: &[u32]) -> Vec<u32> {
    let mut old_to_new = vec![0u32; new_to_old.len()];
    for (new, &old) in new_to_old.iter().enumerate() {
        old_to_new[old as usize] = new as u32;
    }
    old_to_new
}

/// Delta-codes the triangle list into its wire form: per triangle,
/// `first_i - first_{i-1}`, `second_i - first_i`, `third_i - first_i`,
/// each as 32-bit little-endian two's-complement.
pub(crate) fn delta_encode_indices(indices: &[[u32; 3]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len() * TRIANGLE_WIRE_LEN);
    let mut prev_first = 0u32;
    for &[a, b, c] in indices {
        out.extend_from_slice(&a.wrapping_sub(prev_first).to_le_bytes());
        out.extend_from_slice(&b.wrapping_sub(a).to_le_bytes());
        out.extend_from_slice(&c.wrapping_sub(a).to_le_bytes());
        prev_first = a;
    }
    out
}

/// Inverse of [`delta_encode_indices`]. The triangle count must match the
/// container header.
pub(crate) fn delta_decode_indices(
    bytes: &[u8],
    triangle_count: usize,
) -> Result<Vec<[u32; 3]>, ReaderErr> {
    if bytes.len() != triangle_count * TRIANGLE_WIRE_LEN {
        return Err(ReaderErr::NotEnoughData);
    }
    let mut out = Vec::with_capacity(triangle_count);
    let mut prev_first = 0u32;
    for tri in bytes.chunks_exact(TRIANGLE_WIRE_LEN) {
        let da = u32::from_le_bytes(tri[0..4].try_into().unwrap());
        let db = u32::from_le_bytes(tri[4..8].try_into().unwrap());
        let dc = u32::from_le_bytes(tri[8..12].try_into().unwrap());
        let a = prev_first.wrapping_add(da);
        out.push([a, a.wrapping_add(db), a.wrapping_add(dc)]);
        prev_first = a;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_preserves_winding() {
        let mut tris = vec![[5, 1, 3], [2, 7, 0], [0, 4, 6]];
        rotate_triangles(&mut tris);
        assert_eq!(tris, vec![[1, 3, 5], [0, 2, 7], [0, 4, 6]]);
    }

    #[test]
    fn reorder_of_canonical_tetrahedron_is_identity() {
        let mut tris = vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        let perm = reorder(&mut tris, 4);
        assert_eq!(tris, vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]]);
        assert_eq!(perm, vec![0, 1, 2, 3]);
    }

    #[test]
    fn first_touch_renumbering_makes_firsts_monotone() {
        // picked so that renumbering breaks the initial sort order
        let mut tris = vec![[0, 5, 9], [4, 5, 6], [5, 6, 7]];
        let perm = reorder(&mut tris, 10);
        let firsts: Vec<u32> = tris.iter().map(|t| t[0]).collect();
        assert!(firsts.windows(2).all(|w| w[0] <= w[1]));
        // unreferenced vertices 1, 2, 3, 8 are appended in original order
        assert_eq!(perm.len(), 10);
        assert_eq!(&perm[6..], &[1, 2, 3, 8]);
    }

    #[test]
    fn delta_roundtrip() {
        let mut tris = vec![[0, 5, 9], [4, 5, 6], [5, 6, 7], [0, 9, 5]];
        reorder(&mut tris, 10);
        let bytes = delta_encode_indices(&tris);
        assert_eq!(bytes.len(), tris.len() * TRIANGLE_WIRE_LEN);
        let back = delta_decode_indices(&bytes, tris.len()).unwrap();
        assert_eq!(back, tris);
    }

    #[test]
    fn tetrahedron_delta_stream_prefix() {
        let tris = vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        let bytes = delta_encode_indices(&tris);
        assert_eq!(
            &bytes[..12],
            &[0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0],
            "first triangle must encode as deltas 0, 1, 2"
        );
    }

    #[test]
    fn permutation_application_and_inverse() {
        let values = [[1.0f32, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let new_to_old = vec![2u32, 0, 1];
        let permuted = apply_permutation(&values, &new_to_old);
        assert_eq!(permuted[0], [3.0, 0.0]);
        let old_to_new = invert_permutation(&new_to_old);
        assert_eq!(old_to_new, vec![1, 2, 0]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(delta_decode_indices(&[0u8; 13], 1).is_err());
    }
}
