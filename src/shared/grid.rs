//! Fixed-point vertex quantization and the uniform cell grid used by the
//! MG2 pipeline.
//!
//! Vertices quantize to integer steps of the vertex precision, measured from
//! the bounding-box minimum. The grid partitions the box so that one cell
//! spans roughly 256 quantization steps per axis, and vertices are sorted by
//! cell id so that within-cell coordinate deltas stay small.

/// The grid header fields serialized with every MG2 body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Grid {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub divisions: [u32; 3],
}

/// Quantization steps covered by one grid cell per axis.
const STEPS_PER_CELL: f64 = 256.0;

impl Grid {
    /// Computes the bounding box and cell divisions for a point set.
    pub fn build(points: &[[f32; 3]], precision: f32) -> Self {
        let mut min = points[0];
        let mut max = points[0];
        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        let mut divisions = [1u32; 3];
        for axis in 0..3 {
            let range = (max[axis] - min[axis]) as f64;
            let cells = (range / precision as f64 / STEPS_PER_CELL).ceil();
            divisions[axis] = (cells.max(1.0)) as u32;
        }
        Grid {
            min,
            max,
            divisions,
        }
    }

    /// Total cell count; callers reject grids whose ids would not fit u32.
    pub fn cell_count(&self) -> u128 {
        self.divisions.iter().map(|&d| d as u128).product()
    }

    /// Row-major cell id of a point: x varies fastest, then y, then z.
    pub fn cell_of(&self, p: [f32; 3]) -> u32 {
        let mut coord = [0u32; 3];
        for axis in 0..3 {
            let range = (self.max[axis] - self.min[axis]) as f64;
            if range > 0.0 {
                let div = self.divisions[axis];
                let t = (p[axis] - self.min[axis]) as f64 / range * div as f64;
                coord[axis] = (t.floor() as u32).min(div - 1);
            }
        }
        (coord[2] * self.divisions[1] + coord[1]) * self.divisions[0] + coord[0]
    }
}

/// Quantizes positions to integer steps from the grid minimum.
pub(crate) fn quantize_positions(
    points: &[[f32; 3]],
    min: [f32; 3],
    precision: f32,
) -> Vec<[u32; 3]> {
    points
        .iter()
        .map(|p| {
            let mut q = [0u32; 3];
            for axis in 0..3 {
                let steps = ((p[axis] - min[axis]) as f64 / precision as f64).round();
                q[axis] = steps.max(0.0) as u32;
            }
            q
        })
        .collect()
}

/// Reconstructs positions from quantized steps. The encoder runs this too,
/// so the normal predictor sees exactly the coordinates the decoder will.
pub(crate) fn dequantize_positions(
    quantized: &[[u32; 3]],
    min: [f32; 3],
    precision: f32,
) -> Vec<[f32; 3]> {
    quantized
        .iter()
        .map(|q| {
            let mut p = [0f32; 3];
            for axis in 0..3 {
                p[axis] = (min[axis] as f64 + q[axis] as f64 * precision as f64) as f32;
            }
            p
        })
        .collect()
}

/// Stable spatial sort: by cell id, then quantized y, then quantized x.
/// Returns the new -> old vertex permutation.
pub(crate) fn sort_by_cell(cells: &[u32], quantized: &[[u32; 3]]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..cells.len() as u32).collect();
    order.sort_by_key(|&i| {
        let i = i as usize;
        (cells[i], quantized[i][1], quantized[i][0])
    });
    order
}

/// Emits the three coordinate delta streams, column-major (all x deltas,
/// then y, then z). Deltas run against the previous vertex within the same
/// cell and reset to the absolute value at a cell boundary.
pub(crate) fn encode_coordinate_deltas(quantized: &[[u32; 3]], cells: &[u32]) -> Vec<u8> {
    let count = quantized.len();
    let mut out = vec![0u8; count * 12];
    for i in 0..count {
        let same_cell = i > 0 && cells[i] == cells[i - 1];
        for axis in 0..3 {
            let delta = if same_cell {
                quantized[i][axis].wrapping_sub(quantized[i - 1][axis])
            } else {
                quantized[i][axis]
            };
            out[(axis * count + i) * 4..][..4].copy_from_slice(&delta.to_le_bytes());
        }
    }
    out
}

/// Inverse of [`encode_coordinate_deltas`].
pub(crate) fn decode_coordinate_deltas(bytes: &[u8], cells: &[u32]) -> Option<Vec<[u32; 3]>> {
    let count = cells.len();
    if bytes.len() != count * 12 {
        return None;
    }
    let mut out = vec![[0u32; 3]; count];
    for i in 0..count {
        let same_cell = i > 0 && cells[i] == cells[i - 1];
        for axis in 0..3 {
            let at = (axis * count + i) * 4;
            let delta = u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
            out[i][axis] = if same_cell {
                out[i - 1][axis].wrapping_add(delta)
            } else {
                delta
            };
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_box_grid() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let grid = Grid::build(&points, 0.1);
        assert_eq!(grid.min, [0.0, 0.0, 0.0]);
        assert_eq!(grid.max, [1.0, 1.0, 1.0]);
        // 1.0 / 0.1 = 10 steps, well under one cell per axis
        assert_eq!(grid.divisions, [1, 1, 1]);
        assert_eq!(grid.cell_of([0.99, 0.0, 0.5]), 0);
    }

    #[test]
    fn fine_precision_splits_cells() {
        let points = vec![[0.0, 0.0, 0.0], [10.0, 1.0, 0.0], [5.0, 0.5, 0.0]];
        let grid = Grid::build(&points, 0.001);
        // 10 / 0.001 = 10000 steps -> ceil(10000 / 256) = 40 cells on x
        assert_eq!(grid.divisions[0], 40);
        assert_eq!(grid.divisions[2], 1);
        // x cells are adjacent in the row-major id
        assert_eq!(grid.cell_of([0.0, 0.0, 0.0]), 0);
        assert_eq!(grid.cell_of([9.99, 0.0, 0.0]), 39);
    }

    #[test]
    fn quantize_dequantize_within_half_step() {
        let points = vec![[0.13, -0.4, 2.7], [1.0, 0.0, -1.0], [0.0, 0.77, 0.0]];
        let grid = Grid::build(&points, 0.01);
        let q = quantize_positions(&points, grid.min, 0.01);
        let back = dequantize_positions(&q, grid.min, 0.01);
        for (p, r) in points.iter().zip(&back) {
            for axis in 0..3 {
                assert!((p[axis] - r[axis]).abs() <= 0.005 + 1e-6);
            }
        }
    }

    #[test]
    fn coordinate_delta_roundtrip_with_cell_reset() {
        let quantized = vec![[5, 5, 5], [7, 4, 5], [1000, 0, 3], [1001, 2, 3]];
        let cells = vec![0, 0, 9, 9];
        let bytes = encode_coordinate_deltas(&quantized, &cells);
        // stream is column-major: first x-delta of vertex 2 resets to absolute
        let x2 = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        assert_eq!(x2, 1000);
        let back = decode_coordinate_deltas(&bytes, &cells).unwrap();
        assert_eq!(back, quantized);
    }

    #[test]
    fn spatial_sort_is_stable_within_equal_keys() {
        let cells = vec![1, 0, 1, 0];
        let quantized = vec![[0, 0, 0]; 4];
        assert_eq!(sort_by_cell(&cells, &quantized), vec![1, 3, 0, 2]);
    }
}
