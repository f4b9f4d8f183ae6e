//! Normal compression against a smooth predictor.
//!
//! Both sides derive a predicted normal per vertex from data they already
//! share: the decoded (quantized) positions and the final triangle list. The
//! true normal is then expressed in a local spherical frame whose z-axis is
//! the predictor, leaving a small, smooth residual to delta-code. Any change
//! to the arithmetic here changes the wire format.

/// Cutoff below which a vector has no usable direction.
const DEGENERATE: f64 = 1e-20;

type Vec3 = [f64; 3];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn length(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn widen(p: [f32; 3]) -> Vec3 {
    [p[0] as f64, p[1] as f64, p[2] as f64]
}

/// Predicts a normal per vertex as the normalized sum of the cross products
/// of its incident triangles' edges. The cross product carries the face area,
/// so large faces dominate the average. Vertices with no usable incident
/// geometry predict +Z.
pub(crate) fn smooth_normals(positions: &[[f32; 3]], indices: &[[u32; 3]]) -> Vec<Vec3> {
    let mut acc = vec![[0f64; 3]; positions.len()];
    for &[a, b, c] in indices {
        let pa = widen(positions[a as usize]);
        let pb = widen(positions[b as usize]);
        let pc = widen(positions[c as usize]);
        let face = cross(sub(pb, pa), sub(pc, pa));
        for corner in [a, b, c] {
            let slot = &mut acc[corner as usize];
            slot[0] += face[0];
            slot[1] += face[1];
            slot[2] += face[2];
        }
    }
    for slot in acc.iter_mut() {
        let len = length(*slot);
        *slot = if len < DEGENERATE {
            [0.0, 0.0, 1.0]
        } else {
            scale(*slot, 1.0 / len)
        };
    }
    acc
}

/// Deterministic tangent frame around a unit predictor: the tangent is the
/// predictor crossed with the world axis of its smallest component, the
/// bitangent completes a right-handed `(t, b, n)` basis.
fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let mut axis = 0;
    for k in 1..3 {
        if n[k].abs() < n[axis].abs() {
            axis = k;
        }
    }
    let mut e = [0f64; 3];
    e[axis] = 1.0;
    let t = cross(n, e);
    let t = scale(t, 1.0 / length(t));
    let b = cross(n, t);
    (t, b)
}

/// Quantizes each normal as `(magnitude, phi, theta)` relative to its
/// predictor and emits three vertex-order delta streams, column-major.
pub(crate) fn encode_normals(
    normals: &[[f32; 3]],
    predicted: &[Vec3],
    precision: f32,
) -> Vec<u8> {
    let step = precision as f64;
    let count = normals.len();
    let mut out = vec![0u8; count * 12];
    let mut prev = [0u32; 3];
    for (i, (&normal, &p)) in normals.iter().zip(predicted).enumerate() {
        let n = widen(normal);
        let r = length(n);
        let q = if r < DEGENERATE {
            [0u32; 3]
        } else {
            let (t, b) = tangent_frame(p);
            let cos_phi = (dot(n, p) / r).clamp(-1.0, 1.0);
            let phi = cos_phi.acos();
            let theta = dot(n, b).atan2(dot(n, t));
            [
                (r / step).round() as i64 as u32,
                (phi / step).round() as i64 as u32,
                (theta / step).round() as i64 as u32,
            ]
        };
        for axis in 0..3 {
            let delta = q[axis].wrapping_sub(prev[axis]);
            out[(axis * count + i) * 4..][..4].copy_from_slice(&delta.to_le_bytes());
        }
        prev = q;
    }
    out
}

/// Inverse of [`encode_normals`], given the same predictors.
pub(crate) fn decode_normals(
    bytes: &[u8],
    predicted: &[Vec3],
    precision: f32,
) -> Option<Vec<[f32; 3]>> {
    let step = precision as f64;
    let count = predicted.len();
    if bytes.len() != count * 12 {
        return None;
    }
    let mut out = Vec::with_capacity(count);
    let mut prev = [0u32; 3];
    for (i, &p) in predicted.iter().enumerate() {
        let mut q = [0u32; 3];
        for axis in 0..3 {
            let at = (axis * count + i) * 4;
            let delta = u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap());
            q[axis] = prev[axis].wrapping_add(delta);
        }
        prev = q;

        let r = q[0] as i32 as f64 * step;
        let phi = q[1] as i32 as f64 * step;
        let theta = q[2] as i32 as f64 * step;
        let (t, b) = tangent_frame(p);
        let (sin_phi, cos_phi) = phi.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();
        let mut n = [0f32; 3];
        for axis in 0..3 {
            let v = r
                * (sin_phi * (cos_theta * t[axis] + sin_theta * b[axis]) + cos_phi * p[axis]);
            n[axis] = v as f32;
        }
        out.push(n);
    }
    Some(out)
}
