//! Mesh builders and equivalence helpers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;

use ctm_oxide::prelude::*;

pub const TETRA_VERTICES: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];
pub const TETRA_INDICES: [[u32; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

pub fn tetrahedron() -> Mesh {
    let mut mesh = Mesh::new(TETRA_VERTICES.to_vec(), TETRA_INDICES.to_vec(), None);
    mesh.comment = Some("t".to_owned());
    mesh
}

/// An irregular fan with distinct vertices, normals, two UV maps, and an
/// attribute map; deliberately not in canonical triangle order.
pub fn full_mesh() -> Mesh {
    let vertices = vec![
        [0.10, 0.20, 0.30],
        [1.25, 0.00, -0.40],
        [0.75, 1.10, 0.05],
        [-0.30, 0.90, 0.60],
        [0.55, -0.85, 0.95],
        [1.80, 1.40, -0.20],
    ];
    let indices = vec![[4, 0, 1], [2, 1, 0], [5, 2, 1], [0, 2, 3]];
    let normals = Some(
        [
            [0.1f32, 0.2, 0.97],
            [-0.3, 0.1, 0.95],
            [0.0, -0.1, 0.99],
            [0.2, 0.2, 0.96],
            [-0.1, -0.2, 0.97],
            [0.3, 0.0, 0.95],
        ]
        .iter()
        .map(|&n| normalize(n))
        .collect(),
    );
    let mut mesh = Mesh::new(vertices, indices, normals);
    mesh.tex_maps.push(TexMap::new(
        "diffuse",
        Some("diffuse.png".to_owned()),
        vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 1.0],
            [0.5, 0.5],
            [0.25, 0.75],
        ],
    ));
    mesh.tex_maps.push(TexMap::new(
        "lightmap",
        None,
        vec![
            [0.1, 0.9],
            [0.2, 0.8],
            [0.3, 0.7],
            [0.4, 0.6],
            [0.5, 0.5],
            [0.6, 0.4],
        ],
    ));
    mesh.attrib_maps.push(AttribMap::new(
        "color",
        vec![
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.5],
            [0.5, 0.5, 0.5, 1.0],
            [0.9, 0.1, 0.4, 0.25],
            [0.2, 0.7, 0.6, 0.75],
        ],
    ));
    mesh.comment = Some("full test mesh".to_owned());
    mesh
}

pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

pub fn encode_with(mesh: &Mesh, method: CompressionMethod) -> Vec<u8> {
    let mut cfg = encode::Config::default();
    cfg.method = method;
    let mut buffer = Vec::new();
    encode(mesh, &mut buffer, cfg).expect("encode failed");
    buffer
}

pub fn roundtrip(mesh: &Mesh, method: CompressionMethod) -> Mesh {
    let buffer = encode_with(mesh, method);
    decode(&mut &buffer[..]).expect("decode failed")
}

/// Matches each decoded vertex to the original with the same bit pattern and
/// checks that per-vertex data and the unordered triangle set survive the
/// permutation. Requires distinct original vertices.
pub fn assert_permutation_equivalent(original: &Mesh, decoded: &Mesh) {
    assert_eq!(original.vertex_count(), decoded.vertex_count());
    assert_eq!(original.triangle_count(), decoded.triangle_count());
    assert_eq!(original.comment, decoded.comment);

    let new_to_old: Vec<usize> = decoded
        .vertices
        .iter()
        .map(|v| {
            original
                .vertices
                .iter()
                .position(|o| o == v)
                .expect("decoded vertex not present in original")
        })
        .collect();
    let mut seen: Vec<usize> = new_to_old.clone();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), original.vertex_count(), "mapping is not a permutation");

    let original_triangles: HashSet<[u32; 3]> =
        original.indices.iter().map(|t| sorted_triple(*t)).collect();
    let decoded_triangles: HashSet<[u32; 3]> = decoded
        .indices
        .iter()
        .map(|&[a, b, c]| {
            sorted_triple([
                new_to_old[a as usize] as u32,
                new_to_old[b as usize] as u32,
                new_to_old[c as usize] as u32,
            ])
        })
        .collect();
    assert_eq!(original_triangles, decoded_triangles);

    match (&original.normals, &decoded.normals) {
        (Some(orig), Some(dec)) => {
            for (i, d) in dec.iter().enumerate() {
                assert_eq!(*d, orig[new_to_old[i]], "normal mismatch at vertex {i}");
            }
        }
        (None, None) => {}
        _ => panic!("normal presence changed in roundtrip"),
    }

    assert_eq!(original.tex_maps.len(), decoded.tex_maps.len());
    for (orig_map, dec_map) in original.tex_maps.iter().zip(&decoded.tex_maps) {
        assert_eq!(orig_map.name, dec_map.name);
        assert_eq!(orig_map.file_name, dec_map.file_name);
        assert_eq!(orig_map.precision, dec_map.precision);
        for (i, d) in dec_map.coords.iter().enumerate() {
            assert_eq!(*d, orig_map.coords[new_to_old[i]]);
        }
    }
    assert_eq!(original.attrib_maps.len(), decoded.attrib_maps.len());
    for (orig_map, dec_map) in original.attrib_maps.iter().zip(&decoded.attrib_maps) {
        assert_eq!(orig_map.name, dec_map.name);
        assert_eq!(orig_map.precision, dec_map.precision);
        for (i, d) in dec_map.values.iter().enumerate() {
            assert_eq!(*d, orig_map.values[new_to_old[i]]);
        }
    }
}

pub fn sorted_triple([a, b, c]: [u32; 3]) -> [u32; 3] {
    let mut t = [a, b, c];
    t.sort_unstable();
    t
}

pub fn angle_between(a: [f32; 3], b: [f32; 3]) -> f64 {
    let dot = (a[0] * b[0] + a[1] * b[1] + a[2] * b[2]) as f64;
    let la = ((a[0] * a[0] + a[1] * a[1] + a[2] * a[2]) as f64).sqrt();
    let lb = ((b[0] * b[0] + b[1] * b[1] + b[2] * b[2]) as f64).sqrt();
    (dot / (la * lb)).clamp(-1.0, 1.0).acos()
}
