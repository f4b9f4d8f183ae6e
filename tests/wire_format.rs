mod common;

use common::*;
use ctm_oxide::prelude::*;

/// Container header length for the tetrahedron fixture: magic, version,
/// method, five u32 fields, and the one-byte comment "t" with its length
/// prefix.
const HEADER_LEN: usize = 4 + 4 + 4 + 5 * 4 + 4 + 1;

fn u32_at(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

fn f32_at(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[test]
fn raw_header_bytes_of_tetrahedron() {
    let buffer = encode_with(&tetrahedron(), CompressionMethod::Raw);
    assert_eq!(&buffer[0..4], b"OCTM");
    assert_eq!(&buffer[4..8], &[0x04, 0x00, 0x00, 0x00]);
    assert_eq!(&buffer[8..12], &[0x01, 0x02, 0x00, 0x00]);
    assert_eq!(u32_at(&buffer, 12), 4, "vertex count");
    assert_eq!(u32_at(&buffer, 16), 4, "triangle count");
    assert_eq!(u32_at(&buffer, 20), 0, "uv map count");
    assert_eq!(u32_at(&buffer, 24), 0, "attrib map count");
    assert_eq!(u32_at(&buffer, 28), 0, "flags");
    assert_eq!(u32_at(&buffer, 32), 1, "comment length");
    assert_eq!(buffer[36], b't');
    assert_eq!(&buffer[HEADER_LEN..HEADER_LEN + 4], b"INDX");
}

#[test]
fn mg1_body_tag_and_index_stream() {
    let buffer = encode_with(&tetrahedron(), CompressionMethod::Mg1);
    assert_eq!(&buffer[8..12], &[0x02, 0x02, 0x00, 0x00], "method id");
    assert_eq!(&buffer[HEADER_LEN..HEADER_LEN + 4], b"MG1\0");

    // body counts repeat the container header
    assert_eq!(u32_at(&buffer, HEADER_LEN + 4), 4);
    assert_eq!(u32_at(&buffer, HEADER_LEN + 8), 4);

    let indx_at = HEADER_LEN + 4 + 5 * 4;
    assert_eq!(&buffer[indx_at..indx_at + 4], b"INDX");

    // unpack the packed chunk: uncompressed size, packed size, props, payload
    let uncompressed_size = u32_at(&buffer, indx_at + 4) as usize;
    let packed_size = u32_at(&buffer, indx_at + 8) as usize;
    assert_eq!(uncompressed_size, 4 * 12, "four delta-coded index triples");

    let props_at = indx_at + 12;
    let mut stream = Vec::new();
    stream.extend_from_slice(&buffer[props_at..props_at + 5]);
    stream.extend_from_slice(&(uncompressed_size as u64).to_le_bytes());
    stream.extend_from_slice(&buffer[props_at + 5..props_at + 5 + packed_size]);
    let mut decompressed = Vec::new();
    lzma_rs::lzma_decompress(&mut &stream[..], &mut decompressed).unwrap();

    assert_eq!(decompressed.len(), uncompressed_size);
    assert_eq!(
        &decompressed[..12],
        &[0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0],
        "first triangle delta-codes to 0, 1, 2"
    );

    let decoded = decode(&mut &buffer[..]).unwrap();
    assert_eq!(decoded, tetrahedron());
}

#[test]
fn mg2_header_carries_precision_bbox_and_grid() {
    let mesh = tetrahedron();
    let mut cfg = encode::Config::default();
    cfg.method = CompressionMethod::Mg2;
    cfg.vertex_precision = 0.1;
    let mut buffer = Vec::new();
    encode(&mesh, &mut buffer, cfg).unwrap();

    assert_eq!(&buffer[8..12], &[0x03, 0x02, 0x00, 0x00], "method id");
    assert_eq!(&buffer[HEADER_LEN..HEADER_LEN + 4], b"MG2\0");

    let precision_at = HEADER_LEN + 4 + 5 * 4;
    assert_eq!(f32_at(&buffer, precision_at), 0.1, "vertex precision");
    let bbox_min_at = precision_at + 8;
    let bbox_max_at = bbox_min_at + 12;
    for axis in 0..3 {
        assert_eq!(f32_at(&buffer, bbox_min_at + axis * 4), 0.0);
        assert_eq!(f32_at(&buffer, bbox_max_at + axis * 4), 1.0);
    }
    let divisions_at = bbox_max_at + 12;
    for axis in 0..3 {
        assert_eq!(u32_at(&buffer, divisions_at + axis * 4), 1);
    }

    // every decoded component lands within the precision of the original
    let decoded = decode(&mut &buffer[..]).unwrap();
    for decoded_vertex in &decoded.vertices {
        let nearest = mesh
            .vertices
            .iter()
            .map(|v| {
                v.iter()
                    .zip(decoded_vertex)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0f32, f32::max)
            })
            .fold(f32::INFINITY, f32::min);
        assert!(nearest <= 0.1);
    }
}

#[test]
fn bad_magic_is_rejected() {
    let mut buffer = encode_with(&tetrahedron(), CompressionMethod::Raw);
    buffer[0] = b'X';
    assert!(matches!(
        decode(&mut &buffer[..]),
        Err(decode::Err::BadMagic)
    ));
}

#[test]
fn unknown_version_is_rejected() {
    let mut buffer = encode_with(&tetrahedron(), CompressionMethod::Raw);
    buffer[4] = 5;
    assert!(matches!(
        decode(&mut &buffer[..]),
        Err(decode::Err::UnsupportedVersion(5))
    ));
}

#[test]
fn unknown_method_is_rejected() {
    let mut buffer = encode_with(&tetrahedron(), CompressionMethod::Raw);
    buffer[8] = 0x99;
    assert!(matches!(
        decode(&mut &buffer[..]),
        Err(decode::Err::UnsupportedMethod(0x0299))
    ));
}

#[test]
fn truncated_stream_is_an_io_error() {
    let buffer = encode_with(&tetrahedron(), CompressionMethod::Mg1);
    for len in [3, 15, HEADER_LEN + 2] {
        let mut slice = &buffer[..len];
        assert!(matches!(decode(&mut slice), Err(decode::Err::Io(_))));
    }
}

#[test]
fn wrong_chunk_tag_is_rejected() {
    let mut buffer = encode_with(&tetrahedron(), CompressionMethod::Raw);
    buffer[HEADER_LEN] = b'Z'; // clobber the INDX tag
    assert!(matches!(
        decode(&mut &buffer[..]),
        Err(decode::Err::BadChunkTag { .. })
    ));
}

#[test]
fn corrupt_index_stream_fails_mesh_validation() {
    // RAW indices start right after the INDX tag; point one out of range
    let mut buffer = encode_with(&tetrahedron(), CompressionMethod::Raw);
    let first_index_at = HEADER_LEN + 4;
    buffer[first_index_at..first_index_at + 4].copy_from_slice(&99u32.to_le_bytes());
    assert!(matches!(
        decode(&mut &buffer[..]),
        Err(decode::Err::InvalidMesh(_))
    ));
}

#[test]
fn comment_roundtrips_unicode() {
    let mut mesh = tetrahedron();
    mesh.comment = Some("héllo – 世界".to_owned());
    let decoded = roundtrip(&mesh, CompressionMethod::Raw);
    assert_eq!(decoded.comment.as_deref(), Some("héllo – 世界"));
}
