//! MG2 body decoder. Positions come back as grid steps from the bounding
//! box minimum; normals are rebuilt from the same smooth predictor the
//! encoder used, which is why indices and positions decode first.

use super::{expect_tag, mg1::check_body_header, optional, Err, Header};
use crate::core::bit_coder::{read_string, ByteReader};
use crate::core::mesh::{self, AttribMap, Mesh, TexMap};
use crate::shared::grid::{decode_coordinate_deltas, dequantize_positions};
use crate::shared::normal_coder::{decode_normals, smooth_normals};
use crate::shared::quantize::decode_channel_deltas;
use crate::shared::reorder::delta_decode_indices;
use crate::shared::transpose::deinterleave;
use crate::shared::{
    lzma, TAG_ATTRIBS, TAG_GRID_INDICES, TAG_INDICES, TAG_MG2, TAG_NORMALS, TAG_TEX_COORDS,
    TAG_VERTICES,
};

pub(crate) fn decode_body<R: ByteReader>(reader: &mut R, header: &Header) -> Result<Mesh, Err> {
    check_body_header(reader, header, TAG_MG2)?;

    let vertex_precision = reader.read_f32()?;
    let normal_precision = reader.read_f32()?;
    if !(vertex_precision.is_finite() && vertex_precision > 0.0)
        || !(normal_precision.is_finite() && normal_precision > 0.0)
    {
        return Err(Err::BadHeader("precision fields must be finite and positive"));
    }
    let mut bbox_min = [0f32; 3];
    for axis in 0..3 {
        bbox_min[axis] = reader.read_f32()?;
    }
    // bbox max is informational; positions rebuild from the minimum alone
    for _ in 0..3 {
        reader.read_f32()?;
    }
    let mut divisions = [0u32; 3];
    for axis in 0..3 {
        divisions[axis] = reader.read_u32()?;
        if divisions[axis] == 0 {
            return Err(Err::BadHeader("grid divisions must be at least 1"));
        }
    }

    expect_tag(reader, TAG_INDICES)?;
    let index_bytes = lzma::unpack(reader)?;
    let indices = delta_decode_indices(&index_bytes, header.triangle_count)
        .map_err(|_| Err::BadPayload("index chunk has the wrong size"))?;
    // The predictor walks the triangle list before full validation runs, so
    // index range must hold here already.
    for (t, tri) in indices.iter().enumerate() {
        for &corner in tri {
            if corner as usize >= header.vertex_count {
                return Err(Err::InvalidMesh(mesh::Err::IndexOutOfRange {
                    triangle: t,
                    index: corner,
                    vertex_count: header.vertex_count,
                }));
            }
        }
    }

    expect_tag(reader, TAG_GRID_INDICES)?;
    let cell_bytes = deinterleave(&lzma::unpack(reader)?, 4);
    if cell_bytes.len() != header.vertex_count * 4 {
        return Err(Err::BadPayload("grid index chunk has the wrong size"));
    }
    let cells: Vec<u32> = cell_bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes(b.try_into().unwrap()))
        .collect();

    expect_tag(reader, TAG_VERTICES)?;
    let coordinate_bytes = deinterleave(&lzma::unpack(reader)?, 4);
    let quantized = decode_coordinate_deltas(&coordinate_bytes, &cells)
        .ok_or(Err::BadPayload("vertex chunk has the wrong size"))?;
    let vertices = dequantize_positions(&quantized, bbox_min, vertex_precision);

    let normals = if header.has_normals() {
        expect_tag(reader, TAG_NORMALS)?;
        let residual_bytes = deinterleave(&lzma::unpack(reader)?, 4);
        let predicted = smooth_normals(&vertices, &indices);
        Some(
            decode_normals(&residual_bytes, &predicted, normal_precision)
                .ok_or(Err::BadPayload("normal chunk has the wrong size"))?,
        )
    } else {
        None
    };

    let mut mesh = Mesh::new(vertices, indices, normals);
    for _ in 0..header.uv_map_count {
        expect_tag(reader, TAG_TEX_COORDS)?;
        let name = read_string(reader)?;
        let file_name = optional(read_string(reader)?);
        let precision = reader.read_f32()?;
        let delta_bytes = deinterleave(&lzma::unpack(reader)?, 4);
        let coords = decode_channel_deltas::<2>(&delta_bytes, header.vertex_count, precision)
            .ok_or(Err::BadPayload("texture coordinate chunk has the wrong size"))?;
        let mut map = TexMap::new(name, file_name, coords);
        map.precision = precision;
        mesh.tex_maps.push(map);
    }
    for _ in 0..header.attrib_map_count {
        expect_tag(reader, TAG_ATTRIBS)?;
        let name = read_string(reader)?;
        let precision = reader.read_f32()?;
        let delta_bytes = deinterleave(&lzma::unpack(reader)?, 4);
        let values = decode_channel_deltas::<4>(&delta_bytes, header.vertex_count, precision)
            .ok_or(Err::BadPayload("attribute chunk has the wrong size"))?;
        let mut map = AttribMap::new(name, values);
        map.precision = precision;
        mesh.attrib_maps.push(map);
    }
    Ok(mesh)
}
