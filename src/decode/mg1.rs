//! MG1 body decoder.

use super::{expect_tag, optional, Err, Header};
use crate::core::bit_coder::{read_string, read_tag, ByteReader};
use crate::core::mesh::{AttribMap, Mesh, TexMap};
use crate::shared::reorder::delta_decode_indices;
use crate::shared::transpose::{deinterleave, f32_from_columns};
use crate::shared::{
    lzma, TAG_ATTRIBS, TAG_INDICES, TAG_MG1, TAG_NORMALS, TAG_TEX_COORDS, TAG_VERTICES,
};

pub(crate) fn decode_body<R: ByteReader>(reader: &mut R, header: &Header) -> Result<Mesh, Err> {
    check_body_header(reader, header, TAG_MG1)?;

    expect_tag(reader, TAG_INDICES)?;
    let index_bytes = lzma::unpack(reader)?;
    let indices = delta_decode_indices(&index_bytes, header.triangle_count)
        .map_err(|_| Err::BadPayload("index chunk has the wrong size"))?;

    expect_tag(reader, TAG_VERTICES)?;
    let vertices = unpack_floats::<R, 3>(reader, header.vertex_count)?;

    let normals = if header.has_normals() {
        expect_tag(reader, TAG_NORMALS)?;
        Some(unpack_floats::<R, 3>(reader, header.vertex_count)?)
    } else {
        None
    };

    let mut mesh = Mesh::new(vertices, indices, normals);
    for _ in 0..header.uv_map_count {
        expect_tag(reader, TAG_TEX_COORDS)?;
        let name = read_string(reader)?;
        let file_name = optional(read_string(reader)?);
        let precision = reader.read_f32()?;
        let coords = unpack_floats::<R, 2>(reader, header.vertex_count)?;
        let mut map = TexMap::new(name, file_name, coords);
        map.precision = precision;
        mesh.tex_maps.push(map);
    }
    for _ in 0..header.attrib_map_count {
        expect_tag(reader, TAG_ATTRIBS)?;
        let name = read_string(reader)?;
        let precision = reader.read_f32()?;
        let values = unpack_floats::<R, 4>(reader, header.vertex_count)?;
        let mut map = AttribMap::new(name, values);
        map.precision = precision;
        mesh.attrib_maps.push(map);
    }
    Ok(mesh)
}

/// The MG1 and MG2 bodies repeat the container counts; the two must agree.
pub(crate) fn check_body_header<R: ByteReader>(
    reader: &mut R,
    header: &Header,
    tag: [u8; 4],
) -> Result<(), Err> {
    let found = read_tag(reader)?;
    if found != tag {
        return Err(Err::BadChunkTag {
            expected: String::from_utf8_lossy(&tag).into_owned(),
            found: String::from_utf8_lossy(&found).into_owned(),
        });
    }
    let fields = [
        header.vertex_count as u32,
        header.triangle_count as u32,
        header.uv_map_count as u32,
        header.attrib_map_count as u32,
        header.flags,
    ];
    for expected in fields {
        if reader.read_u32()? != expected {
            return Err(Err::BadHeader("body header disagrees with the container"));
        }
    }
    Ok(())
}

fn unpack_floats<R: ByteReader, const N: usize>(
    reader: &mut R,
    count: usize,
) -> Result<Vec<[f32; N]>, Err> {
    let packed = lzma::unpack(reader)?;
    let columns = deinterleave(&packed, 4);
    f32_from_columns(&columns, count).ok_or(Err::BadPayload("float chunk has the wrong size"))
}
