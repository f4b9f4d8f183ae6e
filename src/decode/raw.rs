//! RAW body decoder: tagged chunks of verbatim little-endian data.

use super::{expect_tag, optional, Err, Header};
use crate::core::bit_coder::{read_string, ByteReader};
use crate::core::mesh::{AttribMap, Mesh, TexMap};
use crate::shared::{TAG_ATTRIBS, TAG_INDICES, TAG_NORMALS, TAG_TEX_COORDS, TAG_VERTICES};

pub(crate) fn decode_body<R: ByteReader>(reader: &mut R, header: &Header) -> Result<Mesh, Err> {
    expect_tag(reader, TAG_INDICES)?;
    let mut indices = Vec::with_capacity(header.triangle_count);
    for _ in 0..header.triangle_count {
        indices.push([reader.read_u32()?, reader.read_u32()?, reader.read_u32()?]);
    }

    expect_tag(reader, TAG_VERTICES)?;
    let vertices = read_interleaved::<R, 3>(reader, header.vertex_count)?;

    let normals = if header.has_normals() {
        expect_tag(reader, TAG_NORMALS)?;
        Some(read_interleaved::<R, 3>(reader, header.vertex_count)?)
    } else {
        None
    };

    let mut mesh = Mesh::new(vertices, indices, normals);
    for _ in 0..header.uv_map_count {
        expect_tag(reader, TAG_TEX_COORDS)?;
        let name = read_string(reader)?;
        let file_name = optional(read_string(reader)?);
        let precision = reader.read_f32()?;
        let coords = read_interleaved::<R, 2>(reader, header.vertex_count)?;
        let mut map = TexMap::new(name, file_name, coords);
        map.precision = precision;
        mesh.tex_maps.push(map);
    }
    for _ in 0..header.attrib_map_count {
        expect_tag(reader, TAG_ATTRIBS)?;
        let name = read_string(reader)?;
        let precision = reader.read_f32()?;
        let values = read_interleaved::<R, 4>(reader, header.vertex_count)?;
        let mut map = AttribMap::new(name, values);
        map.precision = precision;
        mesh.attrib_maps.push(map);
    }
    Ok(mesh)
}

fn read_interleaved<R: ByteReader, const N: usize>(
    reader: &mut R,
    count: usize,
) -> Result<Vec<[f32; N]>, Err> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let mut value = [0f32; N];
        for component in value.iter_mut() {
            *component = reader.read_f32()?;
        }
        out.push(value);
    }
    Ok(out)
}
