//! MG1 body: lossless. Triangles are canonicalized and delta-coded, every
//! per-vertex stream is laid out column-major, byte-plane transposed, and
//! packed through the LZMA stage.

use super::Err;
use crate::core::bit_coder::{write_string, write_tag, ByteWriter};
use crate::core::mesh::Mesh;
use crate::shared::reorder::{apply_permutation, delta_encode_indices, reorder};
use crate::shared::transpose::{f32_columns, interleave};
use crate::shared::{
    lzma, TAG_ATTRIBS, TAG_INDICES, TAG_MG1, TAG_NORMALS, TAG_TEX_COORDS, TAG_VERTICES,
};

pub(crate) fn encode_body<W: ByteWriter>(mesh: &Mesh, writer: &mut W) -> Result<(), Err> {
    let mut indices = mesh.indices.clone();
    let permutation = reorder(&mut indices, mesh.vertex_count());

    write_tag(writer, TAG_MG1)?;
    writer.write_u32(mesh.vertex_count() as u32)?;
    writer.write_u32(mesh.triangle_count() as u32)?;
    writer.write_u32(mesh.tex_maps.len() as u32)?;
    writer.write_u32(mesh.attrib_maps.len() as u32)?;
    writer.write_u32(super::header_flags(mesh))?;

    write_tag(writer, TAG_INDICES)?;
    lzma::pack(writer, &delta_encode_indices(&indices))?;

    write_tag(writer, TAG_VERTICES)?;
    pack_floats(writer, &apply_permutation(&mesh.vertices, &permutation))?;

    if let Some(normals) = &mesh.normals {
        write_tag(writer, TAG_NORMALS)?;
        pack_floats(writer, &apply_permutation(normals, &permutation))?;
    }

    for map in &mesh.tex_maps {
        write_tag(writer, TAG_TEX_COORDS)?;
        write_string(writer, &map.name)?;
        write_string(writer, map.file_name.as_deref().unwrap_or(""))?;
        writer.write_f32(map.precision)?;
        pack_floats(writer, &apply_permutation(&map.coords, &permutation))?;
    }

    for map in &mesh.attrib_maps {
        write_tag(writer, TAG_ATTRIBS)?;
        write_string(writer, &map.name)?;
        writer.write_f32(map.precision)?;
        pack_floats(writer, &apply_permutation(&map.values, &permutation))?;
    }
    Ok(())
}

fn pack_floats<W: ByteWriter, const N: usize>(
    writer: &mut W,
    values: &[[f32; N]],
) -> Result<(), Err> {
    let columns = f32_columns(values);
    lzma::pack(writer, &interleave(&columns, 4))?;
    Ok(())
}
