//! RAW body: tagged chunks of verbatim little-endian data, no compression.

use crate::core::bit_coder::{write_string, write_tag, ByteWriter, WriterErr};
use crate::core::mesh::Mesh;
use crate::shared::{TAG_ATTRIBS, TAG_INDICES, TAG_NORMALS, TAG_TEX_COORDS, TAG_VERTICES};

pub(crate) fn encode_body<W: ByteWriter>(mesh: &Mesh, writer: &mut W) -> Result<(), WriterErr> {
    write_tag(writer, TAG_INDICES)?;
    for tri in &mesh.indices {
        for &index in tri {
            writer.write_u32(index)?;
        }
    }

    write_tag(writer, TAG_VERTICES)?;
    write_interleaved(writer, &mesh.vertices)?;

    if let Some(normals) = &mesh.normals {
        write_tag(writer, TAG_NORMALS)?;
        write_interleaved(writer, normals)?;
    }

    for map in &mesh.tex_maps {
        write_tag(writer, TAG_TEX_COORDS)?;
        write_string(writer, &map.name)?;
        write_string(writer, map.file_name.as_deref().unwrap_or(""))?;
        writer.write_f32(map.precision)?;
        write_interleaved(writer, &map.coords)?;
    }

    for map in &mesh.attrib_maps {
        write_tag(writer, TAG_ATTRIBS)?;
        write_string(writer, &map.name)?;
        writer.write_f32(map.precision)?;
        write_interleaved(writer, &map.values)?;
    }
    Ok(())
}

fn write_interleaved<W: ByteWriter, const N: usize>(
    writer: &mut W,
    values: &[[f32; N]],
) -> Result<(), WriterErr> {
    for value in values {
        for &component in value {
            writer.write_f32(component)?;
        }
    }
    Ok(())
}
