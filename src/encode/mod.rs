pub(crate) mod mg1;
pub(crate) mod mg2;
pub(crate) mod raw;

use crate::core::bit_coder::{write_string, ByteWriter, WriterErr};
use crate::core::mesh::{self, Mesh};
use crate::shared::lzma;
use crate::shared::{
    CompressionMethod, ConfigType, DEFAULT_NORMAL_PRECISION, DEFAULT_VERTEX_PRECISION,
    FILE_MAGIC, FLAG_HAS_NORMALS, FORMAT_VERSION, MAX_INDEX_COUNT, MAX_VERTEX_COUNT,
};

/// Encoder settings. Per-map precisions live on the maps themselves.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub method: CompressionMethod,
    /// Fixed-point vertex step, MG2 only.
    pub vertex_precision: f32,
    /// Fixed-point step for the spherical normal components, MG2 only.
    pub normal_precision: f32,
}

impl ConfigType for Config {
    fn default() -> Self {
        Config {
            method: CompressionMethod::Mg1,
            vertex_precision: DEFAULT_VERTEX_PRECISION,
            normal_precision: DEFAULT_NORMAL_PRECISION,
        }
    }
}

#[remain::sorted]
#[derive(thiserror::Error, Debug)]
pub enum Err {
    #[error("vertex precision is too fine for the mesh extents")]
    GridOverflow,
    #[error(transparent)]
    InvalidMesh(#[from] mesh::Err),
    #[error(transparent)]
    Io(#[from] WriterErr),
    #[error("LZMA stage failed: {0}")]
    Lzma(String),
    #[error("mesh exceeds the container limits")]
    TooLarge,
}

impl From<lzma::Err> for Err {
    fn from(err: lzma::Err) -> Self {
        match err {
            lzma::Err::Writer(w) => Err::Io(w),
            other => Err::Lzma(other.to_string()),
        }
    }
}

/// Encodes a mesh into the writer: container header first, then the body of
/// the configured method. The mesh is validated up front and borrowed for
/// the duration of the call.
pub fn encode<W: ByteWriter>(mesh: &Mesh, writer: &mut W, cfg: Config) -> Result<(), Err> {
    mesh.validate()?;
    if !(cfg.vertex_precision.is_finite() && cfg.vertex_precision > 0.0)
        || !(cfg.normal_precision.is_finite() && cfg.normal_precision > 0.0)
    {
        return Err(Err::InvalidMesh(mesh::Err::InvalidPrecision));
    }

    let vertex_count = mesh.vertex_count();
    let triangle_count = mesh.triangle_count();
    if vertex_count > MAX_VERTEX_COUNT as usize
        || triangle_count > MAX_INDEX_COUNT as usize / 3
    {
        return Err(Err::TooLarge);
    }

    tracing::debug!(
        method = ?cfg.method,
        vertex_count,
        triangle_count,
        uv_maps = mesh.tex_maps.len(),
        attrib_maps = mesh.attrib_maps.len(),
        "encoding mesh"
    );

    writer.write_bytes(&FILE_MAGIC)?;
    writer.write_u32(FORMAT_VERSION)?;
    writer.write_u32(cfg.method.wire_id())?;
    writer.write_u32(vertex_count as u32)?;
    writer.write_u32(triangle_count as u32)?;
    writer.write_u32(mesh.tex_maps.len() as u32)?;
    writer.write_u32(mesh.attrib_maps.len() as u32)?;
    writer.write_u32(header_flags(mesh))?;
    write_string(writer, mesh.comment.as_deref().unwrap_or(""))?;

    match cfg.method {
        CompressionMethod::Raw => raw::encode_body(mesh, writer)?,
        CompressionMethod::Mg1 => mg1::encode_body(mesh, writer)?,
        CompressionMethod::Mg2 => mg2::encode_body(mesh, writer, cfg)?,
    }
    Ok(())
}

pub(crate) fn header_flags(mesh: &Mesh) -> u32 {
    if mesh.has_normals() {
        FLAG_HAS_NORMALS
    } else {
        0
    }
}
