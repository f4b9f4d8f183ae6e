pub(crate) mod mg1;
pub(crate) mod mg2;
pub(crate) mod raw;

use crate::core::bit_coder::{read_string, read_tag, ByteReader, ReaderErr};
use crate::core::mesh::{self, Mesh};
use crate::shared::lzma;
use crate::shared::{
    CompressionMethod, FILE_MAGIC, FLAG_HAS_NORMALS, FORMAT_VERSION, MAX_INDEX_COUNT,
    MAX_MAPS, MAX_VERTEX_COUNT,
};

#[remain::sorted]
#[derive(thiserror::Error, Debug)]
pub enum Err {
    #[error("expected chunk {expected:?}, found {found:?}")]
    BadChunkTag { expected: String, found: String },
    #[error("malformed header: {0}")]
    BadHeader(&'static str),
    #[error("not an OpenCTM stream")]
    BadMagic,
    #[error("malformed chunk: {0}")]
    BadPayload(&'static str),
    #[error(transparent)]
    InvalidMesh(#[from] mesh::Err),
    #[error(transparent)]
    Io(#[from] ReaderErr),
    #[error("LZMA stage failed: {0}")]
    Lzma(String),
    #[error("unknown compression method 0x{0:04x}")]
    UnsupportedMethod(u32),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
}

impl From<lzma::Err> for Err {
    fn from(err: lzma::Err) -> Self {
        match err {
            lzma::Err::Reader(r) => Err::Io(r),
            other => Err::Lzma(other.to_string()),
        }
    }
}

/// Container header fields shared with the body decoders.
#[derive(Debug, Clone)]
pub(crate) struct Header {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub uv_map_count: usize,
    pub attrib_map_count: usize,
    pub flags: u32,
}

impl Header {
    pub fn has_normals(&self) -> bool {
        self.flags & FLAG_HAS_NORMALS != 0
    }
}

/// Decodes one mesh from the reader and validates it.
pub fn decode<R: ByteReader>(reader: &mut R) -> Result<Mesh, Err> {
    if read_tag(reader)? != FILE_MAGIC {
        return Err(Err::BadMagic);
    }
    let version = reader.read_u32()?;
    if version != FORMAT_VERSION {
        return Err(Err::UnsupportedVersion(version));
    }
    let method_id = reader.read_u32()?;
    let method =
        CompressionMethod::from_wire_id(method_id).ok_or(Err::UnsupportedMethod(method_id))?;

    let vertex_count = reader.read_u32()?;
    let triangle_count = reader.read_u32()?;
    let uv_map_count = reader.read_u32()?;
    let attrib_map_count = reader.read_u32()?;
    let flags = reader.read_u32()?;
    if vertex_count > MAX_VERTEX_COUNT {
        return Err(Err::BadHeader("vertex count exceeds the container limit"));
    }
    if triangle_count > MAX_INDEX_COUNT / 3 {
        return Err(Err::BadHeader("triangle count exceeds the container limit"));
    }
    if uv_map_count as usize > MAX_MAPS || attrib_map_count as usize > MAX_MAPS {
        return Err(Err::BadHeader("too many maps"));
    }
    let comment = read_string(reader)?;

    let header = Header {
        vertex_count: vertex_count as usize,
        triangle_count: triangle_count as usize,
        uv_map_count: uv_map_count as usize,
        attrib_map_count: attrib_map_count as usize,
        flags,
    };
    tracing::debug!(
        ?method,
        vertex_count,
        triangle_count,
        uv_map_count,
        attrib_map_count,
        "decoding mesh"
    );

    let mut mesh = match method {
        CompressionMethod::Raw => raw::decode_body(reader, &header)?,
        CompressionMethod::Mg1 => mg1::decode_body(reader, &header)?,
        CompressionMethod::Mg2 => mg2::decode_body(reader, &header)?,
    };
    mesh.comment = if comment.is_empty() {
        None
    } else {
        Some(comment)
    };
    mesh.validate()?;
    Ok(mesh)
}

/// Reads a chunk tag and insists on the expected one; chunks arrive in a
/// fixed canonical order.
pub(crate) fn expect_tag<R: ByteReader>(reader: &mut R, expected: [u8; 4]) -> Result<(), Err> {
    let found = read_tag(reader)?;
    if found != expected {
        return Err(Err::BadChunkTag {
            expected: String::from_utf8_lossy(&expected).into_owned(),
            found: String::from_utf8_lossy(&found).into_owned(),
        });
    }
    Ok(())
}

/// Turns an empty wire string back into an absent value.
pub(crate) fn optional(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
