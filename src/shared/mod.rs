pub(crate) mod grid;
pub(crate) mod lzma;
pub(crate) mod normal_coder;
pub(crate) mod quantize;
pub(crate) mod reorder;
pub(crate) mod transpose;

/// Container magic, first four bytes of every file.
pub const FILE_MAGIC: [u8; 4] = *b"OCTM";

/// Container format version accepted by this implementation.
pub const FORMAT_VERSION: u32 = 4;

/// Body tags.
pub(crate) const TAG_MG1: [u8; 4] = *b"MG1\0";
pub(crate) const TAG_MG2: [u8; 4] = *b"MG2\0";

/// Chunk tags.
pub(crate) const TAG_INDICES: [u8; 4] = *b"INDX";
pub(crate) const TAG_VERTICES: [u8; 4] = *b"VERT";
pub(crate) const TAG_NORMALS: [u8; 4] = *b"NORM";
pub(crate) const TAG_GRID_INDICES: [u8; 4] = *b"GIDX";
pub(crate) const TAG_TEX_COORDS: [u8; 4] = *b"TEXC";
pub(crate) const TAG_ATTRIBS: [u8; 4] = *b"ATTR";

/// Header flag bit set when the mesh carries per-vertex normals.
pub(crate) const FLAG_HAS_NORMALS: u32 = 1 << 0;

/// Upper bound on registered UV or attribute maps.
pub const MAX_MAPS: usize = 8;

/// Sanity limits enforced by the container framing.
pub(crate) const MAX_VERTEX_COUNT: u32 = i32::MAX as u32;
pub(crate) const MAX_INDEX_COUNT: u32 = i32::MAX as u32;

/// Default fixed-point precisions.
pub const DEFAULT_VERTEX_PRECISION: f32 = 1.0 / 1024.0; // 2^-10
pub const DEFAULT_NORMAL_PRECISION: f32 = 1.0 / 256.0; // 2^-8
pub const DEFAULT_TEX_COORD_PRECISION: f32 = 1.0 / 4096.0; // 2^-12
pub const DEFAULT_ATTRIB_PRECISION: f32 = 1.0 / 256.0; // 2^-8

/// Body encoding selected for `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Verbatim little-endian serialization.
    Raw,
    /// Lossless: reorder + delta + LZMA.
    Mg1,
    /// Lossy fixed-point with spatial sorting.
    Mg2,
}

impl CompressionMethod {
    pub(crate) fn wire_id(self) -> u32 {
        match self {
            CompressionMethod::Raw => 0x0201,
            CompressionMethod::Mg1 => 0x0202,
            CompressionMethod::Mg2 => 0x0203,
        }
    }

    pub(crate) fn from_wire_id(id: u32) -> Option<Self> {
        match id {
            0x0201 => Some(CompressionMethod::Raw),
            0x0202 => Some(CompressionMethod::Mg1),
            0x0203 => Some(CompressionMethod::Mg2),
            _ => None,
        }
    }
}

/// Config structs implement this instead of [`std::default::Default`] so the
/// defaults stay explicit at call sites.
pub trait ConfigType {
    fn default() -> Self;
}
