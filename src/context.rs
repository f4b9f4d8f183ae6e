//! The caller-facing context: an owned value that holds one mesh slot, the
//! encoder settings, and a latched error code.
//!
//! Internally everything is `Result`-based; the latched code exists only on
//! this boundary so wire-compatible consumers keep their error model. Every
//! operation either succeeds or latches a code and returns a sentinel, and
//! only [`Context::get_error`] observes and clears the code.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::bit_coder::{ByteReader, ByteWriter, IoReader, IoWriter, ReaderErr};
use crate::core::mesh::{AttribMap, Mesh, TexMap};
use crate::shared::{
    CompressionMethod, DEFAULT_NORMAL_PRECISION, DEFAULT_VERTEX_PRECISION, MAX_MAPS,
};
use crate::{decode, encode};

/// Whether a context imports (decodes) or exports (encodes) meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Import,
    Export,
}

/// The latched error taxonomy. `InvalidContext` and `OutOfMemory` exist for
/// wire-compatible consumers; safe Rust cannot produce them.
#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    #[error("file I/O error")]
    FileError,
    #[error("unrecognized or corrupt format")]
    FormatError,
    #[error("internal error")]
    InternalError,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("invalid context")]
    InvalidContext,
    #[error("mesh violates a structural invariant")]
    InvalidMesh,
    #[error("operation not allowed in this mode or state")]
    InvalidOperation,
    #[error("LZMA stage error")]
    LzmaError,
    #[default]
    #[error("no error")]
    None,
    #[error("out of memory")]
    OutOfMemory,
}

/// Handle to a registered UV map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexMapId(pub(crate) usize);

/// Handle to a registered attribute map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttribMapId(pub(crate) usize);

/// Queryable properties for the polymorphic accessors. The typed accessors
/// on [`Context`] make wrong-type queries unrepresentable; this enum is the
/// boundary for callers that need the property-bag shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    VertexCount,
    TriangleCount,
    HasNormals,
    TexMapCount,
    AttribMapCount,
    FileComment,
    Indices,
    Vertices,
    Normals,
    TexCoords(TexMapId),
    AttribValues(AttribMapId),
    TexMapName(TexMapId),
    TexMapFileName(TexMapId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Loaded,
    Defined,
    Failed,
}

pub struct Context {
    mode: Mode,
    state: State,
    mesh: Option<Mesh>,
    method: CompressionMethod,
    vertex_precision: f32,
    normal_precision: f32,
    comment: Option<String>,
    last_error: Cell<ErrorKind>,
}

impl Context {
    pub fn new(mode: Mode) -> Self {
        Context {
            mode,
            state: State::Fresh,
            mesh: None,
            method: CompressionMethod::Mg1,
            vertex_precision: DEFAULT_VERTEX_PRECISION,
            normal_precision: DEFAULT_NORMAL_PRECISION,
            comment: None,
            last_error: Cell::new(ErrorKind::None),
        }
    }

    /// Returns the latched error code and resets it to `None`.
    pub fn get_error(&self) -> ErrorKind {
        self.last_error.replace(ErrorKind::None)
    }

    /// The decoded or defined mesh, if any.
    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    // ---- typed queries ----------------------------------------------------

    pub fn vertex_count(&self) -> u32 {
        self.mesh.as_ref().map_or(0, |m| m.vertex_count() as u32)
    }

    pub fn triangle_count(&self) -> u32 {
        self.mesh.as_ref().map_or(0, |m| m.triangle_count() as u32)
    }

    pub fn has_normals(&self) -> bool {
        self.mesh.as_ref().is_some_and(|m| m.has_normals())
    }

    pub fn tex_map_count(&self) -> u32 {
        self.mesh.as_ref().map_or(0, |m| m.tex_maps.len() as u32)
    }

    pub fn attrib_map_count(&self) -> u32 {
        self.mesh.as_ref().map_or(0, |m| m.attrib_maps.len() as u32)
    }

    /// Flat `x y z` view of the vertex positions. Valid until the next
    /// mutating call; copy to retain.
    pub fn vertices(&self) -> Option<&[f32]> {
        self.mesh.as_ref().map(|m| bytemuck::cast_slice(&m.vertices[..]))
    }

    /// Flat view of the triangle indices, three per triangle.
    pub fn indices(&self) -> Option<&[u32]> {
        self.mesh.as_ref().map(|m| bytemuck::cast_slice(&m.indices[..]))
    }

    pub fn normals(&self) -> Option<&[f32]> {
        self.mesh
            .as_ref()
            .and_then(|m| m.normals.as_ref())
            .map(|n| bytemuck::cast_slice(&n[..]))
    }

    pub fn file_comment(&self) -> Option<&str> {
        match self.mode {
            Mode::Import => self.mesh.as_ref().and_then(|m| m.comment.as_deref()),
            Mode::Export => self.comment.as_deref(),
        }
    }

    pub fn tex_map_name(&self, id: TexMapId) -> Option<&str> {
        self.tex_map(id).map(|m| m.name.as_str())
    }

    pub fn tex_map_file_name(&self, id: TexMapId) -> Option<&str> {
        self.tex_map(id).and_then(|m| m.file_name.as_deref())
    }

    pub fn tex_map_coords(&self, id: TexMapId) -> Option<&[f32]> {
        self.tex_map(id).map(|m| bytemuck::cast_slice(&m.coords[..]))
    }

    pub fn attrib_map_name(&self, id: AttribMapId) -> Option<&str> {
        self.attrib_map(id).map(|m| m.name.as_str())
    }

    pub fn attrib_map_values(&self, id: AttribMapId) -> Option<&[f32]> {
        self.attrib_map(id)
            .map(|m| bytemuck::cast_slice(&m.values[..]))
    }

    pub fn get_named_tex_map(&self, name: &str) -> Option<TexMapId> {
        self.mesh
            .as_ref()
            .and_then(|m| m.find_tex_map(name))
            .map(TexMapId)
    }

    pub fn get_named_attrib_map(&self, name: &str) -> Option<AttribMapId> {
        self.mesh
            .as_ref()
            .and_then(|m| m.find_attrib_map(name))
            .map(AttribMapId)
    }

    // ---- polymorphic queries ----------------------------------------------

    /// Integer property query. A property that is not an integer latches
    /// `InvalidArgument` and returns zero.
    pub fn get_integer(&self, property: Property) -> u32 {
        match property {
            Property::VertexCount => self.vertex_count(),
            Property::TriangleCount => self.triangle_count(),
            Property::HasNormals => self.has_normals() as u32,
            Property::TexMapCount => self.tex_map_count(),
            Property::AttribMapCount => self.attrib_map_count(),
            _ => {
                self.latch(ErrorKind::InvalidArgument);
                0
            }
        }
    }

    /// Integer-array property query; `None` plus a latched `InvalidArgument`
    /// for properties of any other type.
    pub fn get_integer_array(&self, property: Property) -> Option<&[u32]> {
        match property {
            Property::Indices => self.indices(),
            _ => {
                self.latch(ErrorKind::InvalidArgument);
                None
            }
        }
    }

    /// Float-array property query; `None` plus a latched `InvalidArgument`
    /// for properties of any other type or an unknown map id.
    pub fn get_float_array(&self, property: Property) -> Option<&[f32]> {
        let result = match property {
            Property::Vertices => self.vertices(),
            Property::Normals => self.normals(),
            Property::TexCoords(id) => self.tex_map_coords(id),
            Property::AttribValues(id) => self.attrib_map_values(id),
            _ => {
                self.latch(ErrorKind::InvalidArgument);
                return None;
            }
        };
        if result.is_none() {
            self.latch(ErrorKind::InvalidArgument);
        }
        result
    }

    pub fn get_string(&self, property: Property) -> Option<&str> {
        match property {
            Property::FileComment => self.file_comment(),
            Property::TexMapName(id) => self.tex_map_name(id),
            Property::TexMapFileName(id) => self.tex_map_file_name(id),
            _ => {
                self.latch(ErrorKind::InvalidArgument);
                None
            }
        }
    }

    // ---- export-side configuration ----------------------------------------

    pub fn set_compression_method(&mut self, method: CompressionMethod) {
        if !self.exporting() {
            return;
        }
        self.method = method;
    }

    pub fn set_vertex_precision(&mut self, precision: f32) {
        if !self.exporting() || !self.check_precision(precision) {
            return;
        }
        self.vertex_precision = precision;
    }

    /// Derives the absolute vertex precision as `factor` times the mean edge
    /// length; the mesh must already be defined.
    pub fn set_vertex_precision_rel(&mut self, factor: f32) {
        if !self.exporting() || !self.check_precision(factor) {
            return;
        }
        match &self.mesh {
            Some(mesh) => {
                let precision = factor * mesh.mean_edge_length();
                if self.check_precision(precision) {
                    self.vertex_precision = precision;
                }
            }
            None => self.misuse(),
        }
    }

    pub fn set_normal_precision(&mut self, precision: f32) {
        if !self.exporting() || !self.check_precision(precision) {
            return;
        }
        self.normal_precision = precision;
    }

    pub fn set_tex_coord_precision(&mut self, id: TexMapId, precision: f32) {
        if !self.exporting() || !self.check_precision(precision) {
            return;
        }
        match self.mesh.as_mut().and_then(|m| m.tex_maps.get_mut(id.0)) {
            Some(map) => map.precision = precision,
            None => self.latch(ErrorKind::InvalidArgument),
        }
    }

    pub fn set_attrib_precision(&mut self, id: AttribMapId, precision: f32) {
        if !self.exporting() || !self.check_precision(precision) {
            return;
        }
        match self.mesh.as_mut().and_then(|m| m.attrib_maps.get_mut(id.0)) {
            Some(map) => map.precision = precision,
            None => self.latch(ErrorKind::InvalidArgument),
        }
    }

    pub fn set_file_comment(&mut self, comment: &str) {
        if !self.exporting() {
            return;
        }
        let comment = if comment.is_empty() {
            None
        } else {
            Some(comment.to_owned())
        };
        if let Some(mesh) = &mut self.mesh {
            mesh.comment = comment.clone();
        }
        self.comment = comment;
    }

    // ---- export-side definition -------------------------------------------

    /// Defines the mesh to export. `vertices` holds three floats per vertex,
    /// `indices` three values per triangle, `normals` three floats per
    /// vertex when present. The data is copied; previously registered maps
    /// are dropped.
    pub fn define_mesh(&mut self, vertices: &[f32], indices: &[u32], normals: Option<&[f32]>) {
        if !self.exporting() {
            return;
        }
        if vertices.len() % 3 != 0
            || indices.len() % 3 != 0
            || normals.is_some_and(|n| n.len() % 3 != 0)
        {
            self.latch(ErrorKind::InvalidArgument);
            return;
        }
        let mut mesh = Mesh::new(
            triples(vertices),
            triples(indices),
            normals.map(triples),
        );
        mesh.comment = self.comment.clone();
        if let Err(err) = mesh.validate() {
            tracing::debug!(%err, "rejecting mesh definition");
            self.latch(ErrorKind::InvalidMesh);
            return;
        }
        self.mesh = Some(mesh);
        self.state = State::Defined;
    }

    /// Registers a UV map over the defined mesh: two floats per vertex, a
    /// unique non-empty name, and an optional texture file reference.
    pub fn add_tex_map(
        &mut self,
        coords: &[f32],
        name: &str,
        file_name: Option<&str>,
    ) -> Option<TexMapId> {
        if !self.exporting() {
            return None;
        }
        if self.state != State::Defined {
            self.misuse();
            return None;
        }
        let Some(mesh) = self.mesh.as_mut() else {
            self.latch(ErrorKind::InternalError);
            self.fail();
            return None;
        };
        if coords.len() != mesh.vertex_count() * 2
            || mesh.tex_maps.len() >= MAX_MAPS
            || !valid_new_name(name, mesh.tex_maps.iter().map(|m| m.name.as_str()))
        {
            self.latch(ErrorKind::InvalidArgument);
            return None;
        }
        let map = TexMap::new(name, file_name.map(str::to_owned), pairs(coords));
        mesh.tex_maps.push(map);
        Some(TexMapId(mesh.tex_maps.len() - 1))
    }

    /// Registers a four-channel attribute map over the defined mesh.
    pub fn add_attrib_map(&mut self, values: &[f32], name: &str) -> Option<AttribMapId> {
        if !self.exporting() {
            return None;
        }
        if self.state != State::Defined {
            self.misuse();
            return None;
        }
        let Some(mesh) = self.mesh.as_mut() else {
            self.latch(ErrorKind::InternalError);
            self.fail();
            return None;
        };
        if values.len() != mesh.vertex_count() * 4
            || mesh.attrib_maps.len() >= MAX_MAPS
            || !valid_new_name(name, mesh.attrib_maps.iter().map(|m| m.name.as_str()))
        {
            self.latch(ErrorKind::InvalidArgument);
            return None;
        }
        let map = AttribMap::new(name, quads(values));
        mesh.attrib_maps.push(map);
        Some(AttribMapId(mesh.attrib_maps.len() - 1))
    }

    // ---- load / save ------------------------------------------------------

    pub fn load(&mut self, path: impl AsRef<Path>) {
        if !self.importing() {
            return;
        }
        let file = match File::open(path) {
            Ok(file) => file,
            Err(_) => {
                self.latch(ErrorKind::FileError);
                self.fail();
                return;
            }
        };
        let mut reader = IoReader::new(BufReader::new(file));
        self.run_load(&mut reader);
    }

    /// Loads from any byte source; wrap a read callback in
    /// [`FunctionalByteReader`](crate::core::bit_coder::FunctionalByteReader)
    /// to inject custom streams.
    pub fn load_custom<R: ByteReader>(&mut self, reader: &mut R) {
        if !self.importing() {
            return;
        }
        self.run_load(reader);
    }

    pub fn save(&mut self, path: impl AsRef<Path>) {
        if !self.ready_to_save() {
            return;
        }
        let file = match File::create(path) {
            Ok(file) => file,
            Err(_) => {
                self.latch(ErrorKind::FileError);
                self.fail();
                return;
            }
        };
        let mut writer = IoWriter::new(BufWriter::new(file));
        self.run_save(&mut writer);
        if writer.into_inner().flush().is_err() {
            self.latch(ErrorKind::FileError);
            self.fail();
        }
    }

    /// Saves into any byte sink; wrap a write callback in
    /// [`FunctionalByteWriter`](crate::core::bit_coder::FunctionalByteWriter)
    /// to inject custom streams.
    pub fn save_custom<W: ByteWriter>(&mut self, writer: &mut W) {
        if !self.ready_to_save() {
            return;
        }
        self.run_save(writer);
    }

    // ---- internals --------------------------------------------------------

    fn run_load<R: ByteReader>(&mut self, reader: &mut R) {
        self.mesh = None;
        match decode::decode(reader) {
            Ok(mesh) => {
                self.mesh = Some(mesh);
                self.state = State::Loaded;
            }
            Err(err) => {
                tracing::debug!(%err, "load failed");
                self.latch(decode_error_kind(&err));
                self.fail();
            }
        }
    }

    fn run_save<W: ByteWriter>(&mut self, writer: &mut W) {
        let cfg = encode::Config {
            method: self.method,
            vertex_precision: self.vertex_precision,
            normal_precision: self.normal_precision,
        };
        let Some(mesh) = self.mesh.as_ref() else {
            self.latch(ErrorKind::InternalError);
            self.fail();
            return;
        };
        if let Err(err) = encode::encode(mesh, writer, cfg) {
            tracing::debug!(%err, "save failed");
            self.latch(encode_error_kind(&err));
            self.fail();
        }
    }

    /// A failed context answers `get_error` and nothing else.
    fn failed(&self) -> bool {
        self.state == State::Failed
    }

    fn importing(&mut self) -> bool {
        if self.failed() {
            return false;
        }
        if self.mode != Mode::Import {
            self.misuse();
            return false;
        }
        true
    }

    fn exporting(&mut self) -> bool {
        if self.failed() {
            return false;
        }
        if self.mode != Mode::Export {
            self.misuse();
            return false;
        }
        true
    }

    fn ready_to_save(&mut self) -> bool {
        if !self.exporting() {
            return false;
        }
        if self.state != State::Defined {
            self.misuse();
            return false;
        }
        true
    }

    fn check_precision(&self, precision: f32) -> bool {
        if precision.is_finite() && precision > 0.0 {
            true
        } else {
            self.latch(ErrorKind::InvalidArgument);
            false
        }
    }

    fn latch(&self, kind: ErrorKind) {
        if !self.failed() {
            self.last_error.set(kind);
        }
    }

    fn misuse(&mut self) {
        self.last_error.set(ErrorKind::InvalidOperation);
        self.fail();
    }

    fn fail(&mut self) {
        self.state = State::Failed;
    }
}

fn triples<T: Copy>(flat: &[T]) -> Vec<[T; 3]> {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn pairs(flat: &[f32]) -> Vec<[f32; 2]> {
    flat.chunks_exact(2).map(|c| [c[0], c[1]]).collect()
}

fn quads(flat: &[f32]) -> Vec<[f32; 4]> {
    flat.chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect()
}

fn valid_new_name<'a>(name: &str, mut existing: impl Iterator<Item = &'a str>) -> bool {
    !name.is_empty()
        && name.len() <= crate::core::mesh::MAX_NAME_LEN
        && !existing.any(|n| n == name)
}

fn decode_error_kind(err: &decode::Err) -> ErrorKind {
    match err {
        decode::Err::Io(ReaderErr::NotEnoughData) => ErrorKind::FileError,
        decode::Err::Io(ReaderErr::InvalidUtf8) => ErrorKind::FormatError,
        decode::Err::BadMagic
        | decode::Err::BadHeader(_)
        | decode::Err::BadChunkTag { .. }
        | decode::Err::BadPayload(_)
        | decode::Err::UnsupportedMethod(_)
        | decode::Err::UnsupportedVersion(_) => ErrorKind::FormatError,
        decode::Err::Lzma(_) => ErrorKind::LzmaError,
        decode::Err::InvalidMesh(_) => ErrorKind::InvalidMesh,
    }
}

fn encode_error_kind(err: &encode::Err) -> ErrorKind {
    match err {
        encode::Err::Io(_) => ErrorKind::FileError,
        encode::Err::Lzma(_) => ErrorKind::LzmaError,
        encode::Err::InvalidMesh(_) | encode::Err::TooLarge => ErrorKind::InvalidMesh,
        encode::Err::GridOverflow => ErrorKind::InvalidArgument,
    }
}

impl Context {
    fn tex_map(&self, id: TexMapId) -> Option<&TexMap> {
        self.mesh.as_ref().and_then(|m| m.tex_maps.get(id.0))
    }

    fn attrib_map(&self, id: AttribMapId) -> Option<&AttribMap> {
        self.mesh.as_ref().and_then(|m| m.attrib_maps.get(id.0))
    }
}
