// lib.rs

//! A codec for the OpenCTM compressed triangle-mesh container (format
//! version 4) with three body encodings: RAW (verbatim), MG1 (lossless,
//! LZMA over reordered delta streams), and MG2 (lossy fixed-point with
//! spatial sorting and predictor-relative normals).
//!
//! The [`Context`](context::Context) type carries the latched-error calling
//! convention of the original API; [`encode::encode`] and [`decode::decode`]
//! are the plain `Result`-based pipelines underneath it.

/// The caller-facing context, its state machine, and the latched error
/// facade.
pub mod context;

/// The mesh model and the byte-stream layer.
pub mod core;

/// The mesh decoder.
pub mod decode;

/// The mesh encoder.
pub mod encode;

/// Compression stages and format constants shared by the encoder and the
/// decoder.
pub mod shared;

/// Contains the most commonly used traits, types, and objects.
pub mod prelude {
    pub use crate::context::{AttribMapId, Context, ErrorKind, Mode, Property, TexMapId};
    pub use crate::core::bit_coder::{
        ByteReader, ByteWriter, FunctionalByteReader, FunctionalByteWriter, IoReader, IoWriter,
    };
    pub use crate::core::mesh::{AttribMap, Mesh, TexMap};
    pub use crate::decode::{self, decode};
    pub use crate::encode::{self, encode};
    pub use crate::shared::{CompressionMethod, ConfigType};
}
