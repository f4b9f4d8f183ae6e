/// Byte-level reader/writer traits and the stream adapters built on them.
pub mod bit_coder;

/// The in-memory mesh and its map registries.
pub mod mesh;
