//! Single-shot LZMA stage.
//!
//! A packed blob is framed as `uncompressed_size: u32 | packed_size: u32 |
//! props: [u8; 5] | payload`, where `props` is the standard 5-byte LZMA
//! properties header and `payload` is the raw LZMA stream body. The stage
//! never interprets the bytes it is given.

use lzma_rs::compress::{Options as CompressOptions, UnpackedSize};

use crate::core::bit_coder::{ByteReader, ByteWriter, ReaderErr, WriterErr};

/// Length of the LZMA properties header carried on the wire.
const PROPS_LEN: usize = 5;

/// Length of the `props + u64 size` header that `lzma_rs` frames its
/// streams with; the u64 size is replaced by our explicit u32 fields.
const LZMA_HEADER_LEN: usize = PROPS_LEN + 8;

#[remain::sorted]
#[derive(thiserror::Error, Debug)]
pub(crate) enum Err {
    #[error("LZMA stage failed: {0}")]
    Codec(String),
    #[error("packed chunk is truncated")]
    Reader(#[from] ReaderErr),
    #[error("decompressed size does not match the chunk header")]
    SizeMismatch,
    #[error(transparent)]
    Writer(#[from] WriterErr),
}

/// Compresses `data` and writes the framed blob.
pub(crate) fn pack<W: ByteWriter>(writer: &mut W, data: &[u8]) -> Result<(), Err> {
    let options = CompressOptions {
        unpacked_size: UnpackedSize::WriteToHeader(Some(data.len() as u64)),
    };
    let mut compressed = Vec::new();
    lzma_rs::lzma_compress_with_options(&mut &data[..], &mut compressed, &options)
        .map_err(|e| Err::Codec(e.to_string()))?;
    if compressed.len() < LZMA_HEADER_LEN {
        return Err(Err::Codec("compressor produced a truncated stream".into()));
    }
    let payload = &compressed[LZMA_HEADER_LEN..];

    writer.write_u32(data.len() as u32)?;
    writer.write_u32(payload.len() as u32)?;
    writer.write_bytes(&compressed[..PROPS_LEN])?;
    writer.write_bytes(payload)?;
    tracing::trace!(
        uncompressed = data.len(),
        packed = payload.len(),
        "packed chunk"
    );
    Ok(())
}

/// Reads a framed blob and returns exactly `uncompressed_size` bytes.
pub(crate) fn unpack<R: ByteReader>(reader: &mut R) -> Result<Vec<u8>, Err> {
    let uncompressed_size = reader.read_u32()? as usize;
    let packed_size = reader.read_u32()? as usize;
    let mut stream = vec![0u8; LZMA_HEADER_LEN + packed_size];
    reader.read_bytes(&mut stream[..PROPS_LEN])?;
    stream[PROPS_LEN..LZMA_HEADER_LEN].copy_from_slice(&(uncompressed_size as u64).to_le_bytes());
    reader.read_bytes(&mut stream[LZMA_HEADER_LEN..])?;

    // cap the eager reservation so a corrupt size field cannot force a
    // huge allocation before decompression fails
    let mut out = Vec::with_capacity(uncompressed_size.min(1 << 24));
    lzma_rs::lzma_decompress(&mut &stream[..], &mut out)
        .map_err(|e| Err::Codec(format!("{e:?}")))?;
    if out.len() != uncompressed_size {
        return Err(Err::SizeMismatch);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let data: Vec<u8> = (0..1024u32).flat_map(|i| (i % 7).to_le_bytes()).collect();
        let mut blob = Vec::new();
        pack(&mut blob, &data).unwrap();

        let mut reader = &blob[..];
        let out = unpack(&mut reader).unwrap();
        assert_eq!(out, data);
        assert!(reader.is_empty());
    }

    #[test]
    fn frame_header_fields() {
        let data = [7u8; 64];
        let mut blob = Vec::new();
        pack(&mut blob, &data).unwrap();

        let uncompressed = u32::from_le_bytes(blob[0..4].try_into().unwrap());
        let packed = u32::from_le_bytes(blob[4..8].try_into().unwrap());
        assert_eq!(uncompressed, 64);
        assert_eq!(blob.len(), 8 + PROPS_LEN + packed as usize);
    }

    #[test]
    fn empty_payload() {
        let mut blob = Vec::new();
        pack(&mut blob, &[]).unwrap();
        let out = unpack(&mut &blob[..]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_blob_is_an_error() {
        let mut blob = Vec::new();
        pack(&mut blob, &[1, 2, 3, 4]).unwrap();
        blob.truncate(blob.len() - 1);
        assert!(unpack(&mut &blob[..]).is_err());
    }
}
