use std::io;
use std::vec;

/// Sink abstraction for the encoder. The only required method is
/// [`write_bytes`](ByteWriter::write_bytes); the sized helpers all encode
/// little-endian.
pub trait ByteWriter {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterErr>;

    fn write_u8(&mut self, value: u8) -> Result<(), WriterErr> {
        self.write_bytes(&[value])
    }

    fn write_u32(&mut self, value: u32) -> Result<(), WriterErr> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_f32(&mut self, value: f32) -> Result<(), WriterErr> {
        self.write_bytes(&value.to_le_bytes())
    }
}

impl ByteWriter for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterErr> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Source abstraction for the decoder. Reads are exact: a source that cannot
/// fill the requested buffer reports [`ReaderErr::NotEnoughData`].
pub trait ByteReader {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ReaderErr>;

    fn read_u8(&mut self) -> Result<u8, ReaderErr> {
        let mut buf = [0u8; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u32(&mut self) -> Result<u32, ReaderErr> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_f32(&mut self) -> Result<f32, ReaderErr> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }
}

impl ByteReader for vec::IntoIter<u8> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ReaderErr> {
        for slot in buf.iter_mut() {
            *slot = self.next().ok_or(ReaderErr::NotEnoughData)?;
        }
        Ok(())
    }
}

impl ByteReader for &[u8] {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ReaderErr> {
        if self.len() < buf.len() {
            return Err(ReaderErr::NotEnoughData);
        }
        let (head, tail) = self.split_at(buf.len());
        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

/// Adapter around a caller-supplied write callback. The callback returns the
/// number of bytes it accepted; a short count terminates the operation.
pub struct FunctionalByteWriter<F> {
    write_fn: F,
}

impl<F: FnMut(&[u8]) -> usize> FunctionalByteWriter<F> {
    pub fn new(write_fn: F) -> Self {
        FunctionalByteWriter { write_fn }
    }
}

impl<F: FnMut(&[u8]) -> usize> ByteWriter for FunctionalByteWriter<F> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterErr> {
        if (self.write_fn)(bytes) != bytes.len() {
            return Err(WriterErr::ShortWrite);
        }
        Ok(())
    }
}

/// Adapter around a caller-supplied read callback. The callback fills the
/// buffer and returns the number of bytes produced; a short count means the
/// source is exhausted or failed.
pub struct FunctionalByteReader<F> {
    read_fn: F,
}

impl<F: FnMut(&mut [u8]) -> usize> FunctionalByteReader<F> {
    pub fn new(read_fn: F) -> Self {
        FunctionalByteReader { read_fn }
    }
}

impl<F: FnMut(&mut [u8]) -> usize> ByteReader for FunctionalByteReader<F> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ReaderErr> {
        if (self.read_fn)(buf) != buf.len() {
            return Err(ReaderErr::NotEnoughData);
        }
        Ok(())
    }
}

/// Bridge from any [`std::io::Write`] sink.
pub struct IoWriter<W> {
    inner: W,
}

impl<W: io::Write> IoWriter<W> {
    pub fn new(inner: W) -> Self {
        IoWriter { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> ByteWriter for IoWriter<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterErr> {
        self.inner.write_all(bytes).map_err(|_| WriterErr::ShortWrite)
    }
}

/// Bridge from any [`std::io::Read`] source.
pub struct IoReader<R> {
    inner: R,
}

impl<R: io::Read> IoReader<R> {
    pub fn new(inner: R) -> Self {
        IoReader { inner }
    }
}

impl<R: io::Read> ByteReader for IoReader<R> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ReaderErr> {
        self.inner.read_exact(buf).map_err(|_| ReaderErr::NotEnoughData)
    }
}

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderErr {
    #[error("string data is not valid UTF-8")]
    InvalidUtf8,
    #[error("not enough data in the source stream")]
    NotEnoughData,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterErr {
    #[error("sink accepted fewer bytes than requested")]
    ShortWrite,
}

/// Writes a fixed four-byte chunk tag.
pub fn write_tag<W: ByteWriter>(writer: &mut W, tag: [u8; 4]) -> Result<(), WriterErr> {
    writer.write_bytes(&tag)
}

pub fn read_tag<R: ByteReader>(reader: &mut R) -> Result<[u8; 4], ReaderErr> {
    let mut tag = [0u8; 4];
    reader.read_bytes(&mut tag)?;
    Ok(tag)
}

/// Writes a string as a u32 byte-length prefix followed by raw UTF-8.
/// There is no NUL terminator on the wire.
pub fn write_string<W: ByteWriter>(writer: &mut W, s: &str) -> Result<(), WriterErr> {
    writer.write_u32(s.len() as u32)?;
    writer.write_bytes(s.as_bytes())
}

pub fn read_string<R: ByteReader>(reader: &mut R) -> Result<String, ReaderErr> {
    let len = reader.read_u32()? as usize;
    let mut bytes = vec![0u8; len];
    reader.read_bytes(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| ReaderErr::InvalidUtf8)
}
