//! Byte streams the interpreter reads from and writes to.
//!
//! Every read and write transfers exactly the requested number of bytes or
//! fails; there are no partial transfers.

use std::io::{self, Read, Write};

use crate::engine::ParseError;

/// Exact-length byte source and sink, all values little-endian.
pub trait DataStream {
    /// Fill `buf` completely.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ParseError>;

    /// Write all of `buf`.
    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), ParseError>;

    /// Bytes consumed or produced so far.
    fn position(&self) -> u64;

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        let mut buf = vec![0; len];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    fn read_u8(&mut self) -> Result<u8, ParseError> {
        let mut buf = [0; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> Result<u16, ParseError> {
        let mut buf = [0; 2];
        self.read_bytes(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32, ParseError> {
        let mut buf = [0; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_f32(&mut self) -> Result<f32, ParseError> {
        self.read_u32().map(f32::from_bits)
    }

    /// Bytes up to a `\n`; the newline is consumed but not returned.
    fn read_line(&mut self) -> Result<Vec<u8>, ParseError> {
        let mut line = Vec::new();
        loop {
            match self.read_u8()? {
                b'\n' => return Ok(line),
                byte => line.push(byte),
            }
        }
    }

    fn write_u8(&mut self, value: u8) -> Result<(), ParseError> {
        self.write_bytes(&[value])
    }

    fn write_u16(&mut self, value: u16) -> Result<(), ParseError> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<(), ParseError> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_f32(&mut self, value: f32) -> Result<(), ParseError> {
        self.write_u32(value.to_bits())
    }
}

impl<S: DataStream + ?Sized> DataStream for &mut S {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        (**self).read_bytes(buf)
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), ParseError> {
        (**self).write_bytes(buf)
    }

    fn position(&self) -> u64 {
        (**self).position()
    }
}

/// Read-only stream over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct SliceStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

impl DataStream for SliceStream<'_> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        let end = self.pos + buf.len();
        let src = self
            .data
            .get(self.pos..end)
            .ok_or(ParseError::UnexpectedEof {
                position: self.pos as u64,
            })?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn write_bytes(&mut self, _buf: &[u8]) -> Result<(), ParseError> {
        Err(ParseError::StreamNotWritable)
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }
}

/// Growable in-memory stream; writes overwrite or extend at the cursor.
#[derive(Clone, Debug, Default)]
pub struct VecStream {
    data: Vec<u8>,
    pos: usize,
}

impl VecStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream positioned at the start of `data`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl DataStream for VecStream {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        let end = self.pos + buf.len();
        let src = self
            .data
            .get(self.pos..end)
            .ok_or(ParseError::UnexpectedEof {
                position: self.pos as u64,
            })?;
        buf.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), ParseError> {
        let end = self.pos + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos as u64
    }
}

/// Stream over any [`Read`] implementation.
#[derive(Debug)]
pub struct ReadStream<R> {
    inner: R,
    pos: u64,
}

impl<R: Read> ReadStream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> DataStream for ReadStream<R> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ParseError::UnexpectedEof { position: self.pos },
            _ => ParseError::Io(e),
        })?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn write_bytes(&mut self, _buf: &[u8]) -> Result<(), ParseError> {
        Err(ParseError::StreamNotWritable)
    }

    fn position(&self) -> u64 {
        self.pos
    }
}

/// Stream over any [`Write`] implementation. Reads fail with end of stream.
#[derive(Debug)]
pub struct WriteStream<W> {
    inner: W,
    pos: u64,
}

impl<W: Write> WriteStream<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, pos: 0 }
    }

    pub fn flush(&mut self) -> Result<(), ParseError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DataStream for WriteStream<W> {
    fn read_bytes(&mut self, _buf: &mut [u8]) -> Result<(), ParseError> {
        Err(ParseError::UnexpectedEof { position: self.pos })
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<(), ParseError> {
        self.inner.write_all(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
