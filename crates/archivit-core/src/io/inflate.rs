//! Optional DEFLATE stage of a write pipeline.

use std::io::Write;

use flate2::write::ZlibDecoder;

/// Passes bytes through unchanged or inflates them.
pub(crate) enum Inflate<W: Write> {
    Plain(W),
    Zlib(ZlibDecoder<W>),
}

impl<W: Write> Inflate<W> {
    pub(crate) fn new(inner: W, compressed: bool) -> Self {
        if compressed {
            Self::Zlib(ZlibDecoder::new(inner))
        } else {
            Self::Plain(inner)
        }
    }

    /// Flushes any buffered output and returns the inner writer.
    pub(crate) fn finish(self) -> std::io::Result<W> {
        match self {
            Self::Plain(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
            Self::Zlib(decoder) => decoder.finish(),
        }
    }
}

impl<W: Write> Write for Inflate<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(inner) => inner.write(buf),
            Self::Zlib(decoder) => decoder.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(inner) => inner.flush(),
            Self::Zlib(decoder) => decoder.flush(),
        }
    }
}
