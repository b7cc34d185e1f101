//! Shared-context zlib stream decompression
//!
//! The gateway sends binary frames on a single zlib stream. Frames are
//! buffered until one arrives ending in the zlib flush marker, then the
//! accumulated bytes are inflated through a persistent decompression
//! context that survives across frames.

use crate::error::GatewayError;
use flate2::{Decompress, FlushDecompress};

/// Trailing bytes of a complete zlib-flushed frame
const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

const CHUNK: usize = 16 * 1024;

/// Streaming inflater holding the shared zlib context
pub struct Inflater {
    decompress: Decompress,
    buffer: Vec<u8>,
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

impl Inflater {
    #[must_use]
    pub fn new() -> Self {
        Self {
            decompress: Decompress::new(true),
            buffer: Vec::new(),
        }
    }

    /// Feed one binary frame.
    ///
    /// Returns `Ok(None)` until a frame ending in the zlib flush marker
    /// completes the buffered message, then the decoded UTF-8 text.
    pub fn extend(&mut self, chunk: &[u8]) -> Result<Option<String>, GatewayError> {
        self.buffer.extend_from_slice(chunk);

        if self.buffer.len() < ZLIB_SUFFIX.len()
            || self.buffer[self.buffer.len() - ZLIB_SUFFIX.len()..] != ZLIB_SUFFIX
        {
            return Ok(None);
        }

        let result = self.inflate_buffered();
        // Consumed either way: bytes that failed to inflate must not be
        // prepended to the next frame.
        self.buffer.clear();
        result.map(Some)
    }

    fn inflate_buffered(&mut self) -> Result<String, GatewayError> {
        let mut output = Vec::with_capacity(self.buffer.len() * 4);
        let mut scratch = [0u8; CHUNK];
        let mut consumed = 0usize;

        while consumed < self.buffer.len() {
            let before_in = self.decompress.total_in();
            let before_out = self.decompress.total_out();

            self.decompress
                .decompress(&self.buffer[consumed..], &mut scratch, FlushDecompress::Sync)
                .map_err(|err| GatewayError::Compression(err.to_string()))?;

            let read = usize::try_from(self.decompress.total_in() - before_in)
                .map_err(|err| GatewayError::Compression(err.to_string()))?;
            let written = usize::try_from(self.decompress.total_out() - before_out)
                .map_err(|err| GatewayError::Compression(err.to_string()))?;

            output.extend_from_slice(&scratch[..written]);
            consumed += read;

            if read == 0 && written == 0 {
                break;
            }
        }

        String::from_utf8(output).map_err(|err| GatewayError::Compression(err.to_string()))
    }

    /// Bytes currently buffered awaiting the flush marker
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{Compress, Compression, FlushCompress};

    fn deflate(compress: &mut Compress, input: &[u8]) -> Vec<u8> {
        let mut output = vec![0u8; input.len() + 64];
        let before_out = compress.total_out();
        compress
            .compress(input, &mut output, FlushCompress::Sync)
            .unwrap();
        let written = usize::try_from(compress.total_out() - before_out).unwrap();
        output.truncate(written);
        output
    }

    #[test]
    fn test_single_frame_inflates() {
        let mut compress = Compress::new(Compression::default(), true);
        let frame = deflate(&mut compress, br#"{"op":10}"#);
        assert_eq!(&frame[frame.len() - 4..], &ZLIB_SUFFIX);

        let mut inflater = Inflater::new();
        let text = inflater.extend(&frame).unwrap().unwrap();
        assert_eq!(text, r#"{"op":10}"#);
        assert_eq!(inflater.pending(), 0);
    }

    #[test]
    fn test_split_frame_buffers_until_suffix() {
        let mut compress = Compress::new(Compression::default(), true);
        let frame = deflate(&mut compress, br#"{"op":11,"d":null}"#);
        let mid = frame.len() / 2;

        let mut inflater = Inflater::new();
        assert!(inflater.extend(&frame[..mid]).unwrap().is_none());
        assert!(inflater.pending() > 0);

        let text = inflater.extend(&frame[mid..]).unwrap().unwrap();
        assert_eq!(text, r#"{"op":11,"d":null}"#);
    }

    #[test]
    fn test_context_survives_across_messages() {
        let mut compress = Compress::new(Compression::default(), true);
        let first = deflate(&mut compress, br#"{"seq":1}"#);
        let second = deflate(&mut compress, br#"{"seq":2}"#);

        let mut inflater = Inflater::new();
        assert_eq!(inflater.extend(&first).unwrap().unwrap(), r#"{"seq":1}"#);
        // The second frame only decodes against the context built by the first.
        assert_eq!(inflater.extend(&second).unwrap().unwrap(), r#"{"seq":2}"#);
    }

    #[test]
    fn test_garbage_is_an_error() {
        let mut inflater = Inflater::new();
        let mut garbage = vec![0xde, 0xad, 0xbe, 0xef];
        garbage.extend_from_slice(&ZLIB_SUFFIX);
        assert!(inflater.extend(&garbage).is_err());
    }

    #[test]
    fn test_error_discards_buffered_bytes() {
        let mut inflater = Inflater::new();
        let mut garbage = vec![0xde, 0xad, 0xbe, 0xef];
        garbage.extend_from_slice(&ZLIB_SUFFIX);
        assert!(inflater.extend(&garbage).is_err());
        // The bad input must not leak into whatever frame comes next.
        assert_eq!(inflater.pending(), 0);
    }
}
