//! Chunked transfer-encoding decoding
//!
//! The body is a sequence of `<hex-size>\r\n<bytes>\r\n` blocks terminated
//! by a zero-size chunk. Decoding works over the complete received buffer;
//! anything malformed (bad size line, truncated data, missing terminator)
//! is a typed error rather than a silent stop, and an iteration cap bounds
//! the scan on pathological input.

use super::{Error, Result};

/// Upper bound on chunks per body; a response is fully buffered before
/// decoding, so hitting this means the input is malformed or hostile.
const MAX_CHUNKS: usize = 16 * 1024;

/// Decode a complete chunked body into the raw byte sequence
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut pos = 0;

    for _ in 0..MAX_CHUNKS {
        let line_len = find_crlf(&input[pos..]).ok_or(Error::Chunk("missing chunk-size line"))?;
        let line = String::from_utf8_lossy(&input[pos..pos + line_len]);

        // Chunk extensions after ';' are ignored
        let size_str = line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_str, 16)
            .map_err(|_| Error::InvalidChunkSize(size_str.to_string()))?;
        pos += line_len + 2;

        if size == 0 {
            // Terminator chunk; any trailer section is ignored
            return Ok(out);
        }

        if input.len() < pos + size + 2 {
            return Err(Error::Chunk("truncated chunk data"));
        }
        out.extend_from_slice(&input[pos..pos + size]);
        pos += size;

        if &input[pos..pos + 2] != b"\r\n" {
            return Err(Error::Chunk("missing CRLF after chunk data"));
        }
        pos += 2;
    }

    Err(Error::Chunk("chunk count limit exceeded"))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
