//! Streaming newline decoder
//!
//! Bytes arrive in arbitrary chunks (a serial read may stop mid-token or
//! return nothing at all). The decoder keeps the unterminated tail as carry
//! and only yields a line once its `\n` has been seen, so the decoded line
//! sequence does not depend on where the chunk boundaries fell.

use crate::consts::MAX_PENDING_LINE;

/// Accumulates raw bytes and splits them into complete lines
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
    /// Index of the first byte not yet returned as part of a line
    start: usize,
    /// Set while the open line at the end of the buffer is an overlong one
    /// that was dropped; incoming bytes are discarded up to its terminator
    skipping: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the transport (may be empty)
    pub fn feed(&mut self, mut chunk: &[u8]) {
        if self.skipping {
            // Still inside a dropped line: discard through its terminator
            match chunk.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.skipping = false;
                    chunk = &chunk[end + 1..];
                }
                None => return,
            }
        }

        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }
        self.buf.extend_from_slice(chunk);

        let tail_start = self
            .buf
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        let tail_len = self.buf.len() - tail_start;
        if tail_len > MAX_PENDING_LINE {
            log::warn!(
                "Dropping {} bytes of unterminated input (limit {})",
                tail_len,
                MAX_PENDING_LINE
            );
            self.buf.truncate(tail_start);
            self.skipping = true;
        }
    }

    /// Iterate over the complete lines buffered so far.
    ///
    /// Each call picks up where the previous one stopped; lines are consumed
    /// as they are yielded, and the partial tail stays buffered.
    pub fn lines(&mut self) -> Lines<'_> {
        Lines { decoder: self }
    }

    /// Buffered bytes not yet yielded by [`lines`](Self::lines)
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.start..]
    }

    /// Forget all buffered input
    pub fn clear(&mut self) {
        self.buf.clear();
        self.start = 0;
        self.skipping = false;
    }
}

/// Lazy iterator over complete, non-empty lines (lossily decoded)
pub struct Lines<'a> {
    decoder: &'a mut LineDecoder,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let decoder = &mut *self.decoder;
        loop {
            let rest = &decoder.buf[decoder.start..];
            let end = rest.iter().position(|&b| b == b'\n')?;
            let mut line = &rest[..end];
            decoder.start += end + 1;

            // Same limit as the carry, so a long line is dropped no matter
            // how it was chunked
            if line.len() > MAX_PENDING_LINE {
                log::warn!("Dropping {}-byte line (limit {})", line.len(), MAX_PENDING_LINE);
                continue;
            }
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            if line.is_empty() {
                continue;
            }
            return Some(String::from_utf8_lossy(line).into_owned());
        }
    }
}
