//! Size-capped accumulation of a child process output stream.
//!
//! A headless browser that loops on a console error can write megabytes per
//! second. [`CappedBuffer`] keeps only the most recent `cap` bytes and counts
//! what it threw away. Diagnostics live at the end of a log, so dropping the
//! head loses the least.

use std::collections::VecDeque;

/// Keeps the last `cap` bytes pushed into it.
#[derive(Debug, Clone)]
pub struct CappedBuffer {
    bytes: VecDeque<u8>,
    cap: usize,
    dropped: u64,
}

impl CappedBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            bytes: VecDeque::with_capacity(cap.min(8192)),
            cap,
            dropped: 0,
        }
    }

    /// Append a chunk, evicting the oldest bytes beyond the cap.
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.len() >= self.cap {
            self.dropped += (self.bytes.len() + chunk.len() - self.cap) as u64;
            self.bytes.clear();
            self.bytes.extend(&chunk[chunk.len() - self.cap..]);
            return;
        }
        let overflow = (self.bytes.len() + chunk.len()).saturating_sub(self.cap);
        if overflow > 0 {
            self.bytes.drain(..overflow);
            self.dropped += overflow as u64;
        }
        self.bytes.extend(chunk);
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes evicted so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Lossy UTF-8 text, prefixed with a marker when bytes were evicted.
    pub fn into_text(self) -> String {
        let (front, back) = self.bytes.as_slices();
        let mut raw = Vec::with_capacity(front.len() + back.len());
        raw.extend_from_slice(front);
        raw.extend_from_slice(back);
        let text = String::from_utf8_lossy(&raw);
        if self.dropped > 0 {
            format!("[... {} earlier bytes truncated ...]\n{text}", self.dropped)
        } else {
            text.into_owned()
        }
    }
}
