//! Splits raw stdin bytes into one string per key sequence.
//!
//! An incomplete escape tail stays buffered until `timeout_ms` passes without more bytes,
//! then is emitted verbatim. A lone ESC therefore arrives as its own sequence once the
//! timeout expires.

use std::time::{Duration, Instant};

const ESC: u8 = 0x1b;

#[derive(Debug, PartialEq, Eq)]
enum SequenceStatus {
    Complete,
    Incomplete,
}

pub struct StdinBuffer {
    buffer: String,
    timeout_ms: u64,
    flush_deadline: Option<Instant>,
}

impl StdinBuffer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            buffer: String::new(),
            timeout_ms,
            flush_deadline: None,
        }
    }

    /// Feeds bytes read from stdin and returns every sequence completed by them.
    pub fn process(&mut self, data: &[u8]) -> Vec<String> {
        self.flush_deadline = None;

        // Some terminals send meta keys as a single high byte.
        if data.len() == 1 && data[0] > 127 {
            self.buffer.push('\x1b');
            self.buffer.push((data[0] - 128) as char);
        } else {
            self.buffer.push_str(&String::from_utf8_lossy(data));
        }

        let (sequences, remainder) = extract_complete_sequences(&self.buffer);
        self.buffer = remainder;
        if !self.buffer.is_empty() {
            self.flush_deadline = Some(Instant::now() + Duration::from_millis(self.timeout_ms));
        }
        sequences
    }

    /// Emits the buffered tail once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<String> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// Poll timeout in milliseconds: the time to the flush deadline, capped at `default_ms`.
    pub fn next_timeout_ms(&self, now: Instant, default_ms: i32) -> i32 {
        match self.flush_deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now);
                let ms = remaining.as_millis().min(i32::MAX as u128) as i32;
                ms.min(default_ms).max(0)
            }
            None => default_ms,
        }
    }

    pub fn flush(&mut self) -> Vec<String> {
        self.flush_deadline = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.buffer)]
    }

    pub fn clear(&mut self) {
        self.flush_deadline = None;
        self.buffer.clear();
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }
}

fn extract_complete_sequences(buffer: &str) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let bytes = buffer.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != ESC {
            let Some(ch) = buffer[pos..].chars().next() else {
                break;
            };
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
            continue;
        }

        let mut end = pos + 1;
        let mut completed = false;
        while end <= bytes.len() {
            if !buffer.is_char_boundary(end) {
                end += 1;
                continue;
            }
            if sequence_status(&buffer[pos..end]) == SequenceStatus::Complete {
                sequences.push(buffer[pos..end].to_string());
                pos = end;
                completed = true;
                break;
            }
            end += 1;
        }
        if !completed {
            return (sequences, buffer[pos..].to_string());
        }
    }

    (sequences, String::new())
}

fn sequence_status(data: &str) -> SequenceStatus {
    let bytes = data.as_bytes();
    if bytes.len() < 2 {
        return SequenceStatus::Incomplete;
    }

    match bytes[1] {
        b'[' => {
            if bytes.len() < 3 {
                return SequenceStatus::Incomplete;
            }
            if bytes[2] == b'[' {
                // Linux console function keys: ESC [ [ A.
                return if bytes.len() >= 4 {
                    SequenceStatus::Complete
                } else {
                    SequenceStatus::Incomplete
                };
            }
            let last = bytes[bytes.len() - 1];
            if bytes.len() > 2 && (0x40..=0x7e).contains(&last) {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        b'O' => {
            if bytes.len() >= 3 {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        b']' | b'P' | b'_' => {
            if data.ends_with("\x1b\\") || (bytes[1] == b']' && data.ends_with('\x07')) {
                SequenceStatus::Complete
            } else {
                SequenceStatus::Incomplete
            }
        }
        _ => SequenceStatus::Complete,
    }
}
