use std::collections::VecDeque;

/// Carry-over buffer for line-based parsing
///
/// Holds raw bytes until a `\n` arrives, so a read that splits a multi-byte
/// UTF-8 character is only decoded once the whole line is present. Bytes that
/// are still invalid in a complete line decode to U+FFFD.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer, trimmed
    /// Returns None if no complete line is available
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        Some(decode_line(&line_bytes))
    }

    /// Drain whatever is left once the upstream has ended
    /// Returns None when only whitespace remains
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }

        let rest: Vec<u8> = self.buffer.drain(..).collect();
        let line = decode_line(&rest);
        (!line.is_empty()).then_some(line)
    }

    /// Current buffer size
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_basic() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut buffer = LineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\r\n");
        assert_eq!(buffer.next_line().unwrap(), "partial line");
    }

    #[test]
    fn test_split_multibyte_character() {
        let text = "data: ñ\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(&text[..split]);
        assert!(buffer.next_line().is_none());

        buffer.extend(&text[split..]);
        assert_eq!(buffer.next_line().unwrap(), "data: ñ");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"caf\xE9 ok\nnext\n");

        assert_eq!(buffer.next_line().unwrap(), "caf\u{FFFD} ok");
        assert_eq!(buffer.next_line().unwrap(), "next");
    }

    #[test]
    fn test_take_remainder() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"done\n  tail  ");

        assert_eq!(buffer.next_line().unwrap(), "done");
        assert_eq!(buffer.take_remainder().unwrap(), "tail");
        assert!(buffer.take_remainder().is_none());

        buffer.extend(b" \r ");
        assert!(buffer.take_remainder().is_none());
    }
}
