use std::borrow::Cow;

const REPLACEMENT: char = '\u{FFFD}';
const BOM: char = '\u{FEFF}';

/// Incremental UTF-8 decoder.
///
/// Bytes of a code point cut off at the end of a chunk are held back and
/// completed by the next call. Invalid sequences decode to U+FFFD, one per
/// maximal invalid subpart, and a byte order mark at the start of the stream
/// is dropped.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
    started: bool,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk of the stream
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let buffer: Cow<'_, [u8]> = if self.pending.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        let mut out = String::with_capacity(buffer.len());
        let mut rest: &[u8] = &buffer;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &tail[len..];
                        }
                        None => {
                            // incomplete sequence at the end of the chunk
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.strip_leading_bom(out)
    }

    /// Flush the stream. A held partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            self.strip_leading_bom(REPLACEMENT.to_string())
        }
    }

    /// Number of bytes waiting for the rest of their code point
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn strip_leading_bom(&mut self, out: String) -> String {
        if self.started || out.is_empty() {
            return out;
        }
        self.started = true;

        match out.strip_prefix(BOM) {
            Some(rest) => rest.to_string(),
            None => out,
        }
    }
}
