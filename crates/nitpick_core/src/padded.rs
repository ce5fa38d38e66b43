//! The padded source buffer.
//!
//! The lexer scans raw bytes with up to three bytes of lookahead (`>>>=` is
//! the longest punctuator), so the buffer guarantees NUL padding after the
//! content. NUL never occurs in a token, which lets the scanning loops treat
//! it as a universal terminator instead of bounds-checking every read.

use crate::text::SourceSpan;

/// Number of NUL bytes appended after the content.
pub const PADDING_LEN: usize = 4;

/// An owned source buffer with trailing NUL padding.
pub struct PaddedString {
    /// Content bytes followed by `PADDING_LEN` NULs.
    bytes: Vec<u8>,
    content_len: usize,
}

impl PaddedString {
    /// Create a padded buffer from source text.
    pub fn new(source: &str) -> Self {
        let content_len = source.len();
        let mut bytes = Vec::with_capacity(content_len + PADDING_LEN);
        bytes.extend_from_slice(source.as_bytes());
        bytes.resize(content_len + PADDING_LEN, 0);
        Self { bytes, content_len }
    }

    /// The length of the content, excluding padding.
    #[inline]
    pub fn len(&self) -> usize {
        self.content_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content_len == 0
    }

    /// A borrowed view over the buffer.
    #[inline]
    pub fn view(&self) -> PaddedStringView<'_> {
        PaddedStringView {
            bytes: &self.bytes,
            content_len: self.content_len,
        }
    }
}

impl From<String> for PaddedString {
    fn from(source: String) -> Self {
        PaddedString::new(&source)
    }
}

/// A borrowed view of a padded source buffer.
#[derive(Copy, Clone)]
pub struct PaddedStringView<'code> {
    bytes: &'code [u8],
    content_len: usize,
}

impl<'code> PaddedStringView<'code> {
    /// The length of the content, excluding padding.
    #[inline]
    pub fn len(&self) -> usize {
        self.content_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content_len == 0
    }

    /// The byte at `pos`. Reads into the padding return NUL; reads past the
    /// padding also return NUL so lookahead never needs a bounds check.
    #[inline]
    pub fn byte_at(&self, pos: usize) -> u8 {
        self.bytes.get(pos).copied().unwrap_or(0)
    }

    /// The content bytes, without padding.
    #[inline]
    pub fn content_bytes(&self) -> &'code [u8] {
        &self.bytes[..self.content_len]
    }

    /// Slice the content as UTF-8 text.
    ///
    /// The buffer is constructed from `&str`, so content slices on character
    /// boundaries are always valid UTF-8.
    #[inline]
    pub fn slice(&self, span: SourceSpan) -> &'code str {
        std::str::from_utf8(&self.bytes[span.to_range()]).expect("source is valid UTF-8")
    }

    /// The content from `pos` to the end, as UTF-8 text.
    #[inline]
    pub fn text_from(&self, pos: usize) -> &'code str {
        std::str::from_utf8(&self.bytes[pos..self.content_len]).expect("source is valid UTF-8")
    }
}
