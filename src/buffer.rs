//! Cursor views over caller-owned byte slices.
//!
//! The decoder reads from an [`Input`] and the encoder writes into an [`Output`]. Both wrap
//! a plain mutable slice and track how far the codec got, so the caller knows how many bytes
//! to drop from its read buffer, or to hand to the transport, after each call.

/// Bytes available to the decoder.
///
/// The slice is mutable because payload bytes are unmasked in place. `last` marks the end
/// of the stream: no more bytes will ever follow the ones in this view.
pub struct Input<'a> {
    buf: &'a mut [u8],
    pos: usize,
    last: bool,
}

impl<'a> Input<'a> {
    pub fn new(buf: &'a mut [u8], last: bool) -> Self {
        Self { buf, pos: 0, last }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes still unread.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether the stream ends with this view.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// Reads a single byte.
    #[inline]
    pub(crate) fn next_byte(&mut self) -> Option<u8> {
        let byte = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Takes up to `len` unread bytes, mutably.
    #[inline]
    pub(crate) fn take(&mut self, len: usize) -> &mut [u8] {
        let len = len.min(self.remaining());
        let start = self.pos;
        self.pos += len;
        &mut self.buf[start..start + len]
    }
}

/// Space available to the encoder.
///
/// Bytes before the cursor are complete wire bytes; the encoder only ever writes past it.
pub struct Output<'a> {
    buf: &'a mut [u8],
    filled: usize,
}

impl<'a> Output<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, filled: 0 }
    }

    /// Total size of the view.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Space left after the written bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.filled
    }

    /// The bytes written so far.
    #[inline]
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// The space past the written bytes.
    #[inline]
    pub(crate) fn unfilled_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Marks `n` more bytes as written.
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        assert!(n <= self.remaining(), "advance past the end of the output");
        self.filled += n;
    }
}
