//! Character window: the bounded, in-memory suffix of the stream.
//!
//! The buffer holds three regions, separated by byte-offset cursors that
//! always lie on `char` boundaries:
//!
//! ```text
//!   0 ...... drained ...... committed ...... scan ...... len
//!   |  emitted, kept as  |  finalized, not |  pending   |
//!   |  lookbehind context|  yet drained    |  decision  |
//! ```
//!
//! Everything below `committed` is final output; everything at or above
//! `scan` is still subject to match attempts. Compaction discards the head
//! of the buffer but always retains at least `lookbehind` characters before
//! `committed` so backward-looking assertions (`\b`, multi-line `^`) keep
//! their context.

/// Growable window over the not-yet-finalized suffix of a stream.
#[derive(Debug)]
pub(crate) struct Window {
    buf: String,
    drained: usize,
    committed: usize,
    scan: usize,
    /// Minimum count of finalized characters retained before `committed`.
    lookbehind: usize,
}

impl Window {
    pub(crate) fn new(lookbehind: usize) -> Self {
        Window {
            buf: String::new(),
            drained: 0,
            committed: 0,
            scan: 0,
            lookbehind,
        }
    }

    /// Buffered extent in bytes.
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.buf
    }

    pub(crate) fn committed(&self) -> usize {
        self.committed
    }

    pub(crate) fn scan(&self) -> usize {
        self.scan
    }

    /// Append newly fetched characters to the buffered region.
    pub(crate) fn append(&mut self, chars: &str) {
        self.buf.push_str(chars);
    }

    /// Move the scan cursor. `pos` must be a char boundary in
    /// `[committed, len]`.
    pub(crate) fn set_scan(&mut self, pos: usize) {
        debug_assert!(pos >= self.committed && pos <= self.buf.len());
        debug_assert!(self.buf.is_char_boundary(pos));
        self.scan = pos;
    }

    /// Finalize everything below `pos`: output before `pos` is now fixed and
    /// the next match attempt starts there.
    pub(crate) fn finalize_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.committed && pos <= self.buf.len());
        debug_assert!(self.buf.is_char_boundary(pos));
        self.committed = pos;
        self.scan = pos;
    }

    /// Splice `text` over `[start, end)`. The caller re-seats the cursors
    /// afterwards; only spans at or above `committed` may be edited.
    pub(crate) fn splice(&mut self, start: usize, end: usize, text: &str) {
        debug_assert!(start >= self.committed);
        self.buf.replace_range(start..end, text);
    }

    /// Return the finalized-but-undrained characters, exactly once, then
    /// compact. Finalized characters inside the lookbehind margin stay in
    /// the buffer as read-only context but are never returned again.
    pub(crate) fn drain_finalized(&mut self) -> String {
        let out = self.buf[self.drained..self.committed].to_string();
        self.drained = self.committed;
        self.compact();
        out
    }

    /// Discard the buffer head that is neither undrained output nor needed
    /// as lookbehind context, re-basing all cursors.
    fn compact(&mut self) {
        let keep_from = self.drained.min(self.margin_floor());
        if keep_from == 0 {
            return;
        }
        self.buf.drain(..keep_from);
        self.drained -= keep_from;
        self.committed -= keep_from;
        self.scan -= keep_from;
    }

    /// Byte offset of the `lookbehind`-th character boundary before
    /// `committed` (0 when fewer characters are buffered).
    fn margin_floor(&self) -> usize {
        let mut pos = self.committed;
        for _ in 0..self.lookbehind {
            match self.buf[..pos].chars().next_back() {
                Some(c) => pos -= c.len_utf8(),
                None => break,
            }
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_is_exactly_once() {
        let mut w = Window::new(0);
        w.append("hello world");
        w.finalize_to(5);
        assert_eq!(w.drain_finalized(), "hello");
        assert_eq!(w.drain_finalized(), "");
        w.finalize_to(w.len());
        assert_eq!(w.drain_finalized(), " world");
    }

    #[test]
    fn compaction_discards_drained_head() {
        let mut w = Window::new(0);
        w.append("abcdef");
        w.finalize_to(4);
        let _ = w.drain_finalized();
        // Head gone, cursors re-based.
        assert_eq!(w.as_str(), "ef");
        assert_eq!(w.committed(), 0);
        assert_eq!(w.scan(), 0);
    }

    #[test]
    fn compaction_keeps_lookbehind_margin() {
        let mut w = Window::new(3);
        w.append("abcdefgh");
        w.finalize_to(6);
        assert_eq!(w.drain_finalized(), "abcdef");
        // Three chars of context retained before committed.
        assert_eq!(w.as_str(), "defgh");
        assert_eq!(w.committed(), 3);
        assert_eq!(w.scan(), 3);
    }

    #[test]
    fn lookbehind_margin_counts_chars_not_bytes() {
        let mut w = Window::new(2);
        w.append("αβγx");
        let cut = "αβγ".len();
        w.finalize_to(cut);
        assert_eq!(w.drain_finalized(), "αβγ");
        // Margin is two characters (β γ), four bytes.
        assert_eq!(w.as_str(), "βγx");
        assert_eq!(w.committed(), "βγ".len());
    }

    #[test]
    fn compaction_is_idempotent() {
        let mut w = Window::new(2);
        w.append("0123456789");
        w.finalize_to(7);
        let _ = w.drain_finalized();
        let snapshot = (w.as_str().to_string(), w.committed(), w.scan());
        // Draining again with no new finalization changes nothing.
        assert_eq!(w.drain_finalized(), "");
        assert_eq!(
            (w.as_str().to_string(), w.committed(), w.scan()),
            snapshot
        );
    }

    #[test]
    fn splice_grows_and_shrinks() {
        let mut w = Window::new(0);
        w.append("edit stream");
        w.splice(0, 4, "modify");
        assert_eq!(w.as_str(), "modify stream");
        w.splice(7, 13, "flow");
        assert_eq!(w.as_str(), "modify flow");
    }

    #[test]
    fn undrained_output_survives_compaction() {
        let mut w = Window::new(4);
        w.append("abcdefgh");
        w.finalize_to(6);
        // Nothing drained yet: compaction must not discard undrained output,
        // so the full head stays put.
        w.append("ij");
        assert_eq!(w.as_str(), "abcdefghij");
        assert_eq!(w.drain_finalized(), "abcdef");
    }
}
