//! DFA-backed delegate: exact streaming signals.
//!
//! The decision a streaming engine needs — "could this answer still change?"
//! — is invisible through a regex crate's public search API but falls
//! straight out of a walkable DFA. For each candidate start position we step
//! an anchored dense DFA byte-by-byte and classify the walk:
//!
//! - the walk hits the dead state → no match will ever start here, with any
//!   amount of further input;
//! - the walk records a match and then dies → that match is final for this
//!   start;
//! - the walk runs out of buffered bytes while still live → whatever we know
//!   so far is provisional.
//!
//! Candidate starts are tried left to right, so the first classification
//! that is not "dead" settles the attempt: a live-but-unmatched start blocks
//! any later match (leftmost priority), and a match is only as final as its
//! own walk.
//!
//! Capture groups come from a companion `regex::Regex` pass over the
//! accepted start. Both engines compile the same pattern with the same
//! semantics, so a disagreement about boundaries is a protocol violation,
//! reported as such.

use regex::{CaptureLocations, Regex};
use regex_automata::dfa::{Automaton, StartKind, dense};
use regex_automata::util::syntax;
use regex_automata::{Anchored, Input};

use crate::error::WeirError;
use crate::matcher::{Attempt, Dialect, Found, StreamMatcher, compile_api, exact_attempt};

pub(crate) struct DfaMatcher {
    dfa: dense::DFA<Vec<u32>>,
    /// Public-API twin of the DFA, for capture extraction and the exact
    /// end-of-stream path.
    re: Regex,
    locs: CaptureLocations,
}

/// Classification of one anchored walk.
enum Walk {
    /// Dead state reached before any match: this start is settled, forever.
    Dead,
    /// Out of bytes while the walk could still reach a match.
    Live,
    /// Leftmost-first match for this start. `live` is true when the walk
    /// reached the end of the buffer without dying, i.e. the match could
    /// still extend or be superseded along the same start.
    Match { end: usize, live: bool },
    /// The DFA gave up (heuristic Unicode `\b` meeting a non-ASCII byte).
    /// Treated as "cannot decide yet"; end-of-stream resolves it exactly.
    Indeterminate,
}

impl DfaMatcher {
    pub(crate) fn new(pattern: &str, dialect: Dialect) -> Result<Self, WeirError> {
        let dfa = dense::Builder::new()
            .configure(
                dense::Config::new()
                    .start_kind(StartKind::Anchored)
                    .unicode_word_boundary(true),
            )
            .syntax(
                syntax::Config::new()
                    .case_insensitive(dialect.case_insensitive)
                    .dot_matches_new_line(dialect.dot_matches_new_line)
                    .multi_line(dialect.multi_line),
            )
            .build(pattern)
            .map_err(|e| WeirError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        let re = compile_api(pattern, dialect)?;
        let locs = re.capture_locations();
        Ok(DfaMatcher { dfa, re, locs })
    }

    /// Step the anchored DFA from `p` to the end of the buffer.
    ///
    /// Match states are delayed by one byte, so a match flag seen after
    /// consuming byte `i` means a match ended at `i`; the end-of-input
    /// transition reports matches that need the buffer edge (end anchors).
    fn walk(&self, haystack: &[u8], p: usize) -> Walk {
        let input = Input::new(haystack).range(p..).anchored(Anchored::Yes);
        let Ok(mut sid) = self.dfa.start_state_forward(&input) else {
            return Walk::Indeterminate;
        };
        let mut last_match: Option<usize> = None;
        for (i, &byte) in haystack.iter().enumerate().skip(p) {
            sid = self.dfa.next_state(sid, byte);
            if self.dfa.is_special_state(sid) {
                if self.dfa.is_match_state(sid) {
                    last_match = Some(i);
                } else if self.dfa.is_dead_state(sid) {
                    return match last_match {
                        Some(end) => Walk::Match { end, live: false },
                        None => Walk::Dead,
                    };
                } else if self.dfa.is_quit_state(sid) {
                    return Walk::Indeterminate;
                }
            }
        }
        let eoi = self.dfa.next_eoi_state(sid);
        if self.dfa.is_match_state(eoi) {
            last_match = Some(haystack.len());
        }
        match last_match {
            Some(end) => {
                // The delayed-match state may carry no live threads at all
                // (e.g. a literal followed by an unrelated byte). Probing
                // every byte settles whether the match can still grow.
                let live = end == haystack.len() || !self.continuation_dead(sid);
                Walk::Match { end, live }
            }
            None => Walk::Live,
        }
    }

    /// True when no further input can advance this state: every byte leads
    /// to the dead state. Only consulted after a recorded match whose walk
    /// reached the buffer edge, so the 256 probes are rare.
    fn continuation_dead(&self, sid: regex_automata::util::primitives::StateID) -> bool {
        (0..=255u8).all(|b| self.dfa.is_dead_state(self.dfa.next_state(sid, b)))
    }

    /// Extract capture groups for the match the DFA accepted at `start`,
    /// cross-checking both engines agree on its boundaries.
    fn captures(&mut self, haystack: &str, start: usize, end: usize) -> Result<Found, WeirError> {
        let hit = self.re.captures_read_at(&mut self.locs, haystack, start);
        let span = hit.map(|m| (m.start(), m.end()));
        if span != Some((start, end)) {
            return Err(WeirError::ProtocolViolation {
                detail: format!(
                    "DFA accepted {start}..{end} but capture pass found {span:?}"
                ),
            });
        }
        Ok(super::found_from_locs(&self.locs))
    }
}

impl StreamMatcher for DfaMatcher {
    fn attempt(
        &mut self,
        haystack: &str,
        from: usize,
        end_of_input: bool,
    ) -> Result<Attempt, WeirError> {
        if end_of_input {
            return Ok(exact_attempt(&self.re, &mut self.locs, haystack, from));
        }
        let len = haystack.len();
        if from >= len {
            // Empty attempt region: nothing can be ruled in or out yet.
            return Ok(Attempt {
                found: None,
                hit_boundary: true,
                may_change: false,
                safe_until: from,
            });
        }
        let bytes = haystack.as_bytes();
        let mut p = from;
        while p < len {
            match self.walk(bytes, p) {
                Walk::Dead => {
                    p += haystack[p..].chars().next().map_or(1, char::len_utf8);
                }
                Walk::Live | Walk::Indeterminate => {
                    // A match may yet start at `p`; accepting anything later
                    // would second-guess leftmost priority. Everything below
                    // `p` is proven dead and safe to flush.
                    return Ok(Attempt {
                        found: None,
                        hit_boundary: true,
                        may_change: false,
                        safe_until: p,
                    });
                }
                Walk::Match { end, live } => {
                    let found = self.captures(haystack, p, end)?;
                    return Ok(Attempt {
                        found: Some(found),
                        hit_boundary: live,
                        may_change: live || end == len,
                        safe_until: p,
                    });
                }
            }
        }
        // Every start position in [from, len) is settled dead.
        Ok(Attempt {
            found: None,
            hit_boundary: false,
            may_change: false,
            safe_until: len,
        })
    }

    fn group_count(&self) -> usize {
        self.re.captures_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dfa(pattern: &str) -> DfaMatcher {
        DfaMatcher::new(pattern, Dialect::default()).unwrap()
    }

    #[test]
    fn settled_match_in_the_middle() {
        let mut m = dfa("cat");
        let a = m.attempt("a cat sat", 0, false).unwrap();
        let f = a.found.unwrap();
        assert_eq!((f.start, f.end), (2, 5));
        assert!(!a.may_change, "match followed by more text is final");
    }

    #[test]
    fn match_touching_buffer_end_is_provisional() {
        let mut m = dfa("cat");
        let a = m.attempt("a cat", 0, false).unwrap();
        assert!(a.found.is_some());
        assert!(a.may_change, "could be 'cats' — defer");
    }

    #[test]
    fn greedy_repeat_stops_being_provisional_once_bounded() {
        let mut m = dfa("ab*");
        let provisional = m.attempt("xabb", 0, false).unwrap();
        assert!(provisional.may_change);

        let settled = m.attempt("xabbcz", 0, false).unwrap();
        let f = settled.found.unwrap();
        assert_eq!((f.start, f.end), (1, 4));
        assert!(!settled.may_change);
    }

    #[test]
    fn dead_everywhere_is_definitive() {
        let mut m = dfa("needle");
        let a = m.attempt("xyzw", 0, false).unwrap();
        assert!(a.found.is_none());
        assert!(!a.hit_boundary, "no suffix of 'xyzw' starts 'needle'");
    }

    #[test]
    fn partial_suffix_keeps_the_search_open() {
        let mut m = dfa("needle");
        let a = m.attempt("say nee", 0, false).unwrap();
        assert!(a.found.is_none());
        assert!(a.hit_boundary, "'nee' could continue into 'needle'");
    }

    #[test]
    fn live_earlier_start_blocks_later_match() {
        // "<<" opens an unbounded alternative; the lone "x" must not be
        // accepted while that earlier start could still win.
        let mut m = dfa("<<.*>>|x");
        let a = m.attempt("<<abc x ", 0, false).unwrap();
        assert!(a.found.is_none());
        assert!(a.hit_boundary);
    }

    #[test]
    fn higher_priority_branch_keeps_match_provisional() {
        // `ax*y` outranks `a`; while it is still live the short match can
        // be superseded, even though its end is far from the buffer edge.
        let mut m = dfa("ax*y|a");
        let a = m.attempt("axxx", 0, false).unwrap();
        let f = a.found.unwrap();
        assert_eq!((f.start, f.end), (0, 1));
        assert!(a.may_change);
    }

    #[test]
    fn empty_match_is_final_when_continuation_dies() {
        let mut m = dfa("x*");
        let a = m.attempt("ab", 0, false).unwrap();
        let f = a.found.unwrap();
        assert_eq!((f.start, f.end), (0, 0));
        assert!(!a.may_change, "'a' already rules out any x");
    }

    #[test]
    fn end_of_input_answers_exactly() {
        let mut m = dfa("cat");
        let a = m.attempt("a cat", 0, true).unwrap();
        let f = a.found.unwrap();
        assert_eq!((f.start, f.end), (2, 5));
        assert!(!a.may_change);
        assert!(!a.hit_boundary);
    }

    #[test]
    fn word_boundary_sees_finalized_context() {
        let mut m = dfa(r"\bcat");
        // Attempt starts at 4 but "wild" before it is visible: "wildcat"
        // has no word boundary before 'c'.
        let a = m.attempt("wildcat sat", 4, true).unwrap();
        assert!(a.found.is_none());
    }
}
