//! Public-API delegate: conservative streaming signals.
//!
//! The `regex` crate's search API answers "match or no match" but never
//! "could that answer still change", so this adapter reconstructs the
//! streaming signals from static pattern analysis instead of engine
//! introspection:
//!
//! - `maximum_len()` bounds how much input an attempt can consume; a start
//!   position whose bound lies entirely inside the buffer was searched with
//!   everything it could ever use, and its failure is final;
//! - a finite prefix-literal set means every match begins with one of a few
//!   known byte strings; positions that carry none of them (complete, or
//!   truncated by the buffer edge) cannot start a match, no matter what
//!   arrives later.
//!
//! Where neither analysis applies the adapter defers, trading buffering for
//! certainty. That is the documented over-approximation: output never
//! differs from the DFA adapter, but analysis-opaque patterns (unbounded
//! repeats without a literal spine, empty-matching patterns) may buffer up
//! to end-of-stream before deciding.

use memchr::memmem;
use regex::{CaptureLocations, Regex};
use regex_syntax::ParserBuilder;
use regex_syntax::hir::literal::Extractor;

use crate::error::WeirError;
use crate::matcher::{
    Attempt, Dialect, StreamMatcher, compile_api, exact_attempt, found_from_locs,
};

pub(crate) struct ApiMatcher {
    re: Regex,
    locs: CaptureLocations,
    /// Upper bound in bytes on any match. `None` = unbounded.
    max_len: Option<usize>,
    /// Every match starts with one of these. `None` = extraction was
    /// inconclusive and no position can be pruned.
    prefixes: Option<Vec<memmem::Finder<'static>>>,
}

impl ApiMatcher {
    pub(crate) fn new(pattern: &str, dialect: Dialect) -> Result<Self, WeirError> {
        let re = compile_api(pattern, dialect)?;
        let locs = re.capture_locations();

        let hir = ParserBuilder::new()
            .case_insensitive(dialect.case_insensitive)
            .dot_matches_new_line(dialect.dot_matches_new_line)
            .multi_line(dialect.multi_line)
            .build()
            .parse(pattern)
            .map_err(|e| WeirError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        let max_len = hir.properties().maximum_len();

        let seq = Extractor::new().extract(&hir);
        let prefixes = seq.literals().and_then(|lits| {
            // An empty literal means the pattern can match at any position;
            // nothing can be pruned then.
            if lits.is_empty() || lits.iter().any(|l| l.as_bytes().is_empty()) {
                return None;
            }
            Some(
                lits.iter()
                    .map(|l| memmem::Finder::new(l.as_bytes()).into_owned())
                    .collect::<Vec<_>>(),
            )
        });

        Ok(ApiMatcher {
            re,
            locs,
            max_len,
            prefixes,
        })
    }

    /// Could a match starting in `[start, end_excl)` still materialize with
    /// more input? Over-approximates: `true` may be spurious, `false` is
    /// definitive.
    fn live_start_in(&self, haystack: &[u8], start: usize, end_excl: usize) -> bool {
        if start >= end_excl {
            return false;
        }
        let len = haystack.len();
        let Some(prefixes) = &self.prefixes else {
            return true;
        };
        for finder in prefixes {
            let lit_len = finder.needle().len();

            // Complete literal occurrences whose attempt could still reach
            // past the buffer edge. Positions with `q + max_len <= len` were
            // searched with everything they could ever use; skip them.
            let hunt_from = match self.max_len {
                None => start,
                Some(m) => start.max((len + 1).saturating_sub(m)),
            };
            if hunt_from < end_excl {
                if let Some(i) = finder.find(&haystack[hunt_from..]) {
                    if hunt_from + i < end_excl {
                        return true;
                    }
                }
            }

            // A literal truncated by the buffer edge: the attempt there was
            // cut short, not refuted.
            let tail_from = len.saturating_sub(lit_len.saturating_sub(1)).max(start);
            for q in tail_from..end_excl.min(len) {
                if len - q < lit_len && finder.needle().starts_with(&haystack[q..]) {
                    return true;
                }
            }
        }
        false
    }
}

impl StreamMatcher for ApiMatcher {
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
        match self.re.captures_read_at(&mut self.locs, haystack, from) {
            Some(_) => {
                let found = found_from_locs(&self.locs);
                // The match may extend or be outranked while its own start,
                // or any earlier one, is still statically live.
                let may_change = found.end == len
                    || self.live_start_in(haystack.as_bytes(), from, found.start + 1);
                let safe_until = if self.live_start_in(haystack.as_bytes(), from, found.start) {
                    from
                } else {
                    found.start
                };
                Ok(Attempt {
                    found: Some(found),
                    hit_boundary: may_change,
                    may_change,
                    safe_until,
                })
            }
            None => {
                let hit_boundary =
                    from >= len || self.live_start_in(haystack.as_bytes(), from, len);
                // Without engine introspection the failed region can only be
                // flushed wholesale, and only when nothing in it is live.
                Ok(Attempt {
                    found: None,
                    hit_boundary,
                    may_change: false,
                    safe_until: if hit_boundary { from } else { len },
                })
            }
        }
    }

    fn group_count(&self) -> usize {
        self.re.captures_len()
    }
}
