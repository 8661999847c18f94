//! Match outcome protocol: what a regex engine must report, per attempt, to
//! participate in streaming.
//!
//! A single attempt over a partially-available stream cannot just say
//! "match" or "no match" — it must also say whether that answer could still
//! change if more characters arrived. Two delegate adapters implement the
//! contract: [`dfa::DfaMatcher`] reads the signals straight out of a
//! walkable DFA, [`api::ApiMatcher`] reconstructs conservative versions of
//! them from static pattern analysis. Swapping one for the other never
//! changes output, only how much input is buffered before deciding.

pub(crate) mod api;
pub(crate) mod dfa;

use regex::{CaptureLocations, Regex, RegexBuilder};

use crate::error::WeirError;

/// Byte span `(start, end)` within the window.
pub type Span = (usize, usize);

/// Result of one match attempt over the buffered characters.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub found: Option<Found>,
    /// The search was cut short by the edge of buffered characters — not a
    /// definitive "no match exists".
    pub hit_boundary: bool,
    /// A positive result could still change (extend, or be superseded by a
    /// match at an earlier, currently unresolved start) given more input.
    pub may_change: bool,
    /// No match can start below this position, no matter what input arrives.
    /// Even an inconclusive attempt usually proves a prefix dead; reporting
    /// it lets the engine finalize that prefix instead of re-buffering it,
    /// which is what keeps the window near one growth chunk.
    pub safe_until: usize,
}

/// A concrete match: boundaries plus capture groups, group 0 first.
/// `None` entries are groups that did not participate in the match.
#[derive(Debug, Clone)]
pub struct Found {
    pub start: usize,
    pub end: usize,
    pub groups: Vec<Option<Span>>,
}

/// Regex dialect flags, opaque to the engine, passed through to whichever
/// delegate compiles the pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dialect {
    pub case_insensitive: bool,
    pub dot_matches_new_line: bool,
    pub multi_line: bool,
}

/// Which delegate adapter to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatcherKind {
    /// DFA adapter when the pattern compiles to one, API adapter otherwise.
    #[default]
    Auto,
    Dfa,
    Api,
}

/// The contract a delegate regex engine satisfies to drive streaming.
///
/// The full haystack, including already-finalized context below `from`, is
/// visible to the attempt; a reported match must *start* in
/// `[from, haystack.len())`. When `end_of_input` is true no further
/// characters will ever arrive and adapters answer exactly, with both
/// signals false.
pub trait StreamMatcher {
    fn attempt(
        &mut self,
        haystack: &str,
        from: usize,
        end_of_input: bool,
    ) -> Result<Attempt, WeirError>;

    /// Capture group count, group 0 included. Used to validate replacement
    /// templates at construction.
    fn group_count(&self) -> usize;
}

impl std::fmt::Debug for dyn StreamMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamMatcher").finish_non_exhaustive()
    }
}

/// Compile `pattern` into the configured delegate. One matcher instance per
/// stream — delegates carry per-attempt scratch state and are never shared.
pub(crate) fn select(
    pattern: &str,
    dialect: Dialect,
    kind: MatcherKind,
) -> Result<Box<dyn StreamMatcher>, WeirError> {
    match kind {
        MatcherKind::Api => Ok(Box::new(api::ApiMatcher::new(pattern, dialect)?)),
        MatcherKind::Dfa => Ok(Box::new(dfa::DfaMatcher::new(pattern, dialect)?)),
        MatcherKind::Auto => match dfa::DfaMatcher::new(pattern, dialect) {
            Ok(m) => Ok(Box::new(m)),
            // Pattern the DFA cannot express (or too large to determinize) —
            // the API adapter handles the full syntax.
            Err(_) => Ok(Box::new(api::ApiMatcher::new(pattern, dialect)?)),
        },
    }
}

/// Compile the public-API regex both adapters use for captures.
pub(crate) fn compile_api(pattern: &str, dialect: Dialect) -> Result<Regex, WeirError> {
    RegexBuilder::new(pattern)
        .case_insensitive(dialect.case_insensitive)
        .dot_matches_new_line(dialect.dot_matches_new_line)
        .multi_line(dialect.multi_line)
        .build()
        .map_err(|e| WeirError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Exact whole-buffer attempt. Used by every adapter once end-of-stream is
/// reached: nothing can change any more, so the answer is final.
pub(crate) fn exact_attempt(
    re: &Regex,
    locs: &mut CaptureLocations,
    haystack: &str,
    from: usize,
) -> Attempt {
    match re.captures_read_at(locs, haystack, from) {
        None => Attempt {
            found: None,
            hit_boundary: false,
            may_change: false,
            safe_until: haystack.len(),
        },
        Some(_) => {
            let found = found_from_locs(locs);
            let safe_until = found.start;
            Attempt {
                found: Some(found),
                hit_boundary: false,
                may_change: false,
                safe_until,
            }
        }
    }
}

pub(crate) fn found_from_locs(locs: &CaptureLocations) -> Found {
    let (start, end) = locs.get(0).expect("group 0 always participates");
    Found {
        start,
        end,
        groups: (0..locs.len()).map(|i| locs.get(i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_attempt_reports_groups() {
        let re = compile_api(r"(\w+)=(\d+)?", Dialect::default()).unwrap();
        let mut locs = re.capture_locations();
        let a = exact_attempt(&re, &mut locs, "key=42", 0);
        let found = a.found.unwrap();
        assert_eq!((found.start, found.end), (0, 6));
        assert_eq!(found.groups, vec![Some((0, 6)), Some((0, 3)), Some((4, 6))]);
        assert!(!a.hit_boundary);
        assert!(!a.may_change);
    }

    #[test]
    fn exact_attempt_optional_group_absent() {
        let re = compile_api(r"(\w+)=(\d+)?", Dialect::default()).unwrap();
        let mut locs = re.capture_locations();
        let a = exact_attempt(&re, &mut locs, "key=", 0);
        let found = a.found.unwrap();
        assert_eq!(found.groups[2], None);
    }

    #[test]
    fn select_falls_back_for_unicode_word_boundary() {
        // Heuristic \b support may or may not determinize; Auto must always
        // produce some working matcher.
        let m = select(r"\bword\b", Dialect::default(), MatcherKind::Auto);
        assert!(m.is_ok());
    }

    #[test]
    fn bad_pattern_is_a_construction_error() {
        let err = select(r"(unclosed", Dialect::default(), MatcherKind::Auto).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
