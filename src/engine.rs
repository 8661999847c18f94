//! The stream transform engine: repeated match attempts against the window,
//! accept/defer/advance decisions, splicing, and the safe-emission boundary.
//!
//! `step` is the whole control surface. It never blocks and never touches
//! I/O; the caller owns the read/write loop and reacts to the returned
//! [`Decision`]. The invariant that makes streaming safe: a match is only
//! accepted when the delegate matcher asserts its result could no longer
//! change — or end-of-stream has made that a certainty. Everything below the
//! committed cursor is final output and is never revisited.

use crate::error::WeirError;
use crate::matcher::{Dialect, MatcherKind, StreamMatcher, select};
use crate::replace::{Flow, Replacer, Template};
use crate::stats::StepObserver;
use crate::window::Window;

/// Default refill increment, in characters.
pub const DEFAULT_GROWTH_CHUNK: usize = 2048;

/// Construction-time configuration.
#[derive(Debug, Clone)]
pub struct Options {
    pub case_insensitive: bool,
    pub dot_matches_new_line: bool,
    pub multi_line: bool,
    /// Finalized characters retained before the scan position as context
    /// for backward-looking assertions. Patterns using `\b`, or `^` in
    /// multi-line mode, need at least 1.
    pub lookbehind: usize,
    /// Characters requested per refill. Larger chunks mean fewer
    /// read round-trips and a proportionally larger resident window.
    pub growth_chunk: usize,
    pub engine: MatcherKind,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            case_insensitive: false,
            dot_matches_new_line: false,
            multi_line: false,
            lookbehind: 0,
            growth_chunk: DEFAULT_GROWTH_CHUNK,
            engine: MatcherKind::Auto,
        }
    }
}

impl Options {
    fn dialect(&self) -> Dialect {
        Dialect {
            case_insensitive: self.case_insensitive,
            dot_matches_new_line: self.dot_matches_new_line,
            multi_line: self.multi_line,
        }
    }
}

/// Outcome of one engine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A match was accepted and substituted. Step again immediately — more
    /// matches may exist in the modified window. Scanning resumes at `scan`,
    /// strictly after the inserted text.
    Replaced { scan: usize },
    /// No further match can start below `index` with the characters seen so
    /// far; the finalized prefix is ready to drain. Fetch more input, or
    /// step again after `end_of_stream` to finish.
    AdvanceSafeTo { index: usize },
    /// Inconclusive: append at least `min` characters before retrying.
    NeedMoreInput { min: usize },
    /// End of stream reached, everything finalized. Drain and discard.
    Done,
}

/// One streaming find-and-replace over one stream. Created per stream,
/// dropped with it; owns its window and its delegate matcher exclusively.
pub struct Rewriter {
    window: Window,
    matcher: Box<dyn StreamMatcher>,
    replacer: Box<dyn Replacer>,
    growth_chunk: usize,
    end_of_stream: bool,
    /// Replacement requested early stop: remaining input passes through.
    halted: bool,
    /// Set after accepting a match while the scan cursor still sits at its
    /// end: an empty match exactly there must be skipped, not re-replaced.
    /// Matches whole-buffer `replace_all` iteration semantics.
    empty_guard: bool,
    observer: Option<Box<dyn StepObserver>>,
}

impl std::fmt::Debug for Rewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rewriter")
            .field("growth_chunk", &self.growth_chunk)
            .field("end_of_stream", &self.end_of_stream)
            .field("halted", &self.halted)
            .field("empty_guard", &self.empty_guard)
            .finish_non_exhaustive()
    }
}

impl Rewriter {
    /// Pattern + replacement template, default options.
    pub fn new(pattern: &str, template: &str) -> Result<Self, WeirError> {
        Self::with_options(pattern, template, &Options::default())
    }

    pub fn with_options(
        pattern: &str,
        template: &str,
        options: &Options,
    ) -> Result<Self, WeirError> {
        let matcher = select(pattern, options.dialect(), options.engine)?;
        let template = Template::parse(template, matcher.group_count())?;
        Self::assemble(matcher, Box::new(template), options)
    }

    /// Pattern + arbitrary computed replacement.
    pub fn with_replacer(
        pattern: &str,
        replacer: Box<dyn Replacer>,
        options: &Options,
    ) -> Result<Self, WeirError> {
        let matcher = select(pattern, options.dialect(), options.engine)?;
        Self::assemble(matcher, replacer, options)
    }

    /// Custom delegate matcher + replacement, the fully-injected form.
    pub fn with_matcher(
        matcher: Box<dyn StreamMatcher>,
        replacer: Box<dyn Replacer>,
        options: &Options,
    ) -> Result<Self, WeirError> {
        Self::assemble(matcher, replacer, options)
    }

    fn assemble(
        matcher: Box<dyn StreamMatcher>,
        replacer: Box<dyn Replacer>,
        options: &Options,
    ) -> Result<Self, WeirError> {
        if options.growth_chunk == 0 {
            return Err(WeirError::InvalidConfig {
                what: "growth_chunk",
                reason: "must be at least 1 character".to_string(),
            });
        }
        Ok(Rewriter {
            window: Window::new(options.lookbehind),
            matcher,
            replacer,
            growth_chunk: options.growth_chunk,
            end_of_stream: false,
            halted: false,
            empty_guard: false,
            observer: None,
        })
    }

    /// Observe every step (statistics, diagnostics). At most one observer.
    pub fn set_observer(&mut self, observer: Box<dyn StepObserver>) {
        self.observer = Some(observer);
    }

    /// Append newly read characters to the window.
    pub fn feed(&mut self, chars: &str) {
        debug_assert!(!self.end_of_stream, "feed after end_of_stream");
        self.window.append(chars);
    }

    /// The source is exhausted and will never yield more characters.
    pub fn end_of_stream(&mut self) {
        self.end_of_stream = true;
    }

    /// Return finalized characters, exactly once, compacting the window.
    pub fn drain_finalized(&mut self) -> String {
        self.window.drain_finalized()
    }

    /// One decision over the currently buffered characters.
    pub fn step(&mut self) -> Result<Decision, WeirError> {
        let decision = self.decide()?;
        if let Some(observer) = &mut self.observer {
            observer.on_step(self.window.len(), &decision);
        }
        Ok(decision)
    }

    fn decide(&mut self) -> Result<Decision, WeirError> {
        if self.halted {
            // Pass-through: everything buffered is final as-is.
            let index = self.window.len();
            let moved = index > self.window.committed();
            self.window.finalize_to(index);
            return Ok(if self.end_of_stream {
                Decision::Done
            } else if moved {
                Decision::AdvanceSafeTo { index }
            } else {
                Decision::NeedMoreInput {
                    min: self.growth_chunk,
                }
            });
        }

        // Nothing buffered beyond the scan position: no attempt can tell us
        // anything new until more characters arrive.
        if !self.end_of_stream && self.window.scan() >= self.window.len() {
            return Ok(Decision::NeedMoreInput {
                min: self.growth_chunk,
            });
        }

        let attempt =
            self.matcher
                .attempt(self.window.as_str(), self.window.scan(), self.end_of_stream)?;

        match attempt.found {
            // An empty match sitting exactly where the previous match ended
            // is not re-replaced: scanning moves one character along instead,
            // the same forward-progress rule whole-buffer replace_all uses.
            Some(m)
                if (self.end_of_stream || !attempt.may_change)
                    && m.start == m.end
                    && m.start == self.window.scan()
                    && self.empty_guard =>
            {
                match self.window.as_str()[m.start..].chars().next() {
                    Some(c) => {
                        self.empty_guard = false;
                        self.window.set_scan(m.start + c.len_utf8());
                        self.decide()
                    }
                    None if self.end_of_stream => {
                        self.halted = true;
                        self.decide()
                    }
                    // The character to step over has not arrived yet.
                    None => Ok(Decision::NeedMoreInput {
                        min: self.growth_chunk,
                    }),
                }
            }
            Some(m) if self.end_of_stream || !attempt.may_change => {
                let replacement = self.replacer.replace(self.window.as_str(), &m);
                let was_empty = m.start == m.end;
                self.window.splice(m.start, m.end, &replacement.text);
                let after = m.start + replacement.text.len();
                self.window.finalize_to(after);
                self.empty_guard = true;
                if replacement.flow == Flow::Halt {
                    self.halted = true;
                } else if was_empty {
                    // Never retry an empty match at the position it matched:
                    // resume one character later. An empty match flush at the
                    // very end of input only happens once end-of-stream made
                    // it final, so there is nothing left to scan.
                    self.empty_guard = false;
                    match self.window.as_str()[after..].chars().next() {
                        Some(c) => self.window.set_scan(after + c.len_utf8()),
                        None => {
                            debug_assert!(self.end_of_stream);
                            self.halted = true;
                        }
                    }
                }
                Ok(Decision::Replaced {
                    scan: self.window.scan(),
                })
            }
            // A match that could still grow, or be outranked by an earlier
            // unresolved start. Not at end of stream, so wait — after
            // flushing whatever prefix the attempt proved dead.
            Some(_) => {
                self.advance_safe(attempt.safe_until);
                Ok(Decision::NeedMoreInput {
                    min: self.growth_chunk,
                })
            }
            None if attempt.hit_boundary && !self.end_of_stream => {
                self.advance_safe(attempt.safe_until);
                Ok(Decision::NeedMoreInput {
                    min: self.growth_chunk,
                })
            }
            None => {
                // Definitive: nothing can start in the scanned region.
                let index = self.window.len();
                self.window.finalize_to(index);
                self.empty_guard = false;
                if self.end_of_stream {
                    Ok(Decision::Done)
                } else {
                    Ok(Decision::AdvanceSafeTo { index })
                }
            }
        }
    }

    /// Finalize the prefix an inconclusive attempt proved dead. This is what
    /// keeps the resident window near lookbehind + pending match + one
    /// chunk instead of accumulating refused prefixes.
    fn advance_safe(&mut self, safe_until: usize) {
        if safe_until > self.window.scan() {
            self.window.finalize_to(safe_until);
            self.empty_guard = false;
        }
    }

    /// Step until input is needed or the stream is finished. Returns true
    /// once `Done` was reached.
    pub(crate) fn pump(&mut self) -> Result<bool, WeirError> {
        loop {
            match self.step()? {
                Decision::Replaced { .. } | Decision::AdvanceSafeTo { .. } => {}
                Decision::NeedMoreInput { .. } => return Ok(false),
                Decision::Done => return Ok(true),
            }
        }
    }
}
