#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,   // Rust naming conventions
    clippy::must_use_candidate,        // streaming calls are used for their effects
    clippy::missing_errors_doc,        // construction errors documented on WeirError
    clippy::missing_panics_doc,        // internal invariants, not caller panics
)]

//! Streaming regex find-and-replace.
//!
//! Transforms an unbounded character stream against a regex while holding
//! only a small, bounded window of it in memory — and produces exactly the
//! output that matching the fully materialized stream would. The hard part
//! is deciding, per position, whether a match can be trusted yet: greedy
//! repetition, alternation priority, and end anchors can all change their
//! outcome when more input arrives, so the engine only accepts a match once
//! its delegate matcher asserts the result is settled (or the stream ends).
//!
//! ```no_run
//! use std::io::Read;
//!
//! let rw = weir::Rewriter::new("edit stream", "modify stream")?;
//! let mut reader = weir::RewriteReader::new(std::io::stdin().lock(), rw);
//! let mut out = String::new();
//! reader.read_to_string(&mut out)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod error;
pub mod io;
pub mod matcher;
pub mod replace;
pub mod stats;
pub(crate) mod window;

pub use engine::{DEFAULT_GROWTH_CHUNK, Decision, Options, Rewriter};
pub use error::WeirError;
pub use io::{RewriteReader, RewriteWriter};
pub use matcher::{Attempt, Dialect, Found, MatcherKind, Span, StreamMatcher};
pub use replace::{Flow, Replacement, Replacer, Template};
pub use stats::{StepObserver, WindowStats};

/// One-shot convenience: rewrite a fully materialized string. Exists for
/// small inputs and tests; the streaming surface is the point of the crate.
pub fn rewrite(pattern: &str, template: &str, input: &str) -> Result<String, WeirError> {
    rewrite_with(pattern, template, input, &Options::default())
}

pub fn rewrite_with(
    pattern: &str,
    template: &str,
    input: &str,
    options: &Options,
) -> Result<String, WeirError> {
    let mut rw = Rewriter::with_options(pattern, template, options)?;
    rw.feed(input);
    rw.end_of_stream();
    let mut out = String::new();
    loop {
        let done = rw.pump()?;
        out.push_str(&rw.drain_finalized());
        if done {
            return Ok(out);
        }
    }
}
