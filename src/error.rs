/// Every error weir can produce. Construction-time misconfiguration is fatal
/// and never retried; a delegate matcher contradicting its contract is an
/// internal-invariant failure, surfaced rather than tolerated.
#[derive(Debug)]
pub enum WeirError {
    InvalidPattern {
        pattern: String,
        reason: String,
    },
    InvalidConfig {
        what: &'static str,
        reason: String,
    },
    /// Replacement template references a capture group the pattern lacks.
    InvalidTemplate {
        template: String,
        reason: String,
    },
    /// A delegate matcher violated the match outcome protocol (e.g. capture
    /// boundaries disagreeing with the reported match span).
    ProtocolViolation {
        detail: String,
    },
}

impl std::fmt::Display for WeirError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid pattern \"{pattern}\": {reason}")
            }
            Self::InvalidConfig { what, reason } => {
                write!(f, "invalid configuration ({what}): {reason}")
            }
            Self::InvalidTemplate { template, reason } => {
                write!(f, "invalid replacement template \"{template}\": {reason}")
            }
            Self::ProtocolViolation { detail } => {
                write!(f, "matcher protocol violation: {detail}")
            }
        }
    }
}

impl std::error::Error for WeirError {}

impl WeirError {
    /// Exit code for the CLI surface.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPattern { .. } | Self::InvalidTemplate { .. } => 3,
            Self::InvalidConfig { .. } => 4,
            Self::ProtocolViolation { .. } => 5,
        }
    }
}
