//! Pluggable match policies for spans and mention graphs.
//!
//! Exactly one [`SpanMatchPolicy`] and one [`MentionMatchPolicy`] are
//! selected per evaluation run and applied uniformly to every gold/test
//! pair. Span policies compare the *aggregate* span of each annotation
//! (min start to max end over its span list), not individual fragments.

use crate::{Error, Result, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How two aggregate spans must relate for a gold/test pair to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanMatchPolicy {
    /// Identical start and end.
    Strict,
    /// Any overlap (half-open; touching endpoints do not match).
    Overlap,
    /// Identical start, end ignored.
    SharedStart,
    /// Identical end, start ignored.
    SharedEnd,
    /// Identical start or identical end.
    SharedStartOrEnd,
    /// One span fully contains the other, in either direction.
    SubSpan,
    /// Spans are ignored entirely; every pair passes.
    IgnoreSpan,
}

impl SpanMatchPolicy {
    /// Apply the policy to two aggregate spans.
    #[must_use]
    pub fn matches(&self, a: &Span, b: &Span) -> bool {
        match self {
            SpanMatchPolicy::Strict => a.start() == b.start() && a.end() == b.end(),
            SpanMatchPolicy::Overlap => a.overlaps(b),
            SpanMatchPolicy::SharedStart => a.start() == b.start(),
            SpanMatchPolicy::SharedEnd => a.end() == b.end(),
            SpanMatchPolicy::SharedStartOrEnd => a.start() == b.start() || a.end() == b.end(),
            SpanMatchPolicy::SubSpan => a.contains(b) || b.contains(a),
            SpanMatchPolicy::IgnoreSpan => true,
        }
    }

    /// Canonical policy name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanMatchPolicy::Strict => "Strict",
            SpanMatchPolicy::Overlap => "Overlap",
            SpanMatchPolicy::SharedStart => "SharedStart",
            SpanMatchPolicy::SharedEnd => "SharedEnd",
            SpanMatchPolicy::SharedStartOrEnd => "SharedStartOrEnd",
            SpanMatchPolicy::SubSpan => "SubSpan",
            SpanMatchPolicy::IgnoreSpan => "IgnoreSpan",
        }
    }
}

impl fmt::Display for SpanMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpanMatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SpanMatchPolicy::Strict),
            "overlap" => Ok(SpanMatchPolicy::Overlap),
            "sharedstart" => Ok(SpanMatchPolicy::SharedStart),
            "sharedend" => Ok(SpanMatchPolicy::SharedEnd),
            "sharedstartorend" => Ok(SpanMatchPolicy::SharedStartOrEnd),
            "subspan" => Ok(SpanMatchPolicy::SubSpan),
            "ignorespan" => Ok(SpanMatchPolicy::IgnoreSpan),
            other => Err(Error::parse(format!("unknown span match policy: {other}"))),
        }
    }
}

/// How mention graphs must relate for a gold/test pair to match.
///
/// `Identical` is the only policy today: structural equivalence of the two
/// root mention graphs (see [`crate::mention::MentionGraph::signature`]).
/// The enum is non-exhaustive so looser policies can be added without a
/// breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum MentionMatchPolicy {
    /// Structurally equivalent mention graphs.
    #[default]
    Identical,
}

impl MentionMatchPolicy {
    /// Canonical policy name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MentionMatchPolicy::Identical => "Identical",
        }
    }
}

impl fmt::Display for MentionMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MentionMatchPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "identical" => Ok(MentionMatchPolicy::Identical),
            other => Err(Error::parse(format!(
                "unknown mention match policy: {other}"
            ))),
        }
    }
}
