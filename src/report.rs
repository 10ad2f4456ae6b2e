//! Per-call record of what cleaning removed.
//!
//! A report carries counts only. It never holds input text, so it is safe
//! to log at any level.

use std::fmt;

/// Why a node or attribute was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Disallowed element dropped, children kept
    Unwrapped,
    /// Disallowed element dropped with its content
    Removed,
    /// Attribute not in the allowlist
    Attribute,
    /// Attribute with a disallowed URI scheme
    Protocol,
    /// Comment dropped
    Comment,
    /// Node dropped or unwrapped by a transformer
    Transformer,
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Removal::Unwrapped => write!(f, "unwrapped"),
            Removal::Removed => write!(f, "removed"),
            Removal::Attribute => write!(f, "attribute"),
            Removal::Protocol => write!(f, "protocol"),
            Removal::Comment => write!(f, "comment"),
            Removal::Transformer => write!(f, "transformer"),
        }
    }
}

/// Counts of everything a clean call took out.
///
/// # Example
///
/// ```
/// use sanitize_policy::Policy;
///
/// let (html, report) = Policy::basic()
///     .clean_with_report(r#"<div onclick="x()"><a href="javascript:y()" id="l">z</a></div>"#)
///     .unwrap();
///
/// assert_eq!(html.as_str(), "\n<a rel=\"nofollow\">z</a>\n");
/// assert_eq!(report.elements_unwrapped, 1);
/// assert_eq!(report.attributes_removed, 1);
/// assert_eq!(report.protocols_rejected, 1);
/// assert!(!report.is_clean());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Disallowed elements whose children were kept
    pub elements_unwrapped: usize,
    /// Disallowed elements dropped together with their content
    pub elements_removed: usize,
    /// Attributes dropped for not being allowed on their element
    pub attributes_removed: usize,
    /// Allowed attributes dropped for carrying a disallowed URI scheme
    pub protocols_rejected: usize,
    /// Comments dropped
    pub comments_removed: usize,
    /// Nodes unwrapped or removed by a transformer
    pub transformer_removals: usize,
}

impl CleanReport {
    pub(crate) fn record(&mut self, removal: Removal, count: usize) {
        let slot = match removal {
            Removal::Unwrapped => &mut self.elements_unwrapped,
            Removal::Removed => &mut self.elements_removed,
            Removal::Attribute => &mut self.attributes_removed,
            Removal::Protocol => &mut self.protocols_rejected,
            Removal::Comment => &mut self.comments_removed,
            Removal::Transformer => &mut self.transformer_removals,
        };
        *slot += count;
    }

    /// Total number of removals of any kind.
    pub fn total(&self) -> usize {
        self.elements_unwrapped
            + self.elements_removed
            + self.attributes_removed
            + self.protocols_rejected
            + self.comments_removed
            + self.transformer_removals
    }

    /// Returns `true` if nothing was removed.
    ///
    /// Attributes added by the policy and transformer edits that do not
    /// remove anything are not counted, so a clean report does not imply
    /// that output equals input.
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for CleanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} {}={} {}={} {}={} {}={} {}={}",
            Removal::Unwrapped,
            self.elements_unwrapped,
            Removal::Removed,
            self.elements_removed,
            Removal::Attribute,
            self.attributes_removed,
            Removal::Protocol,
            self.protocols_rejected,
            Removal::Comment,
            self.comments_removed,
            Removal::Transformer,
            self.transformer_removals,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_adds_to_the_right_counter() {
        let mut report = CleanReport::default();
        report.record(Removal::Attribute, 2);
        report.record(Removal::Attribute, 1);
        report.record(Removal::Comment, 1);

        assert_eq!(report.attributes_removed, 3);
        assert_eq!(report.comments_removed, 1);
        assert_eq!(report.total(), 4);
        assert!(!report.is_clean());
    }

    #[test]
    fn default_is_clean() {
        assert!(CleanReport::default().is_clean());
    }

    #[test]
    fn display_is_stable() {
        let mut report = CleanReport::default();
        report.record(Removal::Unwrapped, 1);
        report.record(Removal::Protocol, 2);

        assert_eq!(
            report.to_string(),
            "unwrapped=1 removed=0 attribute=0 protocol=2 comment=0 transformer=0"
        );
    }
}
