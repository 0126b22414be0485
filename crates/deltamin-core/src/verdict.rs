//! Verdicts produced by oracles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The outcome of testing one candidate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The condition under test reproduces.
    Fail,
    /// The condition under test does not reproduce.
    Pass,
    /// The test could not be decided (unrelated error, ambiguous timeout).
    ///
    /// Reducers treat this like [`Verdict::Pass`] when deciding, but count it
    /// separately so callers can spot flaky oracles.
    Unresolved,
}

impl Verdict {
    /// Returns true if the candidate still reproduces the failure.
    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail)
    }

    /// Returns true if the candidate definitely does not reproduce it.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Returns true if the oracle could not decide.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Verdict::Unresolved)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fail => write!(f, "fail"),
            Verdict::Pass => write!(f, "pass"),
            Verdict::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Per-kind verdict counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    /// Number of FAIL verdicts.
    pub fail: usize,
    /// Number of PASS verdicts.
    pub pass: usize,
    /// Number of UNRESOLVED verdicts.
    pub unresolved: usize,
}

impl VerdictCounts {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one verdict.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Fail => self.fail += 1,
            Verdict::Pass => self.pass += 1,
            Verdict::Unresolved => self.unresolved += 1,
        }
    }

    /// Total number of verdicts counted.
    pub fn total(&self) -> usize {
        self.fail + self.pass + self.unresolved
    }

    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: &VerdictCounts) {
        self.fail += other.fail;
        self.pass += other.pass;
        self.unresolved += other.unresolved;
    }
}

impl fmt::Display for VerdictCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fail, {} pass, {} unresolved",
            self.fail, self.pass, self.unresolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_predicates() {
        assert!(Verdict::Fail.is_fail());
        assert!(!Verdict::Pass.is_fail());
        assert!(!Verdict::Unresolved.is_fail());
        assert!(Verdict::Pass.is_pass());
        assert!(Verdict::Unresolved.is_unresolved());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Fail.to_string(), "fail");
        assert_eq!(Verdict::Pass.to_string(), "pass");
        assert_eq!(Verdict::Unresolved.to_string(), "unresolved");
    }

    #[test]
    fn test_counts() {
        let mut counts = VerdictCounts::new();
        counts.record(Verdict::Fail);
        counts.record(Verdict::Pass);
        counts.record(Verdict::Pass);
        counts.record(Verdict::Unresolved);

        assert_eq!(counts.fail, 1);
        assert_eq!(counts.pass, 2);
        assert_eq!(counts.unresolved, 1);
        assert_eq!(counts.total(), 4);

        let mut other = VerdictCounts::new();
        other.record(Verdict::Unresolved);
        counts.merge(&other);
        assert_eq!(counts.unresolved, 2);
        assert_eq!(counts.to_string(), "1 fail, 2 pass, 2 unresolved");
    }
}
