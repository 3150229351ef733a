use diffnote_core::Severity;
use diffnote_difflens::matcher::MappedIssue;

/// Number of issues at each severity.
///
/// # Examples
///
/// ```
/// use diffnote_core::Severity;
/// use diffnote_review::severity::SeverityCounts;
///
/// let counts = SeverityCounts::from_severities([Severity::Info, Severity::Minor, Severity::Critical]);
/// assert_eq!(counts.count(Severity::Critical), 1);
/// assert_eq!(counts.count(Severity::Blocker), 0);
/// assert!(counts.is_blocking(Severity::Critical));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    counts: [usize; Severity::ASCENDING.len()],
}

impl SeverityCounts {
    /// Count the given severities.
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut counts = Self::default();
        for severity in severities {
            counts.counts[usize::from(severity.rank())] += 1;
        }
        counts
    }

    /// Count the severities of mapped issues.
    pub fn from_issues(issues: &[MappedIssue]) -> Self {
        Self::from_severities(issues.iter().map(|i| i.finding.severity))
    }

    /// Issues at exactly `level`.
    pub fn count(&self, level: Severity) -> usize {
        self.counts[usize::from(level.rank())]
    }

    /// Issues at any level.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `true` when any issue is at or above `threshold`.
    pub fn is_blocking(&self, threshold: Severity) -> bool {
        Severity::ASCENDING
            .iter()
            .filter(|s| s.meets_threshold(threshold))
            .any(|&s| self.count(s) > 0)
    }

    /// Non-zero levels with their counts, most severe first.
    pub fn most_severe_first(&self) -> impl Iterator<Item = (Severity, usize)> + '_ {
        Severity::ASCENDING
            .iter()
            .rev()
            .map(|&s| (s, self.count(s)))
            .filter(|&(_, n)| n > 0)
    }
}

/// Sort issues least severe first, keeping input order within a level.
pub fn sort_ascending(issues: &mut [MappedIssue]) {
    issues.sort_by_key(|i| i.finding.severity);
}
