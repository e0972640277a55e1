//! Deterministic Plurality Voting
//!
//! Counts are kept in an ordered list of (value, count) pairs in first-seen
//! order, so ties always resolve to the value that appeared first.

/// Per-field plurality vote with case-insensitive matching
#[derive(Debug, Clone, Default)]
pub struct PluralityVote {
    /// (representative value, count), in first-seen order
    tallies: Vec<(String, usize)>,
}

impl PluralityVote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one ballot; blank values are ignored
    pub fn add(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match self
            .tallies
            .iter_mut()
            .find(|(seen, _)| seen.eq_ignore_ascii_case(value))
        {
            Some((_, count)) => *count += 1,
            None => self.tallies.push((value.to_string(), 1)),
        }
    }

    /// Highest count; earliest-seen wins ties
    pub fn winner(&self) -> Option<&str> {
        let mut best: Option<&(String, usize)> = None;
        for tally in &self.tallies {
            if best.is_none_or(|(_, count)| tally.1 > *count) {
                best = Some(tally);
            }
        }
        best.map(|(value, _)| value.as_str())
    }

    #[cfg(test)]
    fn tallies(&self) -> &[(String, usize)] {
        &self.tallies
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for PluralityVote {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut vote = Self::new();
        for value in iter {
            vote.add(value);
        }
        vote
    }
}

/// Longest candidate by character count; earliest wins ties
pub fn longest<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut best: Option<&str> = None;
    for candidate in candidates.into_iter().map(str::trim) {
        if candidate.is_empty() {
            continue;
        }
        if best.is_none_or(|b| candidate.chars().count() > b.chars().count()) {
            best = Some(candidate);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plurality_picks_majority() {
        let mut ballots = vec!["CLI"; 7];
        ballots.extend(["web"; 3]);
        let vote: PluralityVote = ballots.into_iter().collect();
        assert_eq!(vote.winner(), Some("CLI"));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let vote: PluralityVote = ["library", "CLI", "cli", "Library"].into_iter().collect();
        assert_eq!(vote.winner(), Some("library"));
    }

    #[test]
    fn test_case_insensitive_keeps_first_spelling() {
        let vote: PluralityVote = ["Rust", "rust", "RUST", "Go"].into_iter().collect();
        assert_eq!(vote.winner(), Some("Rust"));
        assert_eq!(vote.tallies(), &[("Rust".to_string(), 3), ("Go".to_string(), 1)]);
    }

    #[test]
    fn test_blank_ballots_ignored() {
        let vote: PluralityVote = ["", "  "].into_iter().collect();
        assert!(vote.is_empty());
        assert_eq!(vote.winner(), None);
    }

    #[test]
    fn test_longest_description() {
        let picked = longest(["A CLI.", "A command-line tool for X.", "Another tool for Y."]);
        assert_eq!(picked, Some("A command-line tool for X."));
        assert_eq!(longest(["same", "size"]), Some("same"));
        assert_eq!(longest([""]), None);
    }

    proptest! {
        #[test]
        fn prop_winner_has_max_count_and_is_first_among_ties(
            ballots in prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 1..50)
        ) {
            let vote: PluralityVote = ballots.iter().copied().collect();
            let winner = vote.winner().unwrap();

            let count = |v: &str| ballots.iter().filter(|b| **b == v).count();
            let max = ["a", "b", "c", "d"].iter().map(|v| count(v)).max().unwrap();
            prop_assert_eq!(count(winner), max);

            let first_with_max = ballots.iter().find(|b| count(b) == max).unwrap();
            prop_assert_eq!(winner, *first_with_max);
        }

        #[test]
        fn prop_vote_is_order_deterministic(
            ballots in prop::collection::vec("[a-c]{1,2}", 1..30)
        ) {
            let first: PluralityVote = ballots.iter().map(String::as_str).collect();
            let second: PluralityVote = ballots.iter().map(String::as_str).collect();
            prop_assert_eq!(first.winner(), second.winner());
        }
    }
}
