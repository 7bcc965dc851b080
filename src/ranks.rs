//! Rank ladder and promotion eligibility.
//!
//! Ranks form a fixed 15-step seniority ladder. Eligibility for the next
//! rank is never stored on a record; it is re-derived on every read from
//! the time elapsed since the last rank change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de};
use std::fmt;

/// The fixed seniority ladder, lowest rank first.
pub const RANK_LADDER: [&str; 15] = [
    "Private",
    "Lance Corporal",
    "Junior Sergeant",
    "Sergeant",
    "Senior Sergeant",
    "Sergeant Major",
    "Warrant Officer",
    "Junior Lieutenant",
    "Lieutenant",
    "Senior Lieutenant",
    "Captain",
    "Major",
    "Lieutenant Colonel",
    "Colonel",
    "General",
];

/// A position on the seniority ladder.
///
/// Stored as an index so bands and ordering fall out of integer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(usize);

impl Rank {
    /// Lowest rank, assigned to fresh recruits.
    pub const PRIVATE: Rank = Rank(0);

    /// Look up a rank by ladder index.
    pub fn from_index(index: usize) -> Option<Rank> {
        (index < RANK_LADDER.len()).then_some(Rank(index))
    }

    /// Look up a rank by its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Rank> {
        RANK_LADDER
            .iter()
            .position(|r| r.eq_ignore_ascii_case(name))
            .map(Rank)
    }

    /// Ladder index of this rank (0 = Private, 14 = General).
    pub fn index(&self) -> usize {
        self.0
    }

    /// Display name of this rank.
    pub fn name(&self) -> &'static str {
        RANK_LADDER[self.0]
    }

    /// Required whole days in rank before the next promotion is due.
    ///
    /// `None` for the officer-and-above band (index 10+), which is never
    /// evaluated automatically.
    pub fn required_wait_days(&self) -> Option<i64> {
        match self.0 {
            0..=1 => Some(2),
            2..=3 => Some(3),
            4..=6 => Some(7),
            7..=9 => Some(10),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Rank {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Rank::from_name(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown rank: {name}")))
    }
}

/// Whether a promotion is due for `rank`, given the date of the last rank
/// change and the evaluation time.
///
/// Pure and total over all valid ranks. Elapsed time is floored to whole
/// days; a future `last_rank_change` is simply not yet due.
pub fn is_promotion_due(rank: Rank, last_rank_change: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let Some(required) = rank.required_wait_days() else {
        return false;
    };
    let elapsed_days = (now - last_rank_change).num_days();
    elapsed_days >= required
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-01-10T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn ladder_has_fifteen_ranks() {
        assert_eq!(RANK_LADDER.len(), 15);
        assert_eq!(Rank::PRIVATE.name(), "Private");
        assert_eq!(Rank::from_index(14).unwrap().name(), "General");
        assert!(Rank::from_index(15).is_none());
    }

    #[test]
    fn rank_lookup_is_case_insensitive() {
        assert_eq!(Rank::from_name("sergeant"), Rank::from_index(3));
        assert_eq!(Rank::from_name("SENIOR SERGEANT"), Rank::from_index(4));
        assert!(Rank::from_name("Field Marshal").is_none());
    }

    #[test]
    fn enlisted_band_requires_two_days() {
        let rank = Rank::from_index(0).unwrap();
        assert!(!is_promotion_due(rank, now() - Duration::days(1), now()));
        assert!(is_promotion_due(rank, now() - Duration::days(2), now()));
        assert!(is_promotion_due(rank, now() - Duration::days(30), now()));
    }

    #[test]
    fn junior_nco_band_boundary_at_three_days() {
        // Junior Sergeant (index 2) is due at exactly three days in rank.
        let rank = Rank::from_index(2).unwrap();
        assert!(is_promotion_due(rank, now() - Duration::days(3), now()));
        assert!(!is_promotion_due(
            rank,
            now() - Duration::days(2) - Duration::hours(23),
            now()
        ));
    }

    #[test]
    fn officer_band_is_never_due() {
        for index in 10..15 {
            let rank = Rank::from_index(index).unwrap();
            assert!(!is_promotion_due(rank, now() - Duration::days(10_000), now()));
        }
    }

    #[test]
    fn partial_days_are_floored() {
        // 1 day 23 hours elapses only one whole day.
        let rank = Rank::from_index(1).unwrap();
        let last = now() - Duration::days(1) - Duration::hours(23);
        assert!(!is_promotion_due(rank, last, now()));
    }

    #[test]
    fn future_rank_change_is_not_due() {
        let rank = Rank::PRIVATE;
        assert!(!is_promotion_due(rank, now() + Duration::days(5), now()));
    }
}
