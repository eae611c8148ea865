//! Season interval checks shared by every rate table.
//!
//! Seasons are closed intervals of calendar days: a rate running 1–10 June and one
//! starting 10 June overlap on the 10th.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition};
use serde_json::json;

use crate::error::RepositoryError;

/// Inclusive `[from, to]` range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl SeasonRange {
    /// Builds a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, RepositoryError> {
        if from > to {
            return Err(RepositoryError::validation_with_details(
                "season_from must be on or before season_to",
                json!({
                    "season_from": from.to_string(),
                    "season_to": to.to_string(),
                }),
            ));
        }
        Ok(Self { from, to })
    }

    /// Range read back from a stored row. Rows are validated on write.
    pub(crate) fn stored(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Classic interval intersection test: `a.from <= b.to && b.from <= a.to`.
    pub fn overlaps(&self, other: &SeasonRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    /// Query condition matching stored rows whose season intersects `self`.
    ///
    /// Expressed as three alternatives: the new season starts inside an existing one,
    /// ends inside one, or swallows one whole. Together they are equivalent to
    /// [`SeasonRange::overlaps`].
    pub fn overlap_condition<C: ColumnTrait>(&self, existing_from: C, existing_to: C) -> Condition {
        let starts_within = Condition::all()
            .add(existing_from.lte(self.from))
            .add(existing_to.gte(self.from));
        let ends_within = Condition::all()
            .add(existing_from.lte(self.to))
            .add(existing_to.gte(self.to));
        let contains_existing = Condition::all()
            .add(existing_from.gte(self.from))
            .add(existing_to.lte(self.to));

        Condition::any()
            .add(starts_within)
            .add(ends_within)
            .add(contains_existing)
    }

    /// Evaluates the three clauses of [`SeasonRange::overlap_condition`] in memory.
    pub fn matches_overlap_clauses(&self, existing: &SeasonRange) -> bool {
        let starts_within = existing.from <= self.from && self.from <= existing.to;
        let ends_within = existing.from <= self.to && self.to <= existing.to;
        let contains_existing = self.from <= existing.from && self.to >= existing.to;
        starts_within || ends_within || contains_existing
    }
}

/// Conflict raised when a season collides with an active rate.
pub fn overlap_conflict(id: uuid::Uuid, existing: &SeasonRange) -> RepositoryError {
    RepositoryError::conflict(
        format!(
            "Season overlaps an existing active rate ({} to {})",
            existing.from, existing.to
        ),
        Some(json!({
            "id": id,
            "season_from": existing.from.to_string(),
            "season_to": existing.to.to_string(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn range(from: u32, to: u32) -> SeasonRange {
        SeasonRange::new(day(from), day(to)).unwrap()
    }

    fn assert_relation(a: SeasonRange, b: SeasonRange, expected: bool) {
        assert_eq!(a.overlaps(&b), expected, "{a:?} vs {b:?}");
        assert_eq!(b.overlaps(&a), expected, "symmetry {b:?} vs {a:?}");
        assert_eq!(a.matches_overlap_clauses(&b), expected, "clauses {a:?} vs {b:?}");
        assert_eq!(b.matches_overlap_clauses(&a), expected, "clauses {b:?} vs {a:?}");
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = SeasonRange::new(day(10), day(1)).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[test]
    fn test_single_day_range_allowed() {
        let single = range(5, 5);
        assert_eq!(single.from(), single.to());
    }

    #[test]
    fn test_before_and_after_do_not_overlap() {
        assert_relation(range(1, 5), range(7, 10), false);
    }

    #[test]
    fn test_adjacent_days_do_not_overlap() {
        // 1-5 then 6-10 leaves no shared day
        assert_relation(range(1, 5), range(6, 10), false);
    }

    #[test]
    fn test_meets_on_shared_boundary_overlaps() {
        assert_relation(range(1, 5), range(5, 10), true);
    }

    #[test]
    fn test_partial_overlap() {
        assert_relation(range(1, 6), range(4, 10), true);
    }

    #[test]
    fn test_starts() {
        assert_relation(range(1, 4), range(1, 10), true);
    }

    #[test]
    fn test_during() {
        assert_relation(range(3, 6), range(1, 10), true);
    }

    #[test]
    fn test_finishes() {
        assert_relation(range(6, 10), range(1, 10), true);
    }

    #[test]
    fn test_equals() {
        assert_relation(range(1, 10), range(1, 10), true);
    }

    #[test]
    fn test_clauses_agree_with_predicate_exhaustively() {
        for a_from in 1..=6 {
            for a_to in a_from..=6 {
                for b_from in 1..=6 {
                    for b_to in b_from..=6 {
                        let a = range(a_from, a_to);
                        let b = range(b_from, b_to);
                        assert_eq!(a.overlaps(&b), a.matches_overlap_clauses(&b));
                    }
                }
            }
        }
    }

    #[test]
    fn test_conflict_details_carry_existing_range() {
        let id = uuid::Uuid::new_v4();
        let err = overlap_conflict(id, &range(1, 10));

        match err {
            RepositoryError::Conflict { details, .. } => {
                let details = details.unwrap();
                assert_eq!(details["id"], json!(id));
                assert_eq!(details["season_from"], "2026-06-01");
                assert_eq!(details["season_to"], "2026-06-10");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
