//! Slot signatures, scopes, and instructional-unit breakdowns.
//!
//! The slot signature is the canonical overlap key for the whole engine: the
//! conflict detector and the faculty scheduler both delegate their interval
//! reasoning to [`SlotSignature::overlaps`].

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// When a session occurs within a week: day of week plus an ordered period
/// range. Periods are 1-based; the occupied range is `[start, start + span)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotSignature {
    /// Day of the week the session repeats on.
    pub day: Weekday,
    /// First occupied period (1-based).
    pub start_period: u8,
    /// Number of consecutive periods occupied (>= 1).
    pub span: u8,
}

impl SlotSignature {
    pub fn new(day: Weekday, start_period: u8, span: u8) -> Self {
        Self {
            day,
            start_period,
            span,
        }
    }

    /// One past the last occupied period.
    pub fn end_period(&self) -> u8 {
        self.start_period.saturating_add(self.span)
    }

    /// Half-open intersection test over the period ranges. The caller is
    /// responsible for first establishing that both slots fall on the same
    /// calendar date; two slots on different days never overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day
            && self.start_period < other.end_period()
            && other.start_period < self.end_period()
    }

    /// The shared period window of two overlapping slots, if any.
    pub fn overlap_range(&self, other: &Self) -> Option<(u8, u8)> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start_period.max(other.start_period);
        let end = self.end_period().min(other.end_period());
        Some((start, end))
    }
}

impl std::fmt::Display for SlotSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.span == 1 {
            write!(f, "{:?} period {}", self.day, self.start_period)
        } else {
            write!(
                f,
                "{:?} periods {}-{}",
                self.day,
                self.start_period,
                self.end_period() - 1
            )
        }
    }
}

/// The (academic year, degree, term) triple that bounds a conflict-detection
/// pass. Used as the key of the detector's derived cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    /// Academic year code, e.g. "2026-27".
    pub academic_year: String,
    /// Degree code, e.g. "BTECH".
    pub degree: String,
    /// Term (semester) number within the degree.
    pub term: u8,
}

impl Scope {
    pub fn new(academic_year: impl Into<String>, degree: impl Into<String>, term: u8) -> Self {
        Self {
            academic_year: academic_year.into(),
            degree: degree.into(),
            term,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/T{}", self.academic_year, self.degree, self.term)
    }
}

/// The student cohort a session serves. Two sessions addressing the same
/// cohort compete for the same students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CohortScope {
    /// Admission batch year, e.g. 2024.
    pub batch_year: i32,
    /// Semester the cohort is currently in.
    pub semester: u8,
    /// Branch code, e.g. "CSE".
    pub branch: String,
}

impl CohortScope {
    pub fn new(batch_year: i32, semester: u8, branch: impl Into<String>) -> Self {
        Self {
            batch_year,
            semester,
            branch: branch.into(),
        }
    }
}

impl std::fmt::Display for CohortScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-S{}", self.batch_year, self.branch, self.semester)
    }
}

/// Instructional unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Lecture,
    Tutorial,
    Practical,
    Studio,
}

impl UnitType {
    pub const ALL: [UnitType; 4] = [
        UnitType::Lecture,
        UnitType::Tutorial,
        UnitType::Practical,
        UnitType::Studio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Lecture => "lecture",
            UnitType::Tutorial => "tutorial",
            UnitType::Practical => "practical",
            UnitType::Studio => "studio",
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-type instructional unit counts for a session or a quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitBreakdown {
    #[serde(default)]
    pub lecture: u16,
    #[serde(default)]
    pub tutorial: u16,
    #[serde(default)]
    pub practical: u16,
    #[serde(default)]
    pub studio: u16,
}

impl UnitBreakdown {
    pub fn lectures(count: u16) -> Self {
        Self {
            lecture: count,
            ..Default::default()
        }
    }

    pub fn get(&self, unit_type: UnitType) -> u16 {
        match unit_type {
            UnitType::Lecture => self.lecture,
            UnitType::Tutorial => self.tutorial,
            UnitType::Practical => self.practical,
            UnitType::Studio => self.studio,
        }
    }

    pub fn set(&mut self, unit_type: UnitType, count: u16) {
        match unit_type {
            UnitType::Lecture => self.lecture = count,
            UnitType::Tutorial => self.tutorial = count,
            UnitType::Practical => self.practical = count,
            UnitType::Studio => self.studio = count,
        }
    }

    /// Total unit count across all types.
    pub fn total(&self) -> u32 {
        self.lecture as u32 + self.tutorial as u32 + self.practical as u32 + self.studio as u32
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn slot(day: Weekday, start: u8, span: u8) -> SlotSignature {
        SlotSignature::new(day, start, span)
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        let a = slot(Weekday::Mon, 1, 2); // periods 1-2
        let b = slot(Weekday::Mon, 3, 2); // periods 3-4
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_shared_boundary_period_overlaps() {
        let a = slot(Weekday::Mon, 1, 2); // periods 1-2
        let b = slot(Weekday::Mon, 2, 2); // periods 2-3
        assert!(a.overlaps(&b));
        assert_eq!(a.overlap_range(&b), Some((2, 3)));
    }

    #[test]
    fn test_different_days_never_overlap() {
        let a = slot(Weekday::Mon, 1, 4);
        let b = slot(Weekday::Tue, 1, 4);
        assert!(!a.overlaps(&b));
        assert_eq!(a.overlap_range(&b), None);
    }

    #[test]
    fn test_containment_overlaps() {
        let outer = slot(Weekday::Fri, 1, 6);
        let inner = slot(Weekday::Fri, 3, 1);
        assert!(outer.overlaps(&inner));
        assert_eq!(outer.overlap_range(&inner), Some((3, 4)));
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(slot(Weekday::Mon, 2, 1).to_string(), "Mon period 2");
        assert_eq!(slot(Weekday::Wed, 1, 3).to_string(), "Wed periods 1-3");
    }

    #[test]
    fn test_unit_breakdown_total_and_get() {
        let units = UnitBreakdown {
            lecture: 2,
            tutorial: 1,
            practical: 0,
            studio: 0,
        };
        assert_eq!(units.total(), 3);
        assert_eq!(units.get(UnitType::Lecture), 2);
        assert_eq!(units.get(UnitType::Practical), 0);
        assert!(!units.is_empty());
        assert!(UnitBreakdown::default().is_empty());
    }

    #[test]
    fn test_scope_equality_and_display() {
        let a = Scope::new("2026-27", "BTECH", 5);
        let b = Scope::new("2026-27", "BTECH", 5);
        let c = Scope::new("2025-26", "BTECH", 5);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "2026-27/BTECH/T5");
    }
}
