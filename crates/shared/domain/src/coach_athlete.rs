//! Coach-athlete link, the one entity whose ownership is time-windowed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Association granting a coach visibility over an athlete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachAthleteLink {
    pub coach_id: String,
    pub athlete_id: String,
    pub start_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "is_active")]
    pub is_active: bool,
    /// Soft delete timestamp (None = live)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CoachAthleteLink {
    /// Create an active, open-ended link starting at `start_date`
    pub fn new(
        coach_id: impl Into<String>,
        athlete_id: impl Into<String>,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            coach_id: coach_id.into(),
            athlete_id: athlete_id.into(),
            start_date,
            end_date: None,
            is_active: true,
            deleted_at: None,
        }
    }

    /// Close the window at `end_date` (exclusive)
    pub fn ending(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether `at` falls in `[start_date, end_date)`
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && self.end_date.map_or(true, |end| at < end)
    }

    /// Whether this link grants visibility at instant `at`
    pub fn grants_visibility(&self, at: DateTime<Utc>) -> bool {
        self.is_active && !self.is_archived() && self.window_contains(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_closed_window_is_half_open() {
        let link = CoachAthleteLink::new("c1", "a1", day(1)).ending(day(10));

        assert!(!link.grants_visibility(day(1) - Duration::seconds(1)));
        assert!(link.grants_visibility(day(1)));
        assert!(link.grants_visibility(day(9)));
        assert!(!link.grants_visibility(day(10)));
        assert!(!link.grants_visibility(day(20)));
    }

    #[test]
    fn test_open_ended_window() {
        let link = CoachAthleteLink::new("c1", "a1", day(1));
        assert!(link.grants_visibility(day(28)));
    }

    #[test]
    fn test_inactive_or_archived_link_grants_nothing() {
        let mut link = CoachAthleteLink::new("c1", "a1", day(1));
        link.is_active = false;
        assert!(!link.grants_visibility(day(5)));

        let mut link = CoachAthleteLink::new("c1", "a1", day(1));
        link.deleted_at = Some(day(2));
        assert!(!link.grants_visibility(day(5)));
    }

    #[test]
    fn test_document_field_names() {
        let link = CoachAthleteLink::new("c1", "a1", day(1));
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["coachId"], "c1");
        assert_eq!(value["athleteId"], "a1");
        assert_eq!(value["is_active"], true);
        assert!(value.get("endDate").is_none());
    }
}
