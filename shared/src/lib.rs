use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Beneficiary ID in format: "beneficiary::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: String,
    /// Given name (required; records without one are rejected at the I/O boundary)
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Birthdate used to derive the displayed age
    pub birthdate: Option<NaiveDate>,
    /// Accreditation number. `None` means the beneficiary is still
    /// waitlisted; legacy documents store junk ("NaN", floats) in this
    /// field, which reads as waitlisted too rather than invalidating the
    /// whole record.
    #[serde(default, deserialize_with = "lenient_accreditation")]
    pub accreditation_id: Option<u32>,
    /// Contact number for SMS notification
    pub phone: Option<String>,
    /// Storage path of the profile picture, resolved through the blob store
    pub photo_path: Option<String>,
    /// Soft-delete marker. `Some` means the record is in the trash and
    /// scheduled for purge; the actual purge is an external process.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Beneficiary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// A beneficiary is soft-deleted iff the expiration marker is set.
    pub fn is_deleted(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Age in whole years at `today`, if the birthdate is known.
    pub fn age_at(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birthdate?;
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }
}

fn lenient_accreditation<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| u32::try_from(n).ok()))
}

/// Volunteer profile. Volunteers are never waitlisted, so there is no
/// accreditation number on this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birthdate: Option<NaiveDate>,
    /// Contact address for email notification
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_path: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Volunteer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_deleted(&self) -> bool {
        self.expires_at.is_some()
    }
}

/// Scheduled event as stored in the events collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    /// Start instant. An event belongs to the calendar day it starts on.
    pub starts_at: DateTime<Utc>,
    /// End instant; may fall on a later civil day than the start.
    pub ends_at: DateTime<Utc>,
    /// Soft-delete marker, same semantics as on profiles.
    pub expires_at: Option<DateTime<Utc>>,
}

impl EventRecord {
    pub fn is_deleted(&self) -> bool {
        self.expires_at.is_some()
    }
}

/// Type of calendar cell for explicit rendering logic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CalendarDayType {
    /// Trailing day of the previous month shown before day 1 (grayed)
    PaddingBefore,
    /// Actual day within the displayed month
    MonthDay,
    /// Leading day of the next month filling out the last week (grayed)
    PaddingAfter,
}

/// A single cell of the month grid.
///
/// Padding cells carry their true day/month/year so that clicking one can
/// navigate the view to the adjacent month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub day_type: CalendarDayType,
    /// Events starting on this day (empty for days without events)
    pub events: Vec<EventRecord>,
}

impl CalendarDay {
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// One row of the month grid, always exactly seven cells
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarWeek {
    pub days: Vec<CalendarDay>,
}

/// Represents a calendar month laid out as complete weeks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonth {
    /// Month number, 1-12
    pub month: u32,
    pub year: i32,
    /// Weekday of day 1: 0 = Sunday, 1 = Monday, etc.
    pub first_day_of_week: u32,
    pub weeks: Vec<CalendarWeek>,
}

impl CalendarMonth {
    /// Iterate the grid cells in row order.
    pub fn cells(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flat_map(|w| w.days.iter())
    }
}

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Success,
    Error,
    Warning,
}

/// Fire-and-forget toast shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Minimal profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
}

/// Authentication state, passed explicitly into operations that need it.
///
/// `Unresolved` means the auth provider has not answered yet; `Anonymous`
/// means it answered with no signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Session {
    Unresolved,
    Anonymous,
    Authenticated(UserProfile),
}

impl Session {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Session::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

/// Formatted card for the generic record list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCard {
    pub id: String,
    /// Headline, usually the record's display name
    pub title: String,
    pub subtitle: String,
    /// Secondary lines shown under the subtitle
    pub detail_lines: Vec<String>,
    pub photo_path: Option<String>,
    /// Whole days until the scheduled purge, for trashed records
    pub days_until_purge: Option<i64>,
    /// Human-readable purge countdown ("purges in 12 days")
    pub purge_label: Option<String>,
}

/// Query parameters for roster listing endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterQuery {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashListResponse {
    pub cards: Vec<RecordCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreResponse {
    /// False when the restore was ignored because one was already pending
    pub restored: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beneficiary(birthdate: Option<NaiveDate>) -> Beneficiary {
        Beneficiary {
            id: "beneficiary::test".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Reyes".to_string(),
            birthdate,
            accreditation_id: None,
            phone: None,
            photo_path: None,
            expires_at: None,
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(beneficiary(None).full_name(), "Ana Reyes");
    }

    #[test]
    fn test_age_at_counts_whole_years() {
        let b = beneficiary(NaiveDate::from_ymd_opt(2015, 6, 15));
        // Day before the birthday vs. the birthday itself
        assert_eq!(b.age_at(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), Some(9));
        assert_eq!(b.age_at(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), Some(10));
        assert_eq!(beneficiary(None).age_at(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_deleted_iff_marker_set() {
        let mut b = beneficiary(None);
        assert!(!b.is_deleted());
        b.expires_at = Some(Utc::now());
        assert!(b.is_deleted());
    }

    #[test]
    fn test_nan_accreditation_reads_as_waitlisted() {
        let doc = serde_json::json!({
            "id": "beneficiary::1",
            "first_name": "Anna",
            "last_name": "Reyes",
            "birthdate": null,
            "accreditation_id": "NaN",
            "phone": null,
            "photo_path": null,
            "expires_at": null
        });
        let b: Beneficiary = serde_json::from_value(doc).unwrap();
        assert_eq!(b.accreditation_id, None);

        let doc = serde_json::json!({
            "id": "beneficiary::2",
            "first_name": "Ben",
            "last_name": "Cruz",
            "accreditation_id": 5,
            "expires_at": null
        });
        let b: Beneficiary = serde_json::from_value(doc).unwrap();
        assert_eq!(b.accreditation_id, Some(5));
    }

    #[test]
    fn test_session_user() {
        assert!(Session::Unresolved.user().is_none());
        assert!(Session::Anonymous.user().is_none());
        let session = Session::Authenticated(UserProfile {
            uid: "u1".to_string(),
            display_name: "Admin".to_string(),
        });
        assert_eq!(session.user().unwrap().uid, "u1");
    }
}
