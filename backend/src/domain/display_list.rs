//! Display-list derivation: filter → sort → search.
//!
//! Pure and idempotent; the input slice is never mutated and the result
//! is rebuilt from scratch on every call, so callers can re-derive on
//! any state change without hidden memoization semantics. Used by the
//! roster screens and the trash registry alike.

use chrono::{DateTime, Datelike, Utc};
use shared::{Beneficiary, EventRecord, Volunteer};

use crate::domain::records::SoftDeletable;

/// Filter predicates for beneficiary lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeneficiaryFilter {
    #[default]
    All,
    /// Accreditation number assigned
    Students,
    /// No accreditation number yet
    Waitlisted,
}

impl BeneficiaryFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "students" => Some(Self::Students),
            "waitlisted" | "waitlist" => Some(Self::Waitlisted),
            _ => None,
        }
    }

    fn matches(&self, b: &Beneficiary) -> bool {
        match self {
            Self::All => true,
            Self::Students => b.accreditation_id.is_some(),
            Self::Waitlisted => b.accreditation_id.is_none(),
        }
    }
}

/// Filter predicates for event lists, relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Ended before now
    Done,
    /// Now falls within start..=end
    Ongoing,
    /// Starts after now
    Pending,
}

impl EventFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "done" => Some(Self::Done),
            "ongoing" => Some(Self::Ongoing),
            "pending" => Some(Self::Pending),
            _ => None,
        }
    }

    fn matches(&self, e: &EventRecord, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Done => e.ends_at < now,
            Self::Ongoing => e.starts_at <= now && now <= e.ends_at,
            Self::Pending => e.starts_at > now,
        }
    }
}

/// Sort keys for beneficiary/volunteer lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSort {
    FirstName,
    LastName,
    /// Ascending age; unknown birthdates sort last
    Age,
    /// Ascending accreditation number; waitlisted (missing) sort last
    AccreditationId,
    /// Soonest-purging first; records without a marker sort last
    DaysUntilPurge,
}

impl ProfileSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first_name" | "name" => Some(Self::FirstName),
            "last_name" => Some(Self::LastName),
            "age" => Some(Self::Age),
            "accreditation" | "accreditation_id" => Some(Self::AccreditationId),
            "purge" | "days_until_purge" => Some(Self::DaysUntilPurge),
            _ => None,
        }
    }
}

/// Sort keys for event lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSort {
    Name,
    StartDate,
    /// Soonest-purging first; records without a marker sort last
    DaysUntilPurge,
}

impl EventSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "start" | "start_date" => Some(Self::StartDate),
            "purge" | "days_until_purge" => Some(Self::DaysUntilPurge),
            _ => None,
        }
    }
}

/// Split a search query into lowercase terms on whitespace and commas.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Multi-term AND match: every term must be a substring of at least one
/// searchable field, case-insensitively.
pub fn matches_terms(fields: &[String], terms: &[String]) -> bool {
    terms
        .iter()
        .all(|term| fields.iter().any(|field| field.to_lowercase().contains(term)))
}

fn beneficiary_fields(b: &Beneficiary) -> Vec<String> {
    let mut fields = vec![b.first_name.clone(), b.last_name.clone()];
    if let Some(id) = b.accreditation_id {
        fields.push(id.to_string());
    }
    fields
}

fn volunteer_fields(v: &Volunteer) -> Vec<String> {
    vec![v.first_name.clone(), v.last_name.clone()]
}

fn event_fields(e: &EventRecord) -> Vec<String> {
    vec![e.name.clone(), e.location.clone()]
}

/// Derive the beneficiary display list: filter, then sort, then search.
pub fn derive_beneficiaries(
    records: &[Beneficiary],
    filter: BeneficiaryFilter,
    sort: Option<ProfileSort>,
    search: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Beneficiary> {
    let mut list: Vec<Beneficiary> = records.iter().filter(|b| filter.matches(b)).cloned().collect();

    if let Some(sort) = sort {
        let today = now.date_naive();
        match sort {
            ProfileSort::FirstName => list.sort_by_key(|b| b.first_name.to_lowercase()),
            ProfileSort::LastName => list.sort_by_key(|b| b.last_name.to_lowercase()),
            ProfileSort::Age => {
                list.sort_by_key(|b| {
                    let age = b.age_at(today);
                    (age.is_none(), age.unwrap_or(0))
                });
            }
            ProfileSort::AccreditationId => {
                list.sort_by_key(|b| (b.accreditation_id.is_none(), b.accreditation_id.unwrap_or(0)));
            }
            ProfileSort::DaysUntilPurge => {
                list.sort_by_key(|b| {
                    let days = b.days_until_purge(now);
                    (days.is_none(), days.unwrap_or(0))
                });
            }
        }
    }

    if let Some(query) = search {
        let terms = search_terms(query);
        if !terms.is_empty() {
            list.retain(|b| matches_terms(&beneficiary_fields(b), &terms));
        }
    }

    list
}

/// Derive the volunteer display list. Volunteers have no waitlist, so
/// there is no filter dimension.
pub fn derive_volunteers(
    records: &[Volunteer],
    sort: Option<ProfileSort>,
    search: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<Volunteer> {
    let mut list: Vec<Volunteer> = records.to_vec();

    if let Some(sort) = sort {
        let today = now.date_naive();
        match sort {
            ProfileSort::FirstName => list.sort_by_key(|v| v.first_name.to_lowercase()),
            ProfileSort::LastName => list.sort_by_key(|v| v.last_name.to_lowercase()),
            ProfileSort::Age => {
                list.sort_by_key(|v| {
                    let age = v.birthdate.map(|birth| {
                        let mut age = today.year() - birth.year();
                        if (today.month(), today.day()) < (birth.month(), birth.day()) {
                            age -= 1;
                        }
                        age.max(0) as u32
                    });
                    (age.is_none(), age.unwrap_or(0))
                });
            }
            // Volunteers carry no accreditation number; leave order as-is
            ProfileSort::AccreditationId => {}
            ProfileSort::DaysUntilPurge => {
                list.sort_by_key(|v| {
                    let days = v.days_until_purge(now);
                    (days.is_none(), days.unwrap_or(0))
                });
            }
        }
    }

    if let Some(query) = search {
        let terms = search_terms(query);
        if !terms.is_empty() {
            list.retain(|v| matches_terms(&volunteer_fields(v), &terms));
        }
    }

    list
}

/// Derive the event display list: filter, then sort, then search.
pub fn derive_events(
    records: &[EventRecord],
    filter: EventFilter,
    sort: Option<EventSort>,
    search: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<EventRecord> {
    let mut list: Vec<EventRecord> = records
        .iter()
        .filter(|e| filter.matches(e, now))
        .cloned()
        .collect();

    if let Some(sort) = sort {
        match sort {
            EventSort::Name => list.sort_by_key(|e| e.name.to_lowercase()),
            EventSort::StartDate => list.sort_by_key(|e| e.starts_at),
            EventSort::DaysUntilPurge => {
                list.sort_by_key(|e| {
                    let days = e.days_until_purge(now);
                    (days.is_none(), days.unwrap_or(0))
                });
            }
        }
    }

    if let Some(query) = search {
        let terms = search_terms(query);
        if !terms.is_empty() {
            list.retain(|e| matches_terms(&event_fields(e), &terms));
        }
    }

    list
}
