//! Card list presentation logic.
//!
//! The beneficiary, volunteer and event screens all render the same kind
//! of card list; this module turns typed records into [`RecordCard`]
//! view-models so the rendering layer stays generic. Pure formatting,
//! independent of any UI framework.

use chrono::{DateTime, Utc};
use shared::{Beneficiary, EventRecord, RecordCard, Volunteer};

use crate::domain::records::SoftDeletable;

/// A record that can be presented as a card
pub trait CardSource: SoftDeletable {
    fn title(&self) -> String;
    fn subtitle(&self) -> String;
    fn detail_lines(&self) -> Vec<String>;
    fn photo_path(&self) -> Option<String> {
        None
    }
}

impl CardSource for Beneficiary {
    fn title(&self) -> String {
        self.full_name()
    }

    fn subtitle(&self) -> String {
        match self.accreditation_id {
            Some(id) => format!("Student #{}", id),
            None => "Waitlisted".to_string(),
        }
    }

    fn detail_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(phone) = &self.phone {
            lines.push(format!("📱 {}", phone));
        }
        lines
    }

    fn photo_path(&self) -> Option<String> {
        self.photo_path.clone()
    }
}

impl CardSource for Volunteer {
    fn title(&self) -> String {
        self.full_name()
    }

    fn subtitle(&self) -> String {
        "Volunteer".to_string()
    }

    fn detail_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(email) = &self.email {
            lines.push(format!("✉️ {}", email));
        }
        if let Some(phone) = &self.phone {
            lines.push(format!("📱 {}", phone));
        }
        lines
    }

    fn photo_path(&self) -> Option<String> {
        self.photo_path.clone()
    }
}

impl CardSource for EventRecord {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn subtitle(&self) -> String {
        self.location.clone()
    }

    fn detail_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} – {}",
            self.starts_at.format("%B %-d, %Y %H:%M"),
            self.ends_at.format("%B %-d, %Y %H:%M")
        )];
        if !self.description.trim().is_empty() {
            lines.push(self.description.clone());
        }
        lines
    }
}

/// Human-readable purge countdown for a trashed record
fn purge_label(days: i64) -> String {
    match days {
        d if d <= 0 => "purges today".to_string(),
        1 => "purges in 1 day".to_string(),
        d => format!("purges in {} days", d),
    }
}

/// Format a single record as a card.
pub fn format_card<T: CardSource>(record: &T, now: DateTime<Utc>) -> RecordCard {
    let days_until_purge = record.days_until_purge(now);
    RecordCard {
        id: record.id().to_string(),
        title: record.title(),
        subtitle: record.subtitle(),
        detail_lines: record.detail_lines(),
        photo_path: record.photo_path(),
        days_until_purge,
        purge_label: days_until_purge.map(purge_label),
    }
}

/// Format a whole list of records as cards, preserving order.
pub fn format_cards<T: CardSource>(records: &[T], now: DateTime<Utc>) -> Vec<RecordCard> {
    records.iter().map(|r| format_card(r, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-08-30T12:00:00Z".parse().unwrap()
    }

    fn beneficiary() -> Beneficiary {
        Beneficiary {
            id: "beneficiary::1".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Reyes".to_string(),
            birthdate: None,
            accreditation_id: Some(12),
            phone: Some("+63 900 000 0000".to_string()),
            photo_path: Some("profiles/ana.jpg".to_string()),
            expires_at: None,
        }
    }

    #[test]
    fn test_beneficiary_card() {
        let card = format_card(&beneficiary(), now());
        assert_eq!(card.title, "Ana Reyes");
        assert_eq!(card.subtitle, "Student #12");
        assert_eq!(card.photo_path.as_deref(), Some("profiles/ana.jpg"));
        assert!(card.purge_label.is_none());
    }

    #[test]
    fn test_waitlisted_subtitle() {
        let mut b = beneficiary();
        b.accreditation_id = None;
        assert_eq!(format_card(&b, now()).subtitle, "Waitlisted");
    }

    #[test]
    fn test_purge_countdown_label() {
        let mut b = beneficiary();
        b.expires_at = Some(now() + Duration::days(12));
        let card = format_card(&b, now());
        assert_eq!(card.days_until_purge, Some(12));
        assert_eq!(card.purge_label.as_deref(), Some("purges in 12 days"));

        b.expires_at = Some(now() + Duration::hours(30));
        assert_eq!(format_card(&b, now()).purge_label.as_deref(), Some("purges in 1 day"));

        b.expires_at = Some(now() + Duration::hours(3));
        assert_eq!(format_card(&b, now()).purge_label.as_deref(), Some("purges today"));
    }

    #[test]
    fn test_event_card_details() {
        let event = EventRecord {
            id: "event::1".to_string(),
            name: "River cleanup".to_string(),
            description: "Bring gloves".to_string(),
            location: "Pier 3".to_string(),
            starts_at: "2026-09-05T09:00:00Z".parse().unwrap(),
            ends_at: "2026-09-05T12:00:00Z".parse().unwrap(),
            expires_at: None,
        };
        let card = format_card(&event, now());
        assert_eq!(card.title, "River cleanup");
        assert_eq!(card.subtitle, "Pier 3");
        assert_eq!(card.detail_lines.len(), 2);
        assert!(card.detail_lines[0].starts_with("September 5, 2026"));
    }
}
