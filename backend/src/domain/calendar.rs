//! Calendar domain logic for the volunteer hub.
//!
//! This module contains all business logic related to the month grid:
//! date calculations, padding-day layout, event grouping by day, month
//! navigation and the minimized (single week) view. The UI only handles
//! presentation concerns; every calendar computation lives here.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{CalendarDay, CalendarDayType, CalendarMonth, CalendarWeek, EventRecord};
use tracing::{debug, info};

use crate::domain::records::load_active;
use crate::storage::{Notifier, RecordStore};

/// Transient view state for calendar navigation.
///
/// Invariant: whenever selection goes through [`CalendarService::select_day`],
/// `selected_date` belongs to the `month`/`year` being displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarState {
    /// Displayed month, 1-12
    pub month: u32,
    /// Displayed year
    pub year: i32,
    /// Currently selected day
    pub selected_date: NaiveDate,
    /// When true, only the week containing `selected_date` is shown
    pub minimized: bool,
}

impl CalendarState {
    /// Create calendar state focused on the given day.
    pub fn focused_on(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
            selected_date: date,
            minimized: false,
        }
    }
}

/// Calendar service that handles all calendar-related business logic
#[derive(Clone)]
pub struct CalendarService {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
}

impl CalendarService {
    pub fn new(store: Arc<dyn RecordStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Fetch active events and lay out the month grid.
    ///
    /// A fetch failure is reported to the user and yields an event-less
    /// grid; an individual event document that fails to parse is skipped
    /// and one aggregate warning is raised for the whole load cycle.
    pub async fn load_month(&self, month: u32, year: i32) -> Result<CalendarMonth> {
        info!("📅 Loading calendar month {}/{}", month, year);
        let events = load_active::<EventRecord>(self.store.as_ref(), self.notifier.as_ref()).await;
        Ok(self.build_grid(month, year, &events))
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: i32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Check if a year is a leap year
    pub fn is_leap_year(&self, year: i32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Get the weekday of day 1 of the month (0 = Sunday, 1 = Monday, etc.)
    pub fn first_day_of_month(&self, month: u32, year: i32) -> u32 {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
            date.weekday().num_days_from_sunday()
        } else {
            // Invalid date, fall back to Sunday
            0
        }
    }

    /// Get the human-readable name for a month number
    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    /// Lay out a month as complete 7-day weeks.
    ///
    /// Cells before day 1 show the trailing days of the previous month,
    /// cells after the last day show the leading days of the next month.
    /// Every cell carries its true day/month/year so that clicking a
    /// padding cell can navigate to the adjacent month.
    pub fn build_grid(&self, month: u32, year: i32, events: &[EventRecord]) -> CalendarMonth {
        let days_in_month = self.days_in_month(month, year);
        let first_day = self.first_day_of_month(month, year);

        debug!(
            "📅 Grid for {}/{}: {} days, first weekday {}",
            month, year, days_in_month, first_day
        );

        let mut cells = Vec::new();

        // Trailing days of the previous month before day 1
        let (prev_month, prev_year) = self.previous_month(month, year);
        let prev_len = self.days_in_month(prev_month, prev_year);
        for i in 0..first_day {
            cells.push(CalendarDay {
                day: prev_len - first_day + 1 + i,
                month: prev_month,
                year: prev_year,
                day_type: CalendarDayType::PaddingBefore,
                events: Vec::new(),
            });
        }

        // Days of the month itself
        for day in 1..=days_in_month {
            cells.push(CalendarDay {
                day,
                month,
                year,
                day_type: CalendarDayType::MonthDay,
                events: self.events_on_day(events, day, month, year),
            });
        }

        // Leading days of the next month, up to a whole number of weeks
        let (next_month, next_year) = self.next_month(month, year);
        let mut next_day = 1;
        while cells.len() % 7 != 0 {
            cells.push(CalendarDay {
                day: next_day,
                month: next_month,
                year: next_year,
                day_type: CalendarDayType::PaddingAfter,
                events: Vec::new(),
            });
            next_day += 1;
        }

        let weeks = cells
            .chunks(7)
            .map(|chunk| CalendarWeek { days: chunk.to_vec() })
            .collect();

        CalendarMonth {
            month,
            year,
            first_day_of_week: first_day,
            weeks,
        }
    }

    /// Events whose start instant falls on exactly the given civil day.
    ///
    /// This is equality on the start day, not range containment: an event
    /// spanning midnight appears only on the day it starts.
    pub fn events_on_day(
        &self,
        events: &[EventRecord],
        day: u32,
        month: u32,
        year: i32,
    ) -> Vec<EventRecord> {
        events
            .iter()
            .filter(|event| {
                let start = event.starts_at.date_naive();
                start.day() == day && start.month() == month && start.year() == year
            })
            .cloned()
            .collect()
    }

    /// Navigate to the previous month
    pub fn previous_month(&self, current_month: u32, current_year: i32) -> (u32, i32) {
        if current_month == 1 {
            (12, current_year - 1)
        } else {
            (current_month - 1, current_year)
        }
    }

    /// Navigate to the next month
    pub fn next_month(&self, current_month: u32, current_year: i32) -> (u32, i32) {
        if current_month == 12 {
            (1, current_year + 1)
        } else {
            (current_month + 1, current_year)
        }
    }

    /// Step the displayed month by one in either direction.
    ///
    /// Navigation always expands the view: the navigated month is not
    /// guaranteed to contain the previously visible week.
    pub fn advance_month(&self, state: &mut CalendarState, delta: i32) {
        let (month, year) = if delta >= 0 {
            self.next_month(state.month, state.year)
        } else {
            self.previous_month(state.month, state.year)
        };
        state.month = month;
        state.year = year;
        state.minimized = false;
        info!("📅 Navigated to {}/{}", state.month, state.year);
    }

    /// Select a grid cell.
    ///
    /// Selecting a padding cell first moves the displayed month/year to
    /// that cell's month (which expands a minimized view), then marks the
    /// day selected, keeping the state invariant intact.
    pub fn select_day(&self, state: &mut CalendarState, cell: &CalendarDay) {
        if cell.month != state.month || cell.year != state.year {
            state.month = cell.month;
            state.year = cell.year;
            state.minimized = false;
            info!("📅 Padding-day click navigated to {}/{}", state.month, state.year);
        }
        if let Some(date) = cell.date() {
            state.selected_date = date;
        }
    }

    /// Weeks to render for the current view mode.
    ///
    /// Minimized: only the week whose cells include the selected date
    /// (padding cells count). If no week matches, the full grid is
    /// returned unchanged.
    pub fn visible_weeks(
        &self,
        grid: &CalendarMonth,
        selected: NaiveDate,
        minimized: bool,
    ) -> Vec<CalendarWeek> {
        if !minimized {
            return grid.weeks.clone();
        }
        grid.weeks
            .iter()
            .find(|week| week.days.iter().any(|d| d.date() == Some(selected)))
            .map(|week| vec![week.clone()])
            .unwrap_or_else(|| grid.weeks.clone())
    }

    /// Format a start instant for display ("September 5, 2026")
    pub fn format_day(&self, instant: DateTime<Utc>) -> String {
        let date = instant.date_naive();
        format!("{} {}, {}", self.month_name(date.month()), date.day(), date.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, RecordingNotifier};
    use serde_json::json;
    use shared::NotificationLevel;

    fn service() -> CalendarService {
        CalendarService::new(Arc::new(MemoryStore::new()), Arc::new(RecordingNotifier::new()))
    }

    fn event(id: &str, starts_at: &str, ends_at: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            name: format!("Event {}", id),
            description: String::new(),
            location: "Community hall".to_string(),
            starts_at: starts_at.parse().unwrap(),
            ends_at: ends_at.parse().unwrap(),
            expires_at: None,
        }
    }

    #[test]
    fn test_days_in_month() {
        let service = service();
        assert_eq!(service.days_in_month(1, 2025), 31);
        assert_eq!(service.days_in_month(4, 2025), 30);
        assert_eq!(service.days_in_month(2, 2025), 28);
        assert_eq!(service.days_in_month(2, 2024), 29);
    }

    #[test]
    fn test_is_leap_year() {
        let service = service();
        assert!(!service.is_leap_year(2025));
        assert!(service.is_leap_year(2024));
        assert!(!service.is_leap_year(1900)); // Divisible by 100 but not 400
        assert!(service.is_leap_year(2000)); // Divisible by 400
    }

    #[test]
    fn test_first_day_of_month() {
        let service = service();
        assert_eq!(service.first_day_of_month(6, 2025), 0); // June 2025 starts Sunday
        assert_eq!(service.first_day_of_month(11, 2025), 6); // November 2025 starts Saturday
        assert_eq!(service.first_day_of_month(2, 2024), 4); // February 2024 starts Thursday
        assert_eq!(service.first_day_of_month(2, 2025), 6); // February 2025 starts Saturday
    }

    #[test]
    fn test_grid_is_whole_weeks() {
        let service = service();
        for (month, year) in [(6, 2025), (11, 2025), (2, 2024), (2, 2025), (12, 2026)] {
            let grid = service.build_grid(month, year, &[]);
            for week in &grid.weeks {
                assert_eq!(week.days.len(), 7, "{}/{} has a ragged week", month, year);
            }
        }
    }

    #[test]
    fn test_grid_march_2026_31_day_month_starting_sunday() {
        // Starts on a Sunday, so no leading padding at all
        let service = service();
        let grid = service.build_grid(3, 2026, &[]);
        assert_eq!(grid.first_day_of_week, 0);
        // 31 cells padded to 35
        assert_eq!(grid.weeks.len(), 5);
        assert_eq!(grid.weeks[0].days[0].day, 1);
        assert_eq!(grid.weeks[0].days[0].day_type, CalendarDayType::MonthDay);
        // Trailing padding: April 1-4
        let last = &grid.weeks[4].days[6];
        assert_eq!((last.day, last.month, last.year), (4, 4, 2026));
        assert_eq!(last.day_type, CalendarDayType::PaddingAfter);
    }

    #[test]
    fn test_grid_july_2025_31_day_month() {
        let service = service();
        let grid = service.build_grid(7, 2025, &[]);
        // July 2025 starts on a Tuesday: two leading June days
        assert_eq!(grid.first_day_of_week, 2);
        let first = &grid.weeks[0].days[0];
        assert_eq!((first.day, first.month, first.year), (29, 6, 2025));
        assert_eq!(first.day_type, CalendarDayType::PaddingBefore);
        // 2 + 31 = 33 cells, padded to 35
        assert_eq!(grid.weeks.len(), 5);
        let last = &grid.weeks[4].days[6];
        assert_eq!((last.day, last.month, last.year), (2, 8, 2025));
    }

    #[test]
    fn test_grid_november_2025_30_day_month_starting_saturday() {
        let service = service();
        let grid = service.build_grid(11, 2025, &[]);
        assert_eq!(grid.first_day_of_week, 6);
        // 6 + 30 = 36 cells, padded to 42
        assert_eq!(grid.weeks.len(), 6);
        // Leading padding is October 26-31
        let first = &grid.weeks[0].days[0];
        assert_eq!((first.day, first.month), (26, 10));
        // Trailing padding is December 1-6
        let last = &grid.weeks[5].days[6];
        assert_eq!((last.day, last.month), (6, 12));
    }

    #[test]
    fn test_grid_february_leap_and_non_leap() {
        let service = service();

        // February 2024: leap year, starts Thursday, 4 + 29 = 33 -> 5 weeks
        let leap = service.build_grid(2, 2024, &[]);
        assert_eq!(leap.weeks.len(), 5);
        let month_days: Vec<u32> = leap
            .cells()
            .filter(|c| c.day_type == CalendarDayType::MonthDay)
            .map(|c| c.day)
            .collect();
        assert_eq!(month_days.len(), 29);
        assert_eq!(*month_days.last().unwrap(), 29);

        // February 2025: non-leap, starts Saturday, 6 + 28 = 34 -> 5 weeks
        let plain = service.build_grid(2, 2025, &[]);
        assert_eq!(plain.weeks.len(), 5);
        assert_eq!(
            plain
                .cells()
                .filter(|c| c.day_type == CalendarDayType::MonthDay)
                .count(),
            28
        );
        // Single trailing padding day: March 1
        let last = &plain.weeks[4].days[6];
        assert_eq!((last.day, last.month, last.day_type), (1, 3, CalendarDayType::PaddingAfter));
    }

    #[test]
    fn test_advance_month_wraps_year() {
        let service = service();
        assert_eq!(service.next_month(12, 2025), (1, 2026));
        assert_eq!(service.previous_month(1, 2025), (12, 2024));

        let mut state = CalendarState::focused_on(NaiveDate::from_ymd_opt(2025, 12, 10).unwrap());
        service.advance_month(&mut state, 1);
        assert_eq!((state.month, state.year), (1, 2026));
        service.advance_month(&mut state, -1);
        service.advance_month(&mut state, -1);
        assert_eq!((state.month, state.year), (11, 2025));
    }

    #[test]
    fn test_navigation_expands_minimized_view() {
        let service = service();
        let mut state = CalendarState::focused_on(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
        state.minimized = true;
        service.advance_month(&mut state, 1);
        assert!(!state.minimized);
    }

    #[test]
    fn test_selecting_trailing_padding_day_navigates() {
        let service = service();
        let mut state = CalendarState::focused_on(NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
        state.minimized = true;

        // The grayed "Aug 1" at the end of July's grid
        let grid = service.build_grid(7, 2025, &[]);
        let filler = grid
            .cells()
            .find(|c| c.day_type == CalendarDayType::PaddingAfter && c.day == 1)
            .unwrap()
            .clone();

        service.select_day(&mut state, &filler);
        assert_eq!((state.month, state.year), (8, 2025));
        assert_eq!(state.selected_date, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert!(!state.minimized);
    }

    #[test]
    fn test_selecting_month_day_keeps_view() {
        let service = service();
        let mut state = CalendarState::focused_on(NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
        state.minimized = true;

        let grid = service.build_grid(7, 2025, &[]);
        let cell = grid
            .cells()
            .find(|c| c.day_type == CalendarDayType::MonthDay && c.day == 20)
            .unwrap()
            .clone();

        service.select_day(&mut state, &cell);
        assert_eq!((state.month, state.year), (7, 2025));
        assert_eq!(state.selected_date, NaiveDate::from_ymd_opt(2025, 7, 20).unwrap());
        // Selecting inside the month does not expand the view
        assert!(state.minimized);
    }

    #[test]
    fn test_visible_weeks_minimized() {
        let service = service();
        let grid = service.build_grid(6, 2025, &[]);

        let selected = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let weeks = service.visible_weeks(&grid, selected, true);
        assert_eq!(weeks.len(), 1);
        assert!(weeks[0].days.iter().any(|d| d.date() == Some(selected)));

        // Expanded view returns everything
        assert_eq!(service.visible_weeks(&grid, selected, false).len(), 5);

        // Selection outside the grid falls back to the full month
        let stray = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(service.visible_weeks(&grid, stray, true).len(), 5);
    }

    #[test]
    fn test_events_on_day_matches_start_day_only() {
        let service = service();
        let events = vec![
            event("1", "2026-09-05T09:00:00Z", "2026-09-05T12:00:00Z"),
            // Spans midnight: starts the 5th, ends the 6th
            event("2", "2026-09-05T22:00:00Z", "2026-09-06T02:00:00Z"),
            event("3", "2026-09-06T10:00:00Z", "2026-09-06T11:00:00Z"),
        ];

        let on_fifth = service.events_on_day(&events, 5, 9, 2026);
        assert_eq!(on_fifth.len(), 2);

        // The midnight-spanning event does not appear on its end day
        let on_sixth = service.events_on_day(&events, 6, 9, 2026);
        assert_eq!(on_sixth.len(), 1);
        assert_eq!(on_sixth[0].id, "3");
    }

    #[test]
    fn test_grid_marks_event_days() {
        let service = service();
        let events = vec![event("1", "2026-09-05T09:00:00Z", "2026-09-05T12:00:00Z")];
        let grid = service.build_grid(9, 2026, &events);

        let day5 = grid
            .cells()
            .find(|c| c.day == 5 && c.day_type == CalendarDayType::MonthDay)
            .unwrap();
        assert!(day5.has_events());
        assert_eq!(
            grid.cells()
                .filter(|c| c.day_type == CalendarDayType::MonthDay && c.has_events())
                .count(),
            1
        );
    }

    #[test]
    fn test_month_name() {
        let service = service();
        assert_eq!(service.month_name(1), "January");
        assert_eq!(service.month_name(12), "December");
        assert_eq!(service.month_name(13), "Invalid Month");
    }

    #[test]
    fn test_format_day() {
        let service = service();
        let instant = "2026-09-05T09:00:00Z".parse().unwrap();
        assert_eq!(service.format_day(instant), "September 5, 2026");
    }

    #[tokio::test]
    async fn test_load_month_skips_bad_documents_with_one_warning() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        store.insert_document(
            "events",
            json!({
                "id": "event::1",
                "name": "River cleanup",
                "description": "",
                "location": "Pier 3",
                "starts_at": "2026-09-05T09:00:00Z",
                "ends_at": "2026-09-05T12:00:00Z",
                "expires_at": null
            }),
        );
        // Two malformed documents, but only one aggregate warning
        store.insert_document("events", json!({"id": "event::2", "name": "Broken"}));
        store.insert_document("events", json!({"id": "event::3"}));

        let service = CalendarService::new(store, notifier.clone());
        let grid = service.load_month(9, 2026).await.unwrap();

        assert_eq!(
            grid.cells().filter(|c| c.has_events()).count(),
            1
        );
        let notes = notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Warning);
    }

    #[tokio::test]
    async fn test_load_month_fetch_failure_reports_error() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        store.fail_next_fetch();

        let service = CalendarService::new(store, notifier.clone());
        let grid = service.load_month(6, 2025).await.unwrap();

        assert!(grid.cells().all(|c| !c.has_events()));
        let notes = notifier.take();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Error);
        assert!(notes[0].message.contains("events"));
    }
}
