//! Slot calendar
//!
//! The fixed daily grid: eight two-hour slots, the 12:00–13:00 lunch hour
//! left out. Every session window must fit inside exactly one slot.
//!
//! | Slot | Window |
//! |------|--------|
//! | 1 | 06:00–08:00 |
//! | 2 | 08:00–10:00 |
//! | 3 | 10:00–12:00 |
//! | 4 | 13:00–15:00 |
//! | 5 | 15:00–17:00 |
//! | 6 | 17:00–19:00 |
//! | 7 | 19:00–21:00 |
//! | 8 | 21:00–23:00 |

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use shared::models::{PreferredWindow, Session};

/// (start hour, end hour) of slots 1..=8
const SLOT_HOURS: [(u32, u32); 8] = [
    (6, 8),
    (8, 10),
    (10, 12),
    (13, 15),
    (15, 17),
    (17, 19),
    (19, 21),
    (21, 23),
];

pub const SLOT_COUNT: u8 = SLOT_HOURS.len() as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimeSlot {
    fn from_hours(id: u8, (start, end): (u32, u32)) -> Self {
        Self {
            id,
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap_or(NaiveTime::MIN),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    /// Whether `[start, end)` lies inside this slot
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < end && start >= self.start_time && end <= self.end_time
    }
}

/// All slots in id order
pub fn all() -> impl Iterator<Item = TimeSlot> {
    SLOT_HOURS
        .iter()
        .enumerate()
        .map(|(i, hours)| TimeSlot::from_hours(i as u8 + 1, *hours))
}

pub fn slot(id: u8) -> Option<TimeSlot> {
    let index = usize::from(id).checked_sub(1)?;
    SLOT_HOURS
        .get(index)
        .map(|hours| TimeSlot::from_hours(id, *hours))
}

/// Slot containing the window, None when it straddles slots or the lunch hour
pub fn slot_for(start: NaiveTime, end: NaiveTime) -> Option<u8> {
    all().find(|s| s.contains(start, end)).map(|s| s.id)
}

pub fn slot_of(session: &Session) -> Option<u8> {
    slot_for(session.start_time, session.end_time)
}

/// Whether a session on `date` in `slot_id` satisfies a preferred window
pub fn matches_window(date: NaiveDate, slot_id: u8, window: &PreferredWindow) -> bool {
    window.slot_id == slot_id && window.weekday.is_none_or(|day| date.weekday() == day)
}

/// Sessions falling on `date` inside `slot_id`
pub fn sessions_in_slot<'a>(
    sessions: &'a [Session],
    date: NaiveDate,
    slot_id: u8,
) -> impl Iterator<Item = &'a Session> + 'a {
    sessions
        .iter()
        .filter(move |s| s.date == date && slot_of(s) == Some(slot_id))
}
