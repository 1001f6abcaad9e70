// src/oncall.rs - Time-of-day on-call windows for mobile recipients

use chrono::{Local, Timelike};

use crate::directory::{MobileEntry, User};

/// Encode an `HH:MM` clock time as `hours * 1000 + minutes`.
///
/// This convention is shared with the externally stored recipient
/// configuration, so the literal arithmetic matters: 23:00 is 23000, not
/// a second count. Returns `None` for anything that does not parse as a
/// valid clock time.
pub fn clock_value(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.split_once(':')?;
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 1000 + minutes)
}

/// Current wall-clock time encoded with [`clock_value`] semantics.
pub fn now_clock_value() -> u32 {
    let now = Local::now();
    now.hour() * 1000 + now.minute()
}

/// Half-open `[from, to)` on-call window over encoded clock values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnCallWindow {
    from: u32,
    to: u32,
}

impl OnCallWindow {
    /// Parse a window from a mobile entry's `HH:MM` bounds.
    pub fn parse(entry: &MobileEntry) -> Option<Self> {
        let from = clock_value(&entry.from_time)?;
        let mut to = clock_value(&entry.to_time)?;
        // "00:00" as an end bound means end of day.
        if to == 0 {
            to = 24 * 1000;
        }
        Some(Self { from, to })
    }

    /// Whether `now` falls inside the window.
    ///
    /// A window whose end precedes its start wraps past midnight; a
    /// window with equal bounds never matches.
    pub fn matches(&self, now: u32) -> bool {
        if self.from == self.to {
            false
        } else if self.to < self.from {
            now < self.to || now >= self.from
        } else {
            self.from <= now && now < self.to
        }
    }
}

/// Select the mobile entry to deliver to: the first one whose on-call
/// window covers `now`. Entries with unparseable bounds are skipped.
///
/// Selection is kept separate from the on-call predicate so filtering an
/// otherwise shared user record has no side effects.
pub fn select_mobile(user: &User, now: u32) -> Option<&MobileEntry> {
    user.mobile
        .iter()
        .find(|entry| OnCallWindow::parse(entry).is_some_and(|w| w.matches(now)))
}

/// Whether the user has any mobile number on call at `now`.
pub fn is_on_call(user: &User, now: u32) -> bool {
    select_mobile(user, now).is_some()
}
