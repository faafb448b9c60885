//! Relative timestamp labels for gallery cards.

use chrono::{DateTime, Days, FixedOffset, Local, Utc};

/// Source of the reference instant used for "Today"/"Yesterday" labels.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Format `timestamp` relative to `now`, in `now`'s timezone.
///
/// Same calendar day → `Today, HH:MM`, previous day → `Yesterday, HH:MM`,
/// anything else → `DD.MM.YYYY, HH:MM`. A missing timestamp yields an empty label.
pub fn timestamp_label(timestamp: Option<&DateTime<Utc>>, now: &DateTime<FixedOffset>) -> String {
    let Some(timestamp) = timestamp else {
        return String::new();
    };
    let local = timestamp.with_timezone(&now.timezone());
    let day = local.date_naive();
    let today = now.date_naive();
    let clock = local.format("%H:%M");

    if day == today {
        format!("Today, {clock}")
    } else if today.checked_sub_days(Days::new(1)) == Some(day) {
        format!("Yesterday, {clock}")
    } else {
        local.format("%d.%m.%Y, %H:%M").to_string()
    }
}
