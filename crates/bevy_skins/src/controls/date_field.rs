use bevy_ecs::prelude::*;

use crate::{SkinnableUi, controls::SkinnableControl, style_id::StyleId};

/// Calendar date as shown by a [`UiDateField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    /// Date with month and day clamped into the valid range for that month.
    #[must_use]
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        let month = month.clamp(1, 12);
        Self {
            year,
            month,
            day: day.clamp(1, days_in_month(year, month)),
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Text field bound to an optional date, with a calendar popup.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[require(SkinnableUi)]
pub struct UiDateField {
    pub date: Option<CalendarDate>,
    /// Whether the date may be typed in addition to being picked.
    pub allow_user_input: bool,
}

impl Default for UiDateField {
    fn default() -> Self {
        Self {
            date: None,
            allow_user_input: true,
        }
    }
}

impl UiDateField {
    #[must_use]
    pub fn new(date: CalendarDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user_input(mut self, allow_user_input: bool) -> Self {
        self.allow_user_input = allow_user_input;
        self
    }
}

impl SkinnableControl for UiDateField {
    fn default_style_id() -> StyleId {
        StyleId::DATE_FIELD
    }
}
