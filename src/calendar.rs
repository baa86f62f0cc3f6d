use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub cleared: bool,
    pub is_today: bool,
}

/// One month of the cleared-days calendar, Sunday-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    /// Returns `None` for an invalid month.
    pub fn build(
        year: i32,
        month: u32,
        cleared_dates: &BTreeSet<NaiveDate>,
        today: NaiveDate,
    ) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = next_month(year, month);
        let days_in_month = NaiveDate::from_ymd_opt(next_year, next_month, 1)?
            .pred_opt()?
            .day();

        let days = first
            .iter_days()
            .take(days_in_month as usize)
            .map(|date| CalendarDay {
                day: date.day(),
                date,
                cleared: cleared_dates.contains(&date),
                is_today: date == today,
            })
            .collect();

        Some(Self {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days,
        })
    }

    pub fn cleared_count(&self) -> usize {
        self.days.iter().filter(|d| d.cleared).count()
    }
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}
