use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CalendarError;

/// Business-day calendar used to turn working-day offsets into dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::weekdays()
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Monday through Friday, no holidays.
    pub fn weekdays() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }

    /// Monday through Friday with US federal holidays for the inclusive year range.
    pub fn us_federal(start_year: i32, end_year: i32) -> Self {
        let (start, end) = if start_year <= end_year {
            (start_year, end_year)
        } else {
            (end_year, start_year)
        };

        let mut calendar = Self::weekdays();
        for year in start..=end {
            calendar.add_us_holidays(year);
        }
        calendar
    }

    pub fn custom<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Result<Self, CalendarError> {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        if working_set.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Ok(Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        })
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    fn add_us_holidays(&mut self, year: i32) {
        let fixed = [(1, 1), (7, 4), (11, 11), (12, 25)];
        for (month, day) in fixed {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }

        // MLK, Presidents', Labor, Columbus, Thanksgiving
        let floating = [
            (1, Weekday::Mon, 3),
            (2, Weekday::Mon, 3),
            (9, Weekday::Mon, 1),
            (10, Weekday::Mon, 2),
            (11, Weekday::Thu, 4),
        ];
        for (month, weekday, n) in floating {
            if let Some(date) = Self::nth_weekday(year, month, weekday, n) {
                self.holidays.insert(date);
            }
        }

        // Memorial Day
        if let Some(date) = Self::last_weekday(year, 5, Weekday::Mon) {
            self.holidays.insert(date);
        }
    }

    fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
        NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
    }

    fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
        let first_of_next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let mut date = first_of_next - Duration::days(1);
        while date.weekday() != weekday {
            date = date - Duration::days(1);
        }
        Some(date)
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    /// Add the same month/day as a holiday for every year in the range.
    pub fn add_recurring_holiday(&mut self, month: u32, day: u32, start_year: i32, end_year: i32) {
        for year in start_year..=end_year {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.holidays.insert(date);
            }
        }
    }

    pub fn set_working_days(&mut self, days: &[Weekday]) -> Result<(), CalendarError> {
        if days.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !days.contains(day))
            .collect();
        Ok(())
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// First working day strictly after `from`, or [`NaiveDate::MAX`] when
    /// the representable range runs out first.
    pub fn next_working_day(&self, from: NaiveDate) -> NaiveDate {
        self.checked_add_working_days(from, 1)
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn first_working_day_on_or_after(&self, date: NaiveDate) -> NaiveDate {
        if self.is_working_day(date) {
            date
        } else {
            self.next_working_day(date)
        }
    }

    /// The date `days` working days after `from`; `from` itself is not counted.
    /// Saturates at [`NaiveDate::MAX`].
    pub fn add_working_days(&self, from: NaiveDate, days: i64) -> NaiveDate {
        self.checked_add_working_days(from, days)
            .unwrap_or(NaiveDate::MAX)
    }

    /// Like [`add_working_days`](Self::add_working_days), but `None` once the
    /// walk leaves chrono's date range.
    pub fn checked_add_working_days(&self, from: NaiveDate, days: i64) -> Option<NaiveDate> {
        let mut current = from;
        let mut count = 0;
        while count < days {
            current = current.checked_add_days(Days::new(1))?;
            if self.is_working_day(current) {
                count += 1;
            }
        }
        Some(current)
    }

    /// The date `days` working days before `from`, `None` past [`NaiveDate::MIN`].
    pub fn checked_sub_working_days(&self, from: NaiveDate, days: i64) -> Option<NaiveDate> {
        let mut current = from;
        let mut count = 0;
        while count < days {
            current = current.checked_sub_days(Days::new(1))?;
            if self.is_working_day(current) {
                count += 1;
            }
        }
        Some(current)
    }

    /// Working days in the half-open range `[start, end)`.
    pub fn working_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        let mut count = 0;
        let mut current = start;
        while current < end {
            if self.is_working_day(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    /// All working days in the inclusive range `[start, end]`.
    pub fn working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            if self.is_working_day(current) {
                days.push(current);
            }
            let Some(next) = current.succ_opt() else {
                break;
            };
            current = next;
        }
        days
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup();

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working_days = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days,
            holidays,
        }
    }
}

/// Maps calendar dates onto integer working-day offsets counted from a plan origin.
///
/// Offset 0 is the first working day on or after the origin. A date that is
/// not a working day shares the offset of the next working day.
#[derive(Debug, Clone, Copy)]
pub struct WorkingDayAxis<'a> {
    calendar: &'a WorkCalendar,
    origin: NaiveDate,
}

impl<'a> WorkingDayAxis<'a> {
    pub fn new(calendar: &'a WorkCalendar, origin: NaiveDate) -> Self {
        Self {
            calendar,
            origin: calendar.first_working_day_on_or_after(origin),
        }
    }

    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    pub fn offset_of(&self, date: NaiveDate) -> i64 {
        if date >= self.origin {
            self.calendar.working_days_between(self.origin, date)
        } else {
            -self.calendar.working_days_between(date, self.origin)
        }
    }

    /// Date of a working-day offset, clamped to chrono's date range.
    pub fn date_at(&self, offset: i64) -> NaiveDate {
        self.checked_date_at(offset).unwrap_or(if offset >= 0 {
            NaiveDate::MAX
        } else {
            NaiveDate::MIN
        })
    }

    pub fn checked_date_at(&self, offset: i64) -> Option<NaiveDate> {
        if offset >= 0 {
            self.calendar.checked_add_working_days(self.origin, offset)
        } else {
            self.calendar
                .checked_sub_working_days(self.origin, offset.saturating_neg())
        }
    }
}
