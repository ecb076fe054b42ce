//! Trailing date windows used to scope statistics

use serde::{Deserialize, Serialize};
use time::{util::days_in_year_month, Date, Duration, Month};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    Month,
    Year,
    #[default]
    All,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
            Timeframe::All => "all",
        }
    }

    /// First day inside the window, or `None` for all-time.
    ///
    /// Month and year windows use calendar arithmetic; when the target month
    /// is shorter the day is clamped (March 31st minus one month is
    /// February 28th or 29th).
    pub fn cutoff(&self, today: Date) -> Option<Date> {
        match self {
            Timeframe::Week => Some(today.saturating_sub(Duration::days(7))),
            Timeframe::Month => {
                let (year, month) = match today.month() {
                    Month::January => (today.year() - 1, Month::December),
                    month => (today.year(), month.previous()),
                };
                Some(clamped_date(year, month, today.day(), today))
            }
            Timeframe::Year => Some(clamped_date(
                today.year() - 1,
                today.month(),
                today.day(),
                today,
            )),
            Timeframe::All => None,
        }
    }

    /// Whether `date` lies in `[cutoff, today]`
    pub fn contains(&self, date: Date, today: Date) -> bool {
        match self.cutoff(today) {
            Some(cutoff) => date >= cutoff && date <= today,
            None => true,
        }
    }
}

fn clamped_date(year: i32, month: Month, day: u8, fallback: Date) -> Date {
    let day = day.min(days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).unwrap_or(fallback)
}
