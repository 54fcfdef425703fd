use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// add calendar months, clamping the day to the end of the target month
/// (jan 31 + 1 month = feb 28/29)
pub fn months_after(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// add calendar years, clamping feb 29 to feb 28 off leap years
pub fn years_after(date: NaiveDate, years: u32) -> NaiveDate {
    months_after(date, years * 12)
}

/// whole days from start to end (negative when end precedes start)
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// most recent monday, on or before the given date
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// first day of the date's month
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

/// january 1st of the date's year
pub fn start_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_months_after_clamps_to_month_end() {
        assert_eq!(months_after(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(months_after(d(2023, 1, 31), 1), d(2023, 2, 28));
        assert_eq!(months_after(d(2024, 1, 31), 3), d(2024, 4, 30));
    }

    #[test]
    fn test_months_after_crosses_year_boundary() {
        assert_eq!(months_after(d(2024, 11, 15), 3), d(2025, 2, 15));
        assert_eq!(months_after(d(2024, 6, 1), 12), d(2025, 6, 1));
    }

    #[test]
    fn test_years_after() {
        assert_eq!(years_after(d(2024, 2, 29), 1), d(2025, 2, 28));
        assert_eq!(years_after(d(2024, 7, 4), 1), d(2025, 7, 4));
    }

    #[test]
    fn test_days_between_signed() {
        assert_eq!(days_between(d(2024, 1, 1), d(2024, 1, 11)), 10);
        assert_eq!(days_between(d(2024, 1, 11), d(2024, 1, 1)), -10);
        assert_eq!(days_between(d(2024, 1, 1), d(2025, 1, 1)), 366);
    }

    #[test]
    fn test_start_of_week_is_monday() {
        // 2024-06-13 is a thursday
        assert_eq!(start_of_week(d(2024, 6, 13)), d(2024, 6, 10));
        // monday maps to itself
        assert_eq!(start_of_week(d(2024, 6, 10)), d(2024, 6, 10));
        // sunday maps back six days
        assert_eq!(start_of_week(d(2024, 6, 16)), d(2024, 6, 10));
    }

    #[test]
    fn test_period_starts() {
        assert_eq!(start_of_month(d(2024, 6, 13)), d(2024, 6, 1));
        assert_eq!(start_of_year(d(2024, 6, 13)), d(2024, 1, 1));
    }
}
