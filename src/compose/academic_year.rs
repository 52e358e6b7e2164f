//! Academic years run September through August and are named by the calendar
//! year they start in.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::records::EducationPeriod;

/// Academic year a date falls in: January–August belong to the year that
/// started the previous September.
pub fn academic_year(date: NaiveDate) -> i32 {
    if date.month() <= 8 {
        date.year() - 1
    } else {
        date.year()
    }
}

/// Group records by academic year of their start date. Keys iterate in
/// ascending order; within a bucket records keep their input order.
pub fn bucket<T, F>(records: impl IntoIterator<Item = T>, start_date: F) -> BTreeMap<i32, Vec<T>>
where
    F: Fn(&T) -> NaiveDate,
{
    let mut buckets: BTreeMap<i32, Vec<T>> = BTreeMap::new();
    for record in records {
        let year = academic_year(start_date(&record));
        buckets.entry(year).or_default().push(record);
    }
    buckets
}

/// Year of study within a period, counted from 1. Records predating the
/// period's start year give zero or negative ordinals.
pub fn study_year_ordinal(period: &EducationPeriod, academic_year: i32) -> i32 {
    academic_year - period.start_date.year() + 1
}

/// "2020/2021"
pub fn label(academic_year: i32) -> String {
    format!("{}/{}", academic_year, academic_year + 1)
}
