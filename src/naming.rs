//! Output file names. The year is the current calendar year.

use chrono::{Datelike, Local};

use crate::records::Student;
use crate::render::TargetFormat;

pub fn current_year() -> i32 {
    Local::now().year()
}

/// `Зачетка Иванов Иван Иванович 2026 год.pdf`
pub fn transcript_file_name(student: &Student, year: i32, format: TargetFormat) -> String {
    sanitize(&format!(
        "Зачетка {} {} год.{}",
        student.full_name(),
        year,
        format.extension()
    ))
}

/// `Зачетки выпускников 2026 года, Физико-математическое отделение.pdf`
pub fn graduates_file_name(department: &str, year: i32, format: TargetFormat) -> String {
    sanitize(&format!(
        "Зачетки выпускников {} года, {}.{}",
        year,
        department,
        format.extension()
    ))
}

/// `Летняя школа Иванов Иван Иванович 2026 год.pdf`
pub fn summer_certificate_file_name(student: &Student, year: i32, format: TargetFormat) -> String {
    sanitize(&format!(
        "Летняя школа {} {} год.{}",
        student.full_name(),
        year,
        format.extension()
    ))
}

/// `Зачетки 3 студентов 2026 год.pdf`, for an ad-hoc batch.
pub fn batch_file_name(count: usize, year: i32, format: TargetFormat) -> String {
    format!("Зачетки {} студентов {} год.{}", count, year, format.extension())
}

/// Path separators and control characters cannot appear in a file name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
