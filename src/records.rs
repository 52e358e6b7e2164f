//! Achievement records as supplied by the surrounding application, and the
//! read-only repository port the composer pulls them through.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::{Error, Result};

pub type StudentId = u64;

#[derive(Clone, Debug, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl Student {
    pub fn full_name(&self) -> String {
        [&self.last_name, &self.first_name, &self.middle_name]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One enrolment of a student at a department. A student may have several,
/// possibly overlapping.
#[derive(Clone, Debug, Deserialize)]
pub struct EducationPeriod {
    pub id: u64,
    pub student: StudentId,
    pub department: String,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub start_class: u8,
    pub finish_class: u8,
}

/// Course participation; exams are course records with `is_exam` set.
#[derive(Clone, Debug, Deserialize)]
pub struct CourseRecord {
    pub id: u64,
    pub student: StudentId,
    pub course: String,
    #[serde(default)]
    pub chapter: String,
    #[serde(default)]
    pub subject: String,
    pub hours: u32,
    pub mark: String,
    pub started: Option<NaiveDateTime>,
    pub finished: NaiveDateTime,
    pub location: String,
    pub teacher: String,
    #[serde(default)]
    pub is_exam: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SeminarRecord {
    pub id: u64,
    pub student: StudentId,
    pub seminar: String,
    #[serde(default)]
    pub subject: String,
    pub hours: Option<u32>,
    pub mark: Option<String>,
    pub teacher: String,
    pub started: Option<NaiveDateTime>,
    pub finished: NaiveDateTime,
    #[serde(default)]
    pub location: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectRecord {
    pub id: u64,
    pub student: StudentId,
    pub project: String,
    #[serde(default)]
    pub subject: String,
    pub curator: String,
    pub started: Option<NaiveDateTime>,
    pub finished: NaiveDateTime,
    #[serde(default)]
    pub location: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OlympiadRecord {
    pub id: u64,
    pub student: StudentId,
    pub olympiad: String,
    pub stage: Option<String>,
    pub title: Option<String>,
    pub prize: Option<String>,
    #[serde(default)]
    pub is_team_member: bool,
    pub started: Option<NaiveDateTime>,
    pub finished: NaiveDateTime,
    #[serde(default)]
    pub location: String,
}

/// Common view over the dated participation records.
pub trait ActivityRecord {
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn started(&self) -> Option<NaiveDateTime>;
    fn finished(&self) -> NaiveDateTime;
    fn location(&self) -> &str;

    /// Start date of the activity, or a `MalformedRecord` error when the
    /// record cannot be placed on the calendar.
    fn start_date(&self) -> Result<NaiveDate> {
        let Some(started) = self.started() else {
            return Err(self.malformed("missing start timestamp"));
        };
        if started > self.finished() {
            return Err(self.malformed(format!(
                "starts at {started} after it finishes at {}",
                self.finished()
            )));
        }
        Ok(started.date())
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedRecord {
            kind: Self::KIND,
            id: self.id(),
            reason: reason.into(),
        }
    }
}

macro_rules! activity_record {
    ($ty:ty, $kind:literal) => {
        impl ActivityRecord for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> u64 {
                self.id
            }

            fn started(&self) -> Option<NaiveDateTime> {
                self.started
            }

            fn finished(&self) -> NaiveDateTime {
                self.finished
            }

            fn location(&self) -> &str {
                &self.location
            }
        }
    };
}

activity_record!(CourseRecord, "course");
activity_record!(SeminarRecord, "seminar");
activity_record!(ProjectRecord, "project");
activity_record!(OlympiadRecord, "olympiad");

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LocationFilter {
    #[default]
    Any,
    Only(String),
    Except(String),
}

impl LocationFilter {
    pub fn matches(&self, location: &str) -> bool {
        match self {
            LocationFilter::Any => true,
            LocationFilter::Only(name) => location == name,
            LocationFilter::Except(name) => location != name,
        }
    }
}

/// Query narrowing for record lookups.
///
/// Records without a start timestamp always pass the date range: they cannot
/// be excluded by date, and the caller is expected to report them.
#[derive(Clone, Debug, Default)]
pub struct RecordFilter {
    pub range: Option<(NaiveDate, NaiveDate)>,
    pub location: LocationFilter,
}

impl RecordFilter {
    pub fn within(start: NaiveDate, finish: NaiveDate) -> Self {
        Self {
            range: Some((start, finish)),
            location: LocationFilter::Any,
        }
    }

    pub fn with_location(mut self, location: LocationFilter) -> Self {
        self.location = location;
        self
    }

    pub fn matches<R: ActivityRecord>(&self, record: &R) -> bool {
        if !self.location.matches(record.location()) {
            return false;
        }
        match (self.range, record.started()) {
            (Some((from, to)), Some(started)) => {
                let date = started.date();
                from <= date && date <= to
            }
            _ => true,
        }
    }
}

/// Read-only source of everything the composer prints.
pub trait AchievementRepository {
    fn student(&self, id: StudentId) -> Result<Student>;

    /// Education periods of a student, ordered by start date.
    fn education_periods(&self, student: StudentId) -> Result<Vec<EducationPeriod>>;

    fn course_records(&self, student: StudentId, filter: &RecordFilter)
    -> Result<Vec<CourseRecord>>;

    fn seminar_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<SeminarRecord>>;

    fn project_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<ProjectRecord>>;

    fn olympiad_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<OlympiadRecord>>;

    /// Students with an education period at `department` finishing in `year`,
    /// ordered by id.
    fn graduates(&self, department: &str, year: i32) -> Result<Vec<StudentId>>;
}

/// Whole dataset held in memory, typically loaded from a JSON export.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MemoryRepository {
    pub students: Vec<Student>,
    pub education: Vec<EducationPeriod>,
    pub courses: Vec<CourseRecord>,
    pub seminars: Vec<SeminarRecord>,
    pub projects: Vec<ProjectRecord>,
    pub olympiads: Vec<OlympiadRecord>,
}

impl MemoryRepository {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let repo: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        log::info!(
            "Loaded dataset {}: {} students, {} periods, {} courses, {} seminars, {} projects, {} olympiads",
            path.display(),
            repo.students.len(),
            repo.education.len(),
            repo.courses.len(),
            repo.seminars.len(),
            repo.projects.len(),
            repo.olympiads.len(),
        );
        Ok(repo)
    }
}

fn select<R>(records: &[R], student: StudentId, filter: &RecordFilter) -> Vec<R>
where
    R: ActivityRecord + Clone + HasStudent,
{
    records
        .iter()
        .filter(|r| r.student() == student && filter.matches(*r))
        .cloned()
        .collect()
}

trait HasStudent {
    fn student(&self) -> StudentId;
}

macro_rules! has_student {
    ($($ty:ty),*) => {
        $(impl HasStudent for $ty {
            fn student(&self) -> StudentId {
                self.student
            }
        })*
    };
}

has_student!(CourseRecord, SeminarRecord, ProjectRecord, OlympiadRecord);

impl AchievementRepository for MemoryRepository {
    fn student(&self, id: StudentId) -> Result<Student> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(Error::UnknownStudent(id))
    }

    fn education_periods(&self, student: StudentId) -> Result<Vec<EducationPeriod>> {
        let mut periods: Vec<EducationPeriod> = self
            .education
            .iter()
            .filter(|e| e.student == student)
            .cloned()
            .collect();
        periods.sort_by_key(|e| e.start_date);
        Ok(periods)
    }

    fn course_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<CourseRecord>> {
        Ok(select(&self.courses, student, filter))
    }

    fn seminar_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<SeminarRecord>> {
        Ok(select(&self.seminars, student, filter))
    }

    fn project_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<ProjectRecord>> {
        Ok(select(&self.projects, student, filter))
    }

    fn olympiad_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<OlympiadRecord>> {
        Ok(select(&self.olympiads, student, filter))
    }

    fn graduates(&self, department: &str, year: i32) -> Result<Vec<StudentId>> {
        let ids: BTreeSet<StudentId> = self
            .education
            .iter()
            .filter(|e| e.department == department && e.finish_date.year() == year)
            .map(|e| e.student)
            .collect();
        Ok(ids.into_iter().collect())
    }
}
