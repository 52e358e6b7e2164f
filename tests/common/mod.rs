#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};

use achievement_transcript::records::{
    CourseRecord, EducationPeriod, OlympiadRecord, ProjectRecord, RecordFilter, SeminarRecord,
    Student,
};
use achievement_transcript::{
    AchievementRepository, MemoryRepository, RenderOracle, Result, StudentId, TargetFormat,
};
use chrono::{NaiveDate, NaiveDateTime};

pub const DEPARTMENT: &str = "Физико-математическое отделение";
pub const SUMMER: &str = "Летняя школа";
pub const CLASSROOM: &str = "Аудитория 12";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(10, 0, 0).unwrap()
}

/// Builder for in-memory datasets. Record ids are assigned sequentially.
#[derive(Default)]
pub struct Dataset {
    repo: MemoryRepository,
    next_id: u64,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn student(mut self, id: StudentId, last: &str, first: &str, middle: &str) -> Self {
        self.repo.students.push(Student {
            id,
            last_name: last.into(),
            first_name: first.into(),
            middle_name: middle.into(),
            birth_date: None,
        });
        self
    }

    /// Education period from September of `from` to June of `to`.
    pub fn period(mut self, student: StudentId, department: &str, from: i32, to: i32) -> Self {
        let id = self.id();
        self.repo.education.push(EducationPeriod {
            id,
            student,
            department: department.into(),
            start_date: date(from, 9, 1),
            finish_date: date(to, 6, 30),
            start_class: 8,
            finish_class: (8 + to - from) as u8,
        });
        self
    }

    pub fn course(
        mut self,
        student: StudentId,
        name: &str,
        started: Option<NaiveDateTime>,
        location: &str,
        is_exam: bool,
    ) -> Self {
        let id = self.id();
        let finished = started.unwrap_or(at(2030, 1, 1)) + chrono::Duration::days(30);
        self.repo.courses.push(CourseRecord {
            id,
            student,
            course: name.into(),
            chapter: "Основной".into(),
            subject: "Математика".into(),
            hours: 36,
            mark: "отлично".into(),
            started,
            finished,
            location: location.into(),
            teacher: "Петров П. П.".into(),
            is_exam,
        });
        self
    }

    pub fn seminar(mut self, student: StudentId, name: &str, started: NaiveDateTime) -> Self {
        let id = self.id();
        self.repo.seminars.push(SeminarRecord {
            id,
            student,
            seminar: name.into(),
            subject: String::new(),
            hours: Some(16),
            mark: None,
            teacher: "Сидоров С. С.".into(),
            started: Some(started),
            finished: started + chrono::Duration::days(60),
            location: CLASSROOM.into(),
        });
        self
    }

    pub fn project(mut self, student: StudentId, name: &str, started: NaiveDateTime) -> Self {
        let id = self.id();
        self.repo.projects.push(ProjectRecord {
            id,
            student,
            project: name.into(),
            subject: String::new(),
            curator: "Кузнецова К. К.".into(),
            started: Some(started),
            finished: started + chrono::Duration::days(90),
            location: CLASSROOM.into(),
        });
        self
    }

    pub fn olympiad(
        mut self,
        student: StudentId,
        name: &str,
        started: NaiveDateTime,
        title: Option<&str>,
        prize: Option<&str>,
        team: bool,
    ) -> Self {
        let id = self.id();
        self.repo.olympiads.push(OlympiadRecord {
            id,
            student,
            olympiad: name.into(),
            stage: Some("региональный этап".into()),
            title: title.map(str::to_string),
            prize: prize.map(str::to_string),
            is_team_member: team,
            started: Some(started),
            finished: started + chrono::Duration::days(1),
            location: CLASSROOM.into(),
        });
        self
    }

    pub fn build(self) -> MemoryRepository {
        self.repo
    }
}

/// Two students enrolled 2020-2022 with a little of everything.
pub fn sample_dataset() -> MemoryRepository {
    Dataset::new()
        .student(1, "Иванов", "Иван", "Иванович")
        .student(2, "Смирнова", "Анна", "Сергеевна")
        .period(1, DEPARTMENT, 2020, 2022)
        .period(2, DEPARTMENT, 2020, 2022)
        .course(1, "Алгебра", Some(at(2020, 10, 1)), CLASSROOM, false)
        .course(1, "Геометрия", Some(at(2021, 3, 15)), CLASSROOM, false)
        .course(1, "Экзамен по алгебре", Some(at(2021, 5, 20)), CLASSROOM, true)
        .course(1, "Теория чисел", Some(at(2021, 7, 5)), SUMMER, false)
        .seminar(1, "Комбинаторика", at(2021, 11, 10))
        .project(1, "Солнечные часы", at(2021, 2, 1))
        .olympiad(
            1,
            "Всероссийская олимпиада",
            at(2021, 1, 20),
            Some("Лауреат"),
            Some(""),
            true,
        )
        .course(2, "Алгебра", Some(at(2020, 10, 1)), CLASSROOM, false)
        .build()
}

/// Fake oracle: the page count of a package is the sum of the counts of
/// every known name appearing in its content, or `fallback` if none does.
pub struct ScriptedOracle {
    pages: HashMap<String, usize>,
    fallback: usize,
    calls: AtomicUsize,
    concurrent: bool,
}

impl ScriptedOracle {
    pub fn new(fallback: usize) -> Self {
        Self {
            pages: HashMap::new(),
            fallback,
            calls: AtomicUsize::new(0),
            concurrent: false,
        }
    }

    pub fn with(mut self, name: &str, pages: usize) -> Self {
        self.pages.insert(name.to_string(), pages);
        self
    }

    pub fn concurrent(mut self) -> Self {
        self.concurrent = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RenderOracle for ScriptedOracle {
    fn convert(&self, document: &[u8], _target: TargetFormat) -> Result<Vec<u8>> {
        Ok(document.to_vec())
    }

    fn page_count(&self, document: &[u8]) -> Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = read_part(document, "content.xml");
        let known: usize = self
            .pages
            .iter()
            .filter(|(name, _)| content.contains(name.as_str()))
            .map(|(_, pages)| pages)
            .sum();
        Ok(if known == 0 { self.fallback } else { known })
    }

    fn supports_concurrency(&self) -> bool {
        self.concurrent
    }
}

/// Oracle that always fails, like a crashed converter.
/// Repository wrapper that counts `student` lookups.
pub struct CountingRepository {
    inner: MemoryRepository,
    lookups: AtomicUsize,
}

impl CountingRepository {
    pub fn new(inner: MemoryRepository) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl AchievementRepository for CountingRepository {
    fn student(&self, id: StudentId) -> Result<Student> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.student(id)
    }

    fn education_periods(&self, student: StudentId) -> Result<Vec<EducationPeriod>> {
        self.inner.education_periods(student)
    }

    fn course_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<CourseRecord>> {
        self.inner.course_records(student, filter)
    }

    fn seminar_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<SeminarRecord>> {
        self.inner.seminar_records(student, filter)
    }

    fn project_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<ProjectRecord>> {
        self.inner.project_records(student, filter)
    }

    fn olympiad_records(
        &self,
        student: StudentId,
        filter: &RecordFilter,
    ) -> Result<Vec<OlympiadRecord>> {
        self.inner.olympiad_records(student, filter)
    }

    fn graduates(&self, department: &str, year: i32) -> Result<Vec<StudentId>> {
        self.inner.graduates(department, year)
    }
}

pub struct BrokenOracle;

impl RenderOracle for BrokenOracle {
    fn convert(&self, _document: &[u8], _target: TargetFormat) -> Result<Vec<u8>> {
        Err(achievement_transcript::Error::Render("converter crashed".into()))
    }

    fn page_count(&self, _document: &[u8]) -> Result<usize> {
        Err(achievement_transcript::Error::Render("converter crashed".into()))
    }
}

pub fn entry_names(odt: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(odt)).unwrap();
    zip.file_names().map(str::to_string).collect()
}

pub fn read_part(odt: &[u8], name: &str) -> String {
    let mut zip = zip::ZipArchive::new(Cursor::new(odt)).unwrap();
    let mut file = zip.by_name(name).unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}

/// One top-level element of the document body.
#[derive(Debug, Clone)]
pub struct BodyItem {
    /// `p`, `h` or `table`
    pub tag: String,
    pub style: Option<String>,
    /// All text below the element, frames included.
    pub text: String,
}

pub fn body(odt: &[u8]) -> Vec<BodyItem> {
    let content = read_part(odt, "content.xml");
    let xml = roxmltree::Document::parse(&content).unwrap();
    let text_body = xml
        .descendants()
        .find(|n| n.has_tag_name("text") && n.parent().is_some_and(|p| p.has_tag_name("body")))
        .unwrap();
    text_body
        .children()
        .filter(|n| n.is_element())
        .map(|n| BodyItem {
            tag: n.tag_name().name().to_string(),
            style: n
                .attributes()
                .find(|a| a.name() == "style-name")
                .map(|a| a.value().to_string()),
            text: n
                .descendants()
                .filter(|d| d.is_text())
                .filter_map(|d| d.text())
                .collect(),
        })
        .collect()
}

pub fn headings(odt: &[u8]) -> Vec<String> {
    body(odt)
        .into_iter()
        .filter(|i| i.tag == "h")
        .map(|i| i.text)
        .collect()
}

pub fn count_style(odt: &[u8], style: &str) -> usize {
    body(odt)
        .iter()
        .filter(|i| i.style.as_deref() == Some(style))
        .count()
}

/// Text of the body items between heading `name` and the next heading.
pub fn section_text(odt: &[u8], name: &str) -> Option<String> {
    let items = body(odt);
    let start = items.iter().position(|i| i.tag == "h" && i.text == name)?;
    Some(
        items[start + 1..]
            .iter()
            .take_while(|i| i.tag != "h")
            .map(|i| i.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
