//! The seven section writers of a transcript.
//!
//! Every writer walks the student's education periods in start order, pulls
//! the records that started inside each period, buckets them by academic
//! year and writes one framed caption + table per non-empty bucket. A section
//! heading appears only once the first qualifying record is found.

use chrono::{Datelike, NaiveDate};

use crate::config::{ComposerConfig, EmptySectionPolicy};
use crate::error::Result;
use crate::model::{Anchor, Block, Paragraph};
use crate::odt::DocumentBuilder;
use crate::odt::styles::{ElementKind, Registry, StyleRule};
use crate::records::{
    AchievementRepository, ActivityRecord, CourseRecord, EducationPeriod, LocationFilter,
    OlympiadRecord, ProjectRecord, RecordFilter, SeminarRecord, Student,
};

use super::academic_year;
use super::table::{TableSpec, build_frame, build_table, frame_host};
use super::theme::Theme;

pub const TEAM_MEMBER: &str = "в составе команды";
const NO_DATA: &str = "Нет данных";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Title,
    Coursework,
    Exams,
    SummerSchool,
    Seminars,
    Projects,
    Olympiads,
}

impl Section {
    /// Order in which sections appear in a transcript.
    pub const ORDER: [Section; 7] = [
        Section::Title,
        Section::Coursework,
        Section::Exams,
        Section::SummerSchool,
        Section::Seminars,
        Section::Projects,
        Section::Olympiads,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            Section::Title => "Зачётная книжка",
            Section::Coursework => "Курсы",
            Section::Exams => "Экзамены",
            Section::SummerSchool => "Летняя школа",
            Section::Seminars => "Семинары",
            Section::Projects => "Проекты",
            Section::Olympiads => "Олимпиады",
        }
    }

    pub fn write<R>(self, ctx: &SectionContext<'_, R>, doc: &mut DocumentBuilder) -> Result<()>
    where
        R: AchievementRepository + ?Sized,
    {
        match self {
            Section::Title => write_title(ctx, doc),
            Section::Coursework => write_courses(ctx, doc, self, CourseKind::Coursework),
            Section::Exams => write_courses(ctx, doc, self, CourseKind::Exam),
            Section::SummerSchool => write_courses(ctx, doc, self, CourseKind::SummerSchool),
            Section::Seminars => write_bucketed(
                ctx,
                doc,
                self,
                |p| ctx.repo.seminar_records(ctx.student.id, &period_filter(p)),
                &SEMINAR_COLUMNS,
            ),
            Section::Projects => write_bucketed(
                ctx,
                doc,
                self,
                |p| ctx.repo.project_records(ctx.student.id, &period_filter(p)),
                &PROJECT_COLUMNS,
            ),
            Section::Olympiads => write_bucketed(
                ctx,
                doc,
                self,
                |p| ctx.repo.olympiad_records(ctx.student.id, &period_filter(p)),
                &OLYMPIAD_COLUMNS,
            ),
        }
    }
}

/// Which of the three course-based sections a course record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CourseKind {
    Coursework,
    Exam,
    SummerSchool,
}

impl CourseKind {
    /// Summer school is decided by location first, regardless of `is_exam`.
    pub fn classify(record: &CourseRecord, summer_location: &str) -> Self {
        if record.location == summer_location {
            CourseKind::SummerSchool
        } else if record.is_exam {
            CourseKind::Exam
        } else {
            CourseKind::Coursework
        }
    }
}

/// Everything a section writer reads.
pub struct SectionContext<'a, R: ?Sized> {
    pub repo: &'a R,
    pub config: &'a ComposerConfig,
    pub theme: &'a Theme,
    pub student: &'a Student,
    pub periods: &'a [EducationPeriod],
    pub title: &'a str,
    /// Restrict bucketed sections to one academic year.
    pub academic_year: Option<i32>,
}

/// Join the award parts with ", ", skipping empty ones.
pub fn award_summary(title: Option<&str>, prize: Option<&str>, team_member: bool) -> String {
    let team = team_member.then_some(TEAM_MEMBER);
    [title, prize, team]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

struct Columns<T> {
    header: &'static [&'static str],
    /// Fractions of the text width.
    widths: &'static [f32],
    /// Columns holding short numeric values, centered.
    centered: &'static [usize],
    row: fn(&T) -> Vec<String>,
}

static COURSE_COLUMNS: Columns<CourseRecord> = Columns {
    header: &["Курс", "Раздел", "Часов", "Оценка", "Преподаватель"],
    widths: &[0.30, 0.20, 0.10, 0.15, 0.25],
    centered: &[2, 3],
    row: |r| {
        vec![
            r.course.clone(),
            r.chapter.clone(),
            r.hours.to_string(),
            r.mark.clone(),
            r.teacher.clone(),
        ]
    },
};

static EXAM_COLUMNS: Columns<CourseRecord> = Columns {
    header: &["Экзамен", "Оценка", "Преподаватель"],
    widths: &[0.50, 0.20, 0.30],
    centered: &[1],
    row: |r| vec![r.course.clone(), r.mark.clone(), r.teacher.clone()],
};

static SUMMER_COLUMNS: Columns<CourseRecord> = Columns {
    header: &["Курс", "Часов", "Оценка", "Преподаватель"],
    widths: &[0.45, 0.10, 0.15, 0.30],
    centered: &[1, 2],
    row: |r| {
        vec![
            r.course.clone(),
            r.hours.to_string(),
            r.mark.clone(),
            r.teacher.clone(),
        ]
    },
};

static SEMINAR_COLUMNS: Columns<SeminarRecord> = Columns {
    header: &["Семинар", "Часов", "Руководитель"],
    widths: &[0.55, 0.10, 0.35],
    centered: &[1],
    row: |r| {
        vec![
            r.seminar.clone(),
            r.hours.map(|h| h.to_string()).unwrap_or_default(),
            r.teacher.clone(),
        ]
    },
};

static PROJECT_COLUMNS: Columns<ProjectRecord> = Columns {
    header: &["Проект", "Руководитель"],
    widths: &[0.60, 0.40],
    centered: &[],
    row: |r| vec![r.project.clone(), r.curator.clone()],
};

static OLYMPIAD_COLUMNS: Columns<OlympiadRecord> = Columns {
    header: &["Олимпиада", "Результат"],
    widths: &[0.55, 0.45],
    centered: &[],
    row: |r| {
        let name = match r.stage.as_deref().map(str::trim) {
            Some(stage) if !stage.is_empty() => format!("{}, {}", r.olympiad, stage),
            _ => r.olympiad.clone(),
        };
        vec![
            name,
            award_summary(r.title.as_deref(), r.prize.as_deref(), r.is_team_member),
        ]
    },
};

fn write_title<R>(ctx: &SectionContext<'_, R>, doc: &mut DocumentBuilder) -> Result<()>
where
    R: AchievementRepository + ?Sized,
{
    let theme = ctx.theme;
    let title = doc.register(&theme.title, Registry::Global);
    let subtitle = doc.register(&theme.subtitle, Registry::Global);
    doc.push(Block::Paragraph(Paragraph::new(Some(title), ctx.title)));
    doc.push(Block::Paragraph(Paragraph::new(
        Some(subtitle),
        ctx.student.full_name(),
    )));

    if ctx.periods.is_empty() {
        return Ok(());
    }
    let line = doc.register(&theme.title_line, Registry::Global);
    for period in ctx.periods {
        let text = format!(
            "{}: {}–{}, {}–{} класс",
            period.department,
            period.start_date.year(),
            period.finish_date.year(),
            period.start_class,
            period.finish_class
        );
        doc.push(Block::Paragraph(Paragraph::new(Some(line.clone()), text)));
    }
    let admission = ctx.periods.iter().map(|p| p.start_date.year()).min();
    let graduation = ctx.periods.iter().map(|p| p.finish_date.year()).max();
    if let (Some(admission), Some(graduation)) = (admission, graduation) {
        doc.push(Block::Paragraph(Paragraph::new(
            Some(line.clone()),
            format!("Год поступления: {admission}"),
        )));
        doc.push(Block::Paragraph(Paragraph::new(
            Some(line),
            format!("Год выпуска: {graduation}"),
        )));
    }
    Ok(())
}

fn write_courses<R>(
    ctx: &SectionContext<'_, R>,
    doc: &mut DocumentBuilder,
    section: Section,
    kind: CourseKind,
) -> Result<()>
where
    R: AchievementRepository + ?Sized,
{
    let summer = ctx.config.summer_school_location.as_str();
    let location = match kind {
        CourseKind::SummerSchool => LocationFilter::Only(summer.to_string()),
        CourseKind::Coursework | CourseKind::Exam => LocationFilter::Except(summer.to_string()),
    };
    let columns = match kind {
        CourseKind::Coursework => &COURSE_COLUMNS,
        CourseKind::Exam => &EXAM_COLUMNS,
        CourseKind::SummerSchool => &SUMMER_COLUMNS,
    };
    write_bucketed(
        ctx,
        doc,
        section,
        |p| {
            let filter = period_filter(p).with_location(location.clone());
            let records = ctx.repo.course_records(ctx.student.id, &filter)?;
            Ok(records
                .into_iter()
                .filter(|r| CourseKind::classify(r, summer) == kind)
                .collect())
        },
        columns,
    )
}

fn period_filter(period: &EducationPeriod) -> RecordFilter {
    RecordFilter::within(period.start_date, period.finish_date)
}

/// Keep records with a usable start date. Malformed ones fail the section in
/// strict mode and are skipped otherwise.
fn dated<T: ActivityRecord>(records: Vec<T>, strict: bool) -> Result<Vec<(NaiveDate, T)>> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        match record.start_date() {
            Ok(date) => out.push((date, record)),
            Err(e) if strict => return Err(e),
            Err(e) => log::warn!("Skipping record: {e}"),
        }
    }
    Ok(out)
}

fn write_bucketed<R, T, Q>(
    ctx: &SectionContext<'_, R>,
    doc: &mut DocumentBuilder,
    section: Section,
    query: Q,
    columns: &Columns<T>,
) -> Result<()>
where
    R: AchievementRepository + ?Sized,
    T: ActivityRecord,
    Q: Fn(&EducationPeriod) -> Result<Vec<T>>,
{
    let mut heading_written = false;

    for period in ctx.periods {
        let records = dated(query(period)?, ctx.config.strict_records)?;
        let mut buckets = academic_year::bucket(records, |(date, _)| *date);
        if let Some(only) = ctx.academic_year {
            buckets.retain(|year, _| *year == only);
        }
        if buckets.is_empty() {
            continue;
        }
        if !heading_written {
            write_heading(ctx.theme, doc, section);
            heading_written = true;
        }
        for (year, bucket) in buckets {
            let records: Vec<T> = bucket.into_iter().map(|(_, r)| r).collect();
            write_year(ctx, doc, period, year, &records, columns)?;
        }
    }

    if !heading_written && ctx.config.empty_sections == EmptySectionPolicy::Placeholder {
        write_heading(ctx.theme, doc, section);
        let body = doc.register(&ctx.theme.body, Registry::Global);
        doc.push(Block::Paragraph(Paragraph::new(Some(body), NO_DATA)));
    }
    log::debug!(
        "Section {:?} for student {}: {}",
        section,
        ctx.student.id,
        if heading_written { "written" } else { "empty" }
    );
    Ok(())
}

fn write_heading(theme: &Theme, doc: &mut DocumentBuilder, section: Section) {
    let style = doc.register(&theme.section_heading, Registry::Global);
    doc.push(Block::Paragraph(Paragraph::heading(1, style, section.heading())));
}

fn write_year<R, T>(
    ctx: &SectionContext<'_, R>,
    doc: &mut DocumentBuilder,
    period: &EducationPeriod,
    year: i32,
    records: &[T],
    columns: &Columns<T>,
) -> Result<()>
where
    R: AchievementRepository + ?Sized,
{
    let theme = ctx.theme;
    let text_width = theme.geometry.text_width();

    let caption_text = format!(
        "{} учебный год, {}-й год обучения, {}",
        academic_year::label(year),
        academic_year::study_year_ordinal(period, year),
        period.department
    );
    let caption = doc.register(&theme.caption, Registry::Global);

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len() + 1);
    rows.push(columns.header.iter().map(|h| h.to_string()).collect());
    rows.extend(records.iter().map(columns.row));

    let mut spec = TableSpec::new(rows)
        .with_widths(columns.widths.iter().map(|f| f * text_width).collect());
    for &index in columns.centered {
        spec = spec.with_rule(StyleRule::Column {
            index,
            element: ElementKind::Paragraph,
            style: &theme.number_text,
            registry: Registry::Global,
        });
    }
    let table = build_table(doc, theme, spec)?;

    let frame = build_frame(
        doc,
        theme,
        vec![
            Block::Paragraph(Paragraph::new(Some(caption), caption_text)),
            Block::Table(table),
        ],
        Anchor::Paragraph,
        text_width,
    );
    let host = frame_host(doc, theme, frame);
    doc.push(host);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_summary_skips_empty_parts() {
        assert_eq!(
            award_summary(Some("Лауреат"), Some(""), true),
            "Лауреат, в составе команды"
        );
        assert_eq!(
            award_summary(Some("Победитель"), Some("Диплом I степени"), false),
            "Победитель, Диплом I степени"
        );
        assert_eq!(award_summary(None, Some(" Грамота "), false), "Грамота");
        assert_eq!(award_summary(None, None, true), "в составе команды");
        assert_eq!(award_summary(Some(""), None, false), "");
    }
}
