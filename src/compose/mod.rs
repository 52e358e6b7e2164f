//! Transcript composition: one student, a batch of students, or a
//! summer-school certificate.

pub mod academic_year;
mod batch;
pub mod padding;
pub mod sections;
pub mod table;
pub mod theme;

pub use batch::{BatchOutcome, StudentSpan};

use std::time::Instant;

use chrono::NaiveDate;

use crate::config::ComposerConfig;
use crate::error::Result;
use crate::odt::DocumentBuilder;
use crate::odt::styles::Registry;
use crate::records::{AchievementRepository, EducationPeriod, Student, StudentId};
use crate::render::RenderOracle;

use sections::{Section, SectionContext};
use theme::Theme;

pub const SUMMER_CERTIFICATE_TITLE: &str = "Справка об участии в летней школе";

/// Entry point of the library. Borrows the repository, owns the oracle, the
/// configuration and the style theme derived from it.
pub struct Composer<'a, R: ?Sized, O> {
    repo: &'a R,
    oracle: O,
    config: ComposerConfig,
    theme: Theme,
}

impl<'a, R, O> Composer<'a, R, O>
where
    R: AchievementRepository + ?Sized,
    O: RenderOracle,
{
    pub fn new(repo: &'a R, oracle: O, config: ComposerConfig) -> Result<Self> {
        let config = config.normalized();
        let theme = Theme::new(&config)?;
        Ok(Self {
            repo,
            oracle,
            config,
            theme,
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// An empty document with the page layout in place.
    pub fn begin_document(&self, title: &str) -> DocumentBuilder {
        let mut doc = DocumentBuilder::new();
        doc.register(&self.theme.master_page, Registry::Master);
        doc.set_title(title);
        doc
    }

    /// Title block and every section for one student, without padding.
    pub fn write_student_content(
        &self,
        doc: &mut DocumentBuilder,
        student: StudentId,
    ) -> Result<Student> {
        let (student, periods) = self.load_student(student)?;
        let ctx = self.context(&student, &periods, Section::Title.heading(), None);
        for section in Section::ORDER {
            section.write(&ctx, doc)?;
        }
        Ok(student)
    }

    /// A complete, padded transcript for one student.
    pub fn compose_student(&self, student: StudentId) -> Result<DocumentBuilder> {
        let t0 = Instant::now();
        let mut doc = self.begin_document("");
        let s = self.write_student_content(&mut doc, student)?;
        doc.set_title(s.full_name());
        let t_content = t0.elapsed();

        let padding = padding::resolve_padding(
            &mut doc,
            &self.theme,
            &self.oracle,
            &self.config,
            None,
        )?;
        let t_total = t0.elapsed();

        log::info!(
            "Timing: content={:.1}ms, measure+pad={:.1}ms, total={:.1}ms (student {}, {} filler pages)",
            t_content.as_secs_f64() * 1000.0,
            (t_total - t_content).as_secs_f64() * 1000.0,
            t_total.as_secs_f64() * 1000.0,
            student,
            padding,
        );
        Ok(doc)
    }

    /// Title block plus the summer-school section of the academic year that
    /// contains `date`, padded like a transcript.
    pub fn compose_summer_certificate(
        &self,
        student: StudentId,
        date: NaiveDate,
    ) -> Result<DocumentBuilder> {
        let t0 = Instant::now();
        let (s, periods) = self.load_student(student)?;
        let year = academic_year::academic_year(date);
        let ctx = self.context(&s, &periods, SUMMER_CERTIFICATE_TITLE, Some(year));

        let title = format!("{SUMMER_CERTIFICATE_TITLE}: {}", s.full_name());
        let mut doc = self.begin_document(&title);
        Section::Title.write(&ctx, &mut doc)?;
        Section::SummerSchool.write(&ctx, &mut doc)?;
        let padding = padding::resolve_padding(
            &mut doc,
            &self.theme,
            &self.oracle,
            &self.config,
            None,
        )?;

        log::info!(
            "Timing: certificate={:.1}ms (student {}, academic year {}, {} filler pages)",
            t0.elapsed().as_secs_f64() * 1000.0,
            student,
            academic_year::label(year),
            padding,
        );
        Ok(doc)
    }

    fn load_student(&self, student: StudentId) -> Result<(Student, Vec<EducationPeriod>)> {
        let s = self.repo.student(student)?;
        let periods = self.repo.education_periods(student)?;
        if periods.is_empty() {
            log::warn!("Student {} has no education periods", student);
        }
        Ok((s, periods))
    }

    fn context<'c>(
        &'c self,
        student: &'c Student,
        periods: &'c [EducationPeriod],
        title: &'c str,
        academic_year: Option<i32>,
    ) -> SectionContext<'c, R> {
        SectionContext {
            repo: self.repo,
            config: &self.config,
            theme: &self.theme,
            student,
            periods,
            title,
            academic_year,
        }
    }
}

impl<R, O> Composer<'_, R, O>
where
    R: AchievementRepository + Sync + ?Sized,
    O: RenderOracle + Sync,
{
    /// One document holding every student's transcript, each padded to its
    /// own signature boundary. See [`BatchOutcome`].
    pub fn compose_batch(&self, students: &[StudentId]) -> Result<BatchOutcome> {
        batch::compose_batch(self, students)
    }

    /// Batch for everyone finishing `department` in `year`.
    pub fn compose_graduates(&self, department: &str, year: i32) -> Result<BatchOutcome> {
        let students = self.repo.graduates(department, year)?;
        log::info!(
            "{} graduates of {} in {}",
            students.len(),
            department,
            year
        );
        self.compose_batch(&students)
    }
}
