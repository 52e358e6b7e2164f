use std::time::Instant;

use rayon::prelude::*;

use crate::error::Result;
use crate::odt::DocumentBuilder;
use crate::records::{AchievementRepository, StudentId};
use crate::render::RenderOracle;

use super::Composer;
use super::padding::{missing_pages, resolve_padding};

/// Where one student's transcript sits in a combined document. Pages are
/// numbered from 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentSpan {
    pub student: StudentId,
    pub content_pages: usize,
    pub padding_pages: usize,
    pub first_page: usize,
    pub last_page: usize,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub document: DocumentBuilder,
    pub spans: Vec<StudentSpan>,
}

impl BatchOutcome {
    pub fn total_pages(&self) -> usize {
        self.spans.last().map_or(0, |s| s.last_page)
    }
}

/// Measure every student in isolation, then compose them into one document
/// padding each with the count its own measurement calls for.
pub(super) fn compose_batch<R, O>(
    composer: &Composer<'_, R, O>,
    students: &[StudentId],
) -> Result<BatchOutcome>
where
    R: AchievementRepository + Sync + ?Sized,
    O: RenderOracle + Sync,
{
    let t0 = Instant::now();
    let config = composer.config();
    let oracle = composer.oracle();

    let measured: Vec<usize> = if config.parallel_measure && oracle.supports_concurrency() {
        students
            .par_iter()
            .map(|&id| measure(composer, id))
            .collect::<Result<_>>()?
    } else {
        if config.parallel_measure {
            log::warn!("Oracle does not allow concurrent conversions, measuring sequentially");
        }
        students
            .iter()
            .map(|&id| measure(composer, id))
            .collect::<Result<_>>()?
    };
    let t_measure = t0.elapsed();

    let mut document = composer.begin_document(&format!("{} transcripts", students.len()));
    let mut spans = Vec::with_capacity(students.len());
    let mut next_page = 1;
    for (&student, &content_pages) in students.iter().zip(&measured) {
        composer.write_student_content(&mut document, student)?;
        let missing = missing_pages(
            content_pages,
            config.booklet_signature,
            config.pad_full_signature_on_exact_multiple,
        );
        let padding_pages =
            resolve_padding(&mut document, composer.theme(), oracle, config, Some(missing))?;
        let span = StudentSpan {
            student,
            content_pages,
            padding_pages,
            first_page: next_page,
            last_page: next_page + content_pages + padding_pages - 1,
        };
        log::debug!(
            "Student {}: pages {}-{} ({} content, {} filler)",
            span.student,
            span.first_page,
            span.last_page,
            span.content_pages,
            span.padding_pages
        );
        next_page = span.last_page + 1;
        spans.push(span);
    }
    let t_total = t0.elapsed();

    log::info!(
        "Timing: measure={:.1}ms, compose={:.1}ms, total={:.1}ms ({} students, {} pages)",
        t_measure.as_secs_f64() * 1000.0,
        (t_total - t_measure).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        students.len(),
        next_page - 1,
    );

    Ok(BatchOutcome { document, spans })
}

/// Page count of one student's content composed into a scratch document.
fn measure<R, O>(composer: &Composer<'_, R, O>, student: StudentId) -> Result<usize>
where
    R: AchievementRepository + ?Sized,
    O: RenderOracle,
{
    let mut scratch = composer.begin_document("");
    composer.write_student_content(&mut scratch, student)?;
    let pages = composer.oracle().page_count(&scratch.to_odt()?)?;
    log::debug!("Measured student {}: {} pages", student, pages);
    Ok(pages)
}
