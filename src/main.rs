use std::path::{Path, PathBuf};
use std::process::ExitCode;

use achievement_transcript::naming;
use achievement_transcript::{
    AchievementRepository, BatchOutcome, Composer, ComposerConfig, DocumentBuilder, LayoutOracle,
    MemoryRepository, RenderOracle, SofficeOracle, StudentId, TargetFormat,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Compose printable achievement transcripts.
#[derive(Parser, Debug)]
#[command(name = "achievement-transcript")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON dataset with students, education periods and records
    #[arg(long)]
    data: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page counter and converter
    #[arg(long, value_enum, default_value_t = OracleKind::Soffice)]
    oracle: OracleKind,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Pdf)]
    format: Format,

    /// Directory the output is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcript of one student
    Student { id: StudentId },

    /// Transcripts of several students in one document
    Batch {
        #[arg(required = true)]
        ids: Vec<StudentId>,
    },

    /// Transcripts of everyone finishing a department in a given year
    Graduates {
        #[arg(long)]
        department: String,

        #[arg(long)]
        year: i32,
    },

    /// Summer-school certificate for the academic year containing DATE
    Summer {
        id: StudentId,

        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OracleKind {
    /// LibreOffice, headless
    Soffice,
    /// Built-in estimate; ODT output only
    Layout,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Odt,
    Pdf,
}

impl From<Format> for TargetFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Odt => TargetFormat::Odt,
            Format::Pdf => TargetFormat::Pdf,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> achievement_transcript::Result<PathBuf> {
    let config = match &cli.config {
        Some(path) => ComposerConfig::load(path)?,
        None => ComposerConfig::default(),
    };
    let repo = MemoryRepository::load(&cli.data)?;
    let oracle: Box<dyn RenderOracle + Sync> = match cli.oracle {
        OracleKind::Soffice => Box::new(SofficeOracle::from_config(&config.render)),
        OracleKind::Layout => Box::new(LayoutOracle::from_config(&config.render)?),
    };
    let format = TargetFormat::from(cli.format);
    let year = naming::current_year();
    let composer = Composer::new(&repo, oracle.as_ref(), config)?;

    let (doc, file_name) = match &cli.command {
        Commands::Student { id } => {
            let student = repo.student(*id)?;
            let doc = composer.compose_student(*id)?;
            (doc, naming::transcript_file_name(&student, year, format))
        }
        Commands::Batch { ids } => {
            let outcome = composer.compose_batch(ids)?;
            report(&outcome);
            (
                outcome.document,
                naming::batch_file_name(ids.len(), year, format),
            )
        }
        Commands::Graduates {
            department,
            year: graduation,
        } => {
            let outcome = composer.compose_graduates(department, *graduation)?;
            if outcome.spans.is_empty() {
                log::warn!("No graduates of {department} in {graduation}");
            }
            report(&outcome);
            (
                outcome.document,
                naming::graduates_file_name(department, *graduation, format),
            )
        }
        Commands::Summer { id, date } => {
            let student = repo.student(*id)?;
            let doc = composer.compose_summer_certificate(*id, *date)?;
            (
                doc,
                naming::summer_certificate_file_name(&student, year, format),
            )
        }
    };

    write(&doc, oracle.as_ref(), format, &cli.out_dir, &file_name)
}

fn report(outcome: &BatchOutcome) {
    for span in &outcome.spans {
        log::info!(
            "Student {}: pages {}-{} ({} + {} filler)",
            span.student,
            span.first_page,
            span.last_page,
            span.content_pages,
            span.padding_pages
        );
    }
}

fn write(
    doc: &DocumentBuilder,
    oracle: &(dyn RenderOracle + Sync),
    format: TargetFormat,
    out_dir: &Path,
    file_name: &str,
) -> achievement_transcript::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(file_name);
    achievement_transcript::export(doc, oracle, format, &path)?;
    Ok(path)
}
