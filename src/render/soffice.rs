use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::RenderConfig;
use crate::error::{Error, Result};

use super::{RenderOracle, TargetFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// LibreOffice in headless mode. Each conversion runs in its own temporary
/// directory with its own user profile, so conversions are independent.
pub struct SofficeOracle {
    program: PathBuf,
    timeout: Duration,
}

impl SofficeOracle {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(&config.soffice, Duration::from_secs(config.timeout_secs))
    }

    fn run(&self, document: &[u8], target: TargetFormat) -> Result<Vec<u8>> {
        let t0 = Instant::now();
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("document.odt");
        std::fs::write(&input, document)?;
        let profile = dir.path().join("profile");

        let child = Command::new(&self.program)
            .arg(format!("-env:UserInstallation={}", file_url(&profile)))
            .args(["--headless", "--norestore", "--convert-to"])
            .arg(target.extension())
            .arg("--outdir")
            .arg(dir.path())
            .arg(&input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Render(format!("cannot start {}: {e}", self.program.display())))?;

        let status = wait_with_timeout(child, self.timeout)?;
        if !status.success {
            return Err(Error::Render(format!(
                "{} exited with {}: {}",
                self.program.display(),
                status.code,
                status.stderr.trim()
            )));
        }

        let output = dir.path().join(format!("document.{}", target.extension()));
        let bytes = std::fs::read(&output).map_err(|e| {
            Error::Render(format!(
                "no {} produced ({e}): {}",
                target,
                status.stderr.trim()
            ))
        })?;
        log::debug!(
            "soffice: {} bytes -> {} {} bytes in {:.1}ms",
            document.len(),
            target,
            bytes.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        Ok(bytes)
    }
}

impl RenderOracle for SofficeOracle {
    fn convert(&self, document: &[u8], target: TargetFormat) -> Result<Vec<u8>> {
        match target {
            TargetFormat::Odt => Ok(document.to_vec()),
            TargetFormat::Pdf => self.run(document, target),
        }
    }

    fn page_count(&self, document: &[u8]) -> Result<usize> {
        let pdf = self.run(document, TargetFormat::Pdf)?;
        count_pdf_pages(&pdf)
    }

    fn supports_concurrency(&self) -> bool {
        true
    }
}

pub(crate) fn count_pdf_pages(pdf: &[u8]) -> Result<usize> {
    let doc = lopdf::Document::load_mem(pdf)?;
    Ok(doc.get_pages().len())
}

struct ExitStatus {
    success: bool,
    code: String,
    stderr: String,
}

fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<ExitStatus> {
    // drained on a thread so a chatty converter cannot fill the pipe and stall
    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = pipe.read_to_string(&mut text);
            text
        })
    });
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            let stderr = stderr_reader
                .and_then(|h| h.join().ok())
                .unwrap_or_default();
            return Ok(ExitStatus {
                success: status.success(),
                code: status
                    .code()
                    .map_or_else(|| String::from("signal"), |c| c.to_string()),
                stderr,
            });
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::RenderTimeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn file_url(path: &Path) -> String {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        format!("file://{s}")
    } else {
        format!("file:///{s}")
    }
}
