use super::{types::ToolDiag, TextExtractor};
use crate::config::{Config, Extraction};
use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DOCTOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `pdftotext` (or a compatible tool) as a child process.
pub struct PdfToTextEngine {
    settings: Extraction,
    keep_stderr: bool,
    tool: PathBuf,
}

impl PdfToTextEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let tool = resolve_tool(&cfg.extraction.tool)?;
        Ok(Self {
            settings: cfg.extraction.clone(),
            keep_stderr: cfg.debug.keep_tool_stderr,
            tool,
        })
    }

    fn command_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.settings.args.iter().map(OsString::from).collect();
        if !self.settings.encoding.is_empty() {
            args.push("-enc".into());
            args.push(self.settings.encoding.clone().into());
        }
        args.push(input.as_os_str().to_owned());
        args.push("-".into());
        args
    }

    fn run(&self, args: &[OsString], timeout: Duration) -> Result<Output> {
        debug!("run {} {:?} timeout={:?}", self.tool.display(), args, timeout);
        let mut cmd = Command::new(&self.tool);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        for (k, v) in &self.settings.env {
            cmd.env(k, v);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {}", self.tool.display()))?;
        wait_with_timeout(&mut child, timeout)
    }
}

fn resolve_tool(raw: &str) -> Result<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(anyhow!("extraction.tool is empty"));
    }
    if raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("PDFTOTEXT_BIN") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return Ok(p);
            }
            warn!("PDFTOTEXT_BIN does not exist: {}", p.display());
        }
        return Ok(PathBuf::from("pdftotext"));
    }
    Ok(expand_tilde(raw))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

impl TextExtractor for PdfToTextEngine {
    fn doctor(&self) -> Result<ToolDiag> {
        let tool = self.tool.display().to_string();
        match self.run(&[OsString::from("-v")], DOCTOR_TIMEOUT) {
            Ok(out) => {
                let banner = String::from_utf8_lossy(&out.stderr).to_string()
                    + &String::from_utf8_lossy(&out.stdout);
                let version = banner
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(String::from);
                Ok(ToolDiag {
                    tool,
                    version,
                    ok: true,
                    error: None,
                })
            }
            Err(err) => Ok(ToolDiag {
                tool,
                version: None,
                ok: false,
                error: Some(format!("{err:#}")),
            }),
        }
    }

    fn extract_text(&self, input: &Path) -> Result<String> {
        let args = self.command_args(input);
        let timeout = Duration::from_secs(self.settings.timeout_seconds);
        let output = self.run(&args, timeout)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} failed ({}) for {}\n{}",
                self.tool.display(),
                output.status,
                input.display(),
                stderr.trim()
            ));
        }

        if self.keep_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} stderr: {}", self.tool.display(), stderr.trim());
        }

        match String::from_utf8(output.stdout) {
            Ok(text) => Ok(text),
            Err(err) => {
                warn!("extracted text is not valid UTF-8; replacing invalid sequences");
                Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
            }
        }
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a large document can't deadlock the child
    // on a full stdout buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("text extraction timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            let _ = stdout_thread.join();
            return Err(anyhow!(
                "text extraction exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr)
            ));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
