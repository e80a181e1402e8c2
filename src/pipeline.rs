use crate::{
    config::Config,
    engine::TextExtractor,
    normalize::normalize_text,
    parser::{ParseOutput, PriceListParser},
    record::PriceRecord,
    report::JobReport,
    util::{hash_file, sha256_hex},
};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    pub path: String,
    pub file_bytes: u64,
    pub sha256: String,
}

pub struct JobOutput {
    pub records: Vec<PriceRecord>,
    pub report: JobReport,
}

pub struct Pipeline<E: TextExtractor> {
    cfg: Config,
    extractor: E,
    parser: PriceListParser,
}

impl<E: TextExtractor> Pipeline<E> {
    pub fn new(cfg: &Config, extractor: E) -> Result<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            extractor,
            parser: PriceListParser::from_config(cfg)?,
        })
    }

    /// Extracts and parses one PDF. Only input and extraction problems fail
    /// the job; bad lines are counted in the report.
    pub fn run_job(&self, input: &Path) -> Result<JobOutput> {
        let info = self.inspect_input(input)?;
        self.run_inspected(input, info)
    }

    /// Enforces the size limit, then hashes the input. The size check comes
    /// first so an oversized file is never read.
    pub fn inspect_input(&self, input: &Path) -> Result<InputInfo> {
        let meta = std::fs::metadata(input)
            .with_context(|| format!("stat input: {}", input.display()))?;
        let file_bytes = meta.len();
        if file_bytes > self.cfg.limits.max_input_file_bytes {
            bail!(
                "input exceeds max_input_file_bytes ({} > {})",
                file_bytes,
                self.cfg.limits.max_input_file_bytes
            );
        }
        let sha256 = hash_file(input).with_context(|| format!("hashing input: {}", input.display()))?;
        Ok(InputInfo {
            path: input.display().to_string(),
            file_bytes,
            sha256,
        })
    }

    /// Runs extraction and parsing for an input already checked by
    /// [`Pipeline::inspect_input`].
    pub fn run_inspected(&self, input: &Path, info: InputInfo) -> Result<JobOutput> {
        let started = Instant::now();
        info!("input {} bytes={} sha256={}", info.path, info.file_bytes, info.sha256);

        let raw = self
            .extractor
            .extract_text(input)
            .with_context(|| format!("text extraction failed for {}", input.display()))?;
        info!("extracted {} bytes of text", raw.len());

        let text_sha256 = sha256_hex(raw.as_bytes());
        let ParseOutput { records, report } = self.parse_text(&raw);

        Ok(JobOutput {
            records,
            report: JobReport {
                input: info,
                text_bytes: raw.len(),
                text_sha256,
                elapsed_ms: started.elapsed().as_millis() as u64,
                parse: report,
            },
        })
    }

    /// Runs normalization and the parser on already-extracted text.
    pub fn parse_text(&self, raw: &str) -> ParseOutput {
        let text = normalize_text(&self.cfg, raw);
        self.parser.parse_text(&text)
    }
}
