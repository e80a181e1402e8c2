use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub parser: ParserSettings,
    #[serde(default)]
    pub postprocess: Postprocess,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
    #[serde(default)]
    pub security: Security,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(cfg)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.parser.content_start_page == 0 {
            bail!("parser.content_start_page must be >= 1");
        }
        if self.parser.page_separator.is_empty() {
            bail!("parser.page_separator must not be empty");
        }
        if self.extraction.timeout_seconds == 0 {
            bail!("extraction.timeout_seconds must be > 0");
        }
        if self.extraction.tool.trim().is_empty() {
            bail!("extraction.tool must not be empty");
        }
        Regex::new(&self.parser.motorcycle_marker)
            .with_context(|| "parser.motorcycle_marker is not a valid pattern")?;
        for p in &self.parser.header_patterns {
            Regex::new(p).with_context(|| format!("parser.header_patterns entry: {p}"))?;
        }
        Ok(())
    }

    /// A stable, normalization-friendly string for hashing.
    pub fn normalized_for_hash(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Global {
    pub job_name: String,
    pub resume: bool,
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            job_name: "default".into(),
            resume: true,
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub out_dir: String,
    pub catalog_path: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            catalog_path: "out/market-prices.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_input_file_bytes: u64,
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_file_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Extraction {
    /// Executable name or path; `auto` consults `PDFTOTEXT_BIN` first.
    pub tool: String,
    pub args: Vec<String>,
    /// Passed as `-enc <encoding>`; empty to omit.
    pub encoding: String,
    pub timeout_seconds: u64,
    pub env: BTreeMap<String, String>,
}
impl Default for Extraction {
    fn default() -> Self {
        Self {
            tool: "pdftotext".into(),
            args: Vec::new(),
            encoding: "UTF-8".into(),
            timeout_seconds: 120,
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Lines before this page are cover and table-of-contents material.
    pub content_start_page: u32,
    pub page_separator: String,
    pub trim_commas: bool,
    pub reclassify_after_page_break: bool,
    pub motorcycle_marker: String,
    pub header_patterns: Vec<String>,
    pub extra_brands: Vec<String>,
    pub single_model_brands: Vec<String>,
    pub known_model_prefixes: Vec<String>,
}
impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            content_start_page: 8,
            page_separator: "\u{000C}".into(),
            trim_commas: true,
            reclassify_after_page_break: false,
            motorcycle_marker: "รถจักรยานยนต์".into(),
            header_patterns: vec![
                r"แบบ\s*/\s*รุ่น".into(),
                "ปีผลิต".into(),
                "ราคาประเมิน".into(),
                "สารบัญ".into(),
                r"แบบ/รุ่น\s*อื่นๆ".into(),
            ],
            extra_brands: Vec::new(),
            single_model_brands: [
                "AION",
                "TESLA",
                "NETA",
                "XPENG",
                "ZEEKR",
                "LEAPMOTOR",
                "AVATR",
                "DEEPAL",
                "DENZA",
                "ORA",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            known_model_prefixes: [
                "HILUX CHAMP",
                "HILUX REVO",
                "HILUX VIGO",
                "COROLLA ALTIS",
                "COROLLA CROSS",
                "LAND CRUISER",
                "YARIS ATIV",
                "YARIS CROSS",
                "RANGER DOUBLE CAB",
                "RANGER SUPER CAB",
                "RANGER STANDARD CAB",
                "PAJERO SPORT",
                "COLORADO HIGH COUNTRY",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Postprocess {
    pub normalize_newlines: bool,
    pub normalize_unicode: bool,
    pub control_chars_to_sanitize: Vec<u8>,
}
impl Default for Postprocess {
    fn default() -> Self {
        Self {
            normalize_newlines: true,
            normalize_unicode: false,
            control_chars_to_sanitize: (0u8..=31)
                .filter(|c| !matches!(*c, b'\t' | b'\n' | b'\r' | 0x0C))
                .chain(std::iter::once(127))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub write_records_json: bool,
    pub write_report_json: bool,
    pub write_index_json: bool,
    pub records_filename: String,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            write_records_json: true,
            write_report_json: true,
            write_index_json: true,
            records_filename: "records.json".into(),
            report_filename: "report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub keep_line_diagnostics: bool,
    pub max_line_diagnostics: usize,
    pub keep_tool_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_line_diagnostics: false,
            max_line_diagnostics: 5000,
            keep_tool_stderr: true,
            dump_effective_config: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub reject_url_inputs: bool,
}
impl Default for Security {
    fn default() -> Self {
        Self {
            reject_url_inputs: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_start_page() {
        let mut cfg = Config::default();
        cfg.parser.content_start_page = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_header_pattern() {
        let mut cfg = Config::default();
        cfg.parser.header_patterns.push("(unclosed".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_sanitize_list_keeps_form_feed() {
        let cfg = Config::default();
        assert!(!cfg.postprocess.control_chars_to_sanitize.contains(&0x0C));
        assert!(!cfg.postprocess.control_chars_to_sanitize.contains(&b'\n'));
        assert!(cfg.postprocess.control_chars_to_sanitize.contains(&0x02));
    }
}
