use crate::{classify::NoiseKind, pipeline::InputInfo};
use serde::{Deserialize, Serialize};

/// Why a line produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Blank,
    PreContent,
    Motorcycle,
    NoBrand,
    Noise,
    InvalidYear,
    InvalidPrice,
    EmptyModel,
    Unrecognized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub blank: u32,
    pub pre_content: u32,
    pub motorcycle: u32,
    pub no_brand: u32,
    pub noise: u32,
    pub invalid_year: u32,
    pub invalid_price: u32,
    pub empty_model: u32,
    pub unrecognized: u32,
}

impl SkipCounts {
    pub fn bump(&mut self, reason: SkipReason) {
        let slot = match reason {
            SkipReason::Blank => &mut self.blank,
            SkipReason::PreContent => &mut self.pre_content,
            SkipReason::Motorcycle => &mut self.motorcycle,
            SkipReason::NoBrand => &mut self.no_brand,
            SkipReason::Noise => &mut self.noise,
            SkipReason::InvalidYear => &mut self.invalid_year,
            SkipReason::InvalidPrice => &mut self.invalid_price,
            SkipReason::EmptyModel => &mut self.empty_model,
            SkipReason::Unrecognized => &mut self.unrecognized,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        self.blank
            + self.pre_content
            + self.motorcycle
            + self.no_brand
            + self.noise
            + self.invalid_year
            + self.invalid_price
            + self.empty_model
            + self.unrecognized
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiagnostic {
    pub line: usize,
    pub page: u32,
    pub reason: SkipReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Which noise rule matched, for `reason = noise`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseKind>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    pub lines_total: usize,
    pub final_page: u32,
    pub records: usize,
    pub brands_seen: Vec<String>,
    pub skipped: SkipCounts,
    pub price_swaps: u32,
    pub motorcycle_marker_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<LineDiagnostic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub input: InputInfo,
    pub text_bytes: usize,
    pub text_sha256: String,
    pub elapsed_ms: u64,
    pub parse: ParseReport,
}
