//! Per-line classification of the price-list text stream.
//!
//! Each rule is a standalone predicate so it can be tested on its own;
//! [`Classifier::classify`] applies them in precedence order.

use crate::{brands::BrandDictionary, config::ParserSettings, parser::ParseState};
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BARE_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}|\d{4})$").expect("valid page number regex"));

// Lazy model capture so the first year range on the line wins.
static DATA_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+(\d{4}\s*-\s*\d{4})\s+(.+)$").expect("valid data line regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    TableHeader,
    PageNumber,
}

/// The three captured columns of a data line, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLine<'a> {
    pub model_trim: &'a str,
    pub year_range: &'a str,
    pub price_text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// `markers` separators were found; `rest` is whatever followed the last one.
    PageBreak { markers: u32, rest: &'a str },
    Blank,
    PreContent,
    MotorcycleMarker,
    MotorcycleSection,
    Brand(&'a str),
    NoBrand,
    Noise(NoiseKind),
    Data(DataLine<'a>),
    Unrecognized,
}

pub fn page_break_count(raw: &str, separator: &str) -> u32 {
    if separator.is_empty() {
        return 0;
    }
    raw.matches(separator).count() as u32
}

pub fn trim_line(raw: &str, trim_commas: bool) -> &str {
    if trim_commas {
        raw.trim_matches(|c: char| c.is_whitespace() || c == ',')
    } else {
        raw.trim()
    }
}

pub fn is_blank(line: &str) -> bool {
    line.is_empty()
}

pub fn is_pre_content(current_page: u32, content_start_page: u32) -> bool {
    current_page < content_start_page
}

/// One to three digits, or exactly four: stray page numbers.
pub fn is_bare_page_number(line: &str) -> bool {
    BARE_PAGE_NUMBER.is_match(line)
}

pub fn match_data_line(line: &str) -> Option<DataLine<'_>> {
    let caps = DATA_LINE.captures(line)?;
    Some(DataLine {
        model_trim: caps.get(1)?.as_str(),
        year_range: caps.get(2)?.as_str(),
        price_text: caps.get(3)?.as_str(),
    })
}

#[derive(Debug, Clone)]
pub struct Classifier {
    page_separator: String,
    trim_commas: bool,
    content_start_page: u32,
    motorcycle_marker: Regex,
    table_headers: Vec<Regex>,
}

impl Classifier {
    pub fn new(settings: &ParserSettings) -> Result<Self> {
        let motorcycle_marker = Regex::new(&settings.motorcycle_marker)
            .with_context(|| "compiling motorcycle marker pattern")?;
        let table_headers = settings
            .header_patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}"))
                    .with_context(|| format!("compiling header pattern: {p}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            page_separator: settings.page_separator.clone(),
            trim_commas: settings.trim_commas,
            content_start_page: settings.content_start_page,
            motorcycle_marker,
            table_headers,
        })
    }

    pub fn is_motorcycle_marker(&self, line: &str) -> bool {
        self.motorcycle_marker.is_match(line)
    }

    pub fn is_table_header(&self, line: &str) -> bool {
        self.table_headers.iter().any(|r| r.is_match(line))
    }

    pub fn noise_kind(&self, line: &str) -> Option<NoiseKind> {
        if self.is_table_header(line) {
            Some(NoiseKind::TableHeader)
        } else if is_bare_page_number(line) {
            Some(NoiseKind::PageNumber)
        } else {
            None
        }
    }

    /// Classifies one raw line against the current state. First match wins.
    pub fn classify<'a>(
        &self,
        raw: &'a str,
        state: &ParseState,
        brands: &BrandDictionary,
    ) -> LineClass<'a> {
        let markers = page_break_count(raw, &self.page_separator);
        if markers > 0 {
            let rest = raw.rsplit(self.page_separator.as_str()).next().unwrap_or("");
            return LineClass::PageBreak { markers, rest };
        }

        let line = trim_line(raw, self.trim_commas);
        if is_blank(line) {
            return LineClass::Blank;
        }
        if is_pre_content(state.current_page(), self.content_start_page) {
            return LineClass::PreContent;
        }
        if self.is_motorcycle_marker(line) {
            return LineClass::MotorcycleMarker;
        }
        if state.in_motorcycle_section() {
            return LineClass::MotorcycleSection;
        }
        if brands.contains(line) {
            return LineClass::Brand(line);
        }
        if state.current_brand().is_none() {
            return LineClass::NoBrand;
        }
        if let Some(kind) = self.noise_kind(line) {
            return LineClass::Noise(kind);
        }
        match match_data_line(line) {
            Some(data) => LineClass::Data(data),
            None => LineClass::Unrecognized,
        }
    }
}
