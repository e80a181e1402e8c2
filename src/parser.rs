use crate::{
    brands::BrandDictionary,
    classify::{Classifier, DataLine, LineClass, NoiseKind},
    config::{Config, ParserSettings},
    fields::{parse_price_range, parse_year_range},
    record::{ModelSplitter, PriceRecord, RecordAssembler},
    report::{LineDiagnostic, ParseReport, SkipReason},
};
use anyhow::Result;
use tracing::{debug, info};

/// Running context for one document. Created fresh per parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseState {
    pub(crate) current_brand: Option<String>,
    pub(crate) current_page: u32,
    pub(crate) in_motorcycle_section: bool,
}

impl ParseState {
    pub fn new() -> Self {
        Self {
            current_brand: None,
            current_page: 1,
            in_motorcycle_section: false,
        }
    }

    pub fn current_brand(&self) -> Option<&str> {
        self.current_brand.as_deref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn in_motorcycle_section(&self) -> bool {
        self.in_motorcycle_section
    }
}

impl Default for ParseState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub records: Vec<PriceRecord>,
    pub report: ParseReport,
}

/// Strips a trailing copy of the year-range token from the captured
/// model/trim text, then trims.
pub fn clean_model_trim(captured: &str, year_token: &str) -> String {
    let t = captured.trim();
    let t = t.strip_suffix(year_token).unwrap_or(t);
    t.trim().to_string()
}

/// Turns a price-list line stream into records. Immutable once built, so one
/// instance can parse any number of documents in turn.
#[derive(Debug, Clone)]
pub struct PriceListParser {
    classifier: Classifier,
    brands: BrandDictionary,
    splitter: ModelSplitter,
    reclassify_after_page_break: bool,
    max_diagnostics: Option<usize>,
}

impl PriceListParser {
    pub fn new(settings: &ParserSettings) -> Result<Self> {
        Ok(Self {
            classifier: Classifier::new(settings)?,
            brands: BrandDictionary::with_extra(&settings.extra_brands),
            splitter: ModelSplitter::new(settings),
            reclassify_after_page_break: settings.reclassify_after_page_break,
            max_diagnostics: None,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let parser = Self::new(&cfg.parser)?;
        Ok(if cfg.debug.keep_line_diagnostics {
            parser.with_diagnostics(cfg.debug.max_line_diagnostics)
        } else {
            parser
        })
    }

    /// Keep up to `max` per-line skip diagnostics in the report.
    pub fn with_diagnostics(mut self, max: usize) -> Self {
        self.max_diagnostics = Some(max);
        self
    }

    pub fn parse_text(&self, text: &str) -> ParseOutput {
        self.parse_lines(text.split('\n'))
    }

    pub fn parse_lines<I, S>(&self, lines: I) -> ParseOutput
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut run = Run {
            parser: self,
            state: ParseState::new(),
            assembler: RecordAssembler::new(self.splitter.clone()),
            report: ParseReport::default(),
        };

        for (idx, line) in lines.into_iter().enumerate() {
            run.report.lines_total += 1;
            run.step(idx + 1, line.as_ref());
        }

        run.finish()
    }
}

struct Run<'p> {
    parser: &'p PriceListParser,
    state: ParseState,
    assembler: RecordAssembler,
    report: ParseReport,
}

impl Run<'_> {
    fn step(&mut self, line_no: usize, raw: &str) {
        let class = self
            .parser
            .classifier
            .classify(raw, &self.state, &self.parser.brands);

        match class {
            LineClass::PageBreak { markers, rest } => {
                self.state.current_page += markers;
                debug!(line = line_no, page = self.state.current_page, "page break");
                // `rest` holds no separator, so this recurses at most once.
                if self.parser.reclassify_after_page_break && !rest.trim().is_empty() {
                    self.step(line_no, rest);
                }
            }
            LineClass::Blank => self.skip(line_no, SkipReason::Blank, raw, None),
            LineClass::PreContent => self.skip(line_no, SkipReason::PreContent, raw, None),
            LineClass::MotorcycleMarker => {
                if !self.state.in_motorcycle_section {
                    info!(
                        "page ~{} line {}: motorcycle section begins; ignoring the rest",
                        self.state.current_page, line_no
                    );
                    self.state.in_motorcycle_section = true;
                    self.report.motorcycle_marker_line = Some(line_no);
                }
                self.skip(line_no, SkipReason::Motorcycle, raw, None);
            }
            LineClass::MotorcycleSection => self.skip(line_no, SkipReason::Motorcycle, raw, None),
            LineClass::Brand(brand) => {
                debug!("page ~{}: switched brand to {}", self.state.current_page, brand);
                if self.report.brands_seen.last().map(String::as_str) != Some(brand) {
                    self.report.brands_seen.push(brand.to_string());
                }
                self.state.current_brand = Some(brand.to_string());
            }
            LineClass::NoBrand => self.skip(line_no, SkipReason::NoBrand, raw, None),
            LineClass::Noise(kind) => {
                self.record_skip(line_no, SkipReason::Noise, raw, None, Some(kind))
            }
            LineClass::Data(data) => self.data_line(line_no, raw, data),
            LineClass::Unrecognized => self.skip(line_no, SkipReason::Unrecognized, raw, None),
        }
    }

    fn data_line(&mut self, line_no: usize, raw: &str, data: DataLine<'_>) {
        let years = match parse_year_range(data.year_range) {
            Ok(y) => y,
            Err(err) => {
                return self.skip(line_no, SkipReason::InvalidYear, raw, Some(err.to_string()));
            }
        };
        let prices = match parse_price_range(data.price_text) {
            Ok(p) => p,
            Err(err) => {
                return self.skip(line_no, SkipReason::InvalidPrice, raw, Some(err.to_string()));
            }
        };
        let model_trim = clean_model_trim(data.model_trim, data.year_range);
        if model_trim.is_empty() {
            return self.skip(line_no, SkipReason::EmptyModel, raw, None);
        }
        let Some(brand) = self.state.current_brand.as_deref() else {
            return self.skip(line_no, SkipReason::NoBrand, raw, None);
        };

        if prices.swapped {
            self.report.price_swaps += 1;
            debug!(
                "page ~{} line {}: swapped inverted price range for {}",
                self.state.current_page, line_no, model_trim
            );
        }

        self.assembler.push(brand, &model_trim, years, prices);
    }

    fn skip(&mut self, line_no: usize, reason: SkipReason, raw: &str, detail: Option<String>) {
        self.record_skip(line_no, reason, raw, detail, None);
    }

    fn record_skip(
        &mut self,
        line_no: usize,
        reason: SkipReason,
        raw: &str,
        detail: Option<String>,
        noise: Option<NoiseKind>,
    ) {
        self.report.skipped.bump(reason);

        if matches!(
            reason,
            SkipReason::InvalidYear
                | SkipReason::InvalidPrice
                | SkipReason::EmptyModel
                | SkipReason::Unrecognized
        ) {
            debug!(
                "page ~{} line {}: skipped ({:?}{}): {}",
                self.state.current_page,
                line_no,
                reason,
                detail.as_deref().map(|d| format!(", {d}")).unwrap_or_default(),
                raw.trim()
            );
        }

        let Some(max) = self.parser.max_diagnostics else {
            return;
        };
        if matches!(
            reason,
            SkipReason::Blank | SkipReason::PreContent | SkipReason::Motorcycle
        ) || self.report.diagnostics.len() >= max
        {
            return;
        }
        self.report.diagnostics.push(LineDiagnostic {
            line: line_no,
            page: self.state.current_page,
            reason,
            detail,
            noise,
            text: raw.trim().to_string(),
        });
    }

    fn finish(mut self) -> ParseOutput {
        self.report.final_page = self.state.current_page;
        self.report.records = self.assembler.len();
        info!(
            "parsed {} records from {} lines ({} skipped, {} price swaps)",
            self.report.records,
            self.report.lines_total,
            self.report.skipped.total(),
            self.report.price_swaps
        );
        ParseOutput {
            records: self.assembler.finish(),
            report: self.report,
        }
    }
}
