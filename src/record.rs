use crate::{
    config::ParserSettings,
    fields::{PriceRange, YearRange},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub brand: String,
    pub model_trim: String,
    pub model: String,
    pub sub_model: String,
    pub year_start: i32,
    pub year_end: i32,
    #[serde(rename = "price_min_thb")]
    pub price_min: i64,
    #[serde(rename = "price_max_thb")]
    pub price_max: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Identity of a listing in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogKey {
    pub brand: String,
    pub model_trim: String,
    pub year_start: i32,
    pub year_end: i32,
}

impl PriceRecord {
    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            brand: self.brand.clone(),
            model_trim: self.model_trim.clone(),
            year_start: self.year_start,
            year_end: self.year_end,
        }
    }

    /// Everything except the timestamps.
    pub fn same_listing(&self, other: &PriceRecord) -> bool {
        self.key() == other.key()
            && self.model == other.model
            && self.sub_model == other.sub_model
            && self.price_min == other.price_min
            && self.price_max == other.price_max
    }
}

/// Splits a model/trim label into model and sub-model.
#[derive(Debug, Clone, Default)]
pub struct ModelSplitter {
    single_model_brands: HashSet<String>,
    // longest first
    known_prefixes: Vec<String>,
}

impl ModelSplitter {
    pub fn new(settings: &ParserSettings) -> Self {
        let mut known_prefixes = settings.known_model_prefixes.clone();
        known_prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self {
            single_model_brands: settings.single_model_brands.iter().cloned().collect(),
            known_prefixes,
        }
    }

    pub fn split(&self, model_trim: &str, brand: &str) -> (String, String) {
        if self.single_model_brands.contains(brand) {
            return (model_trim.to_string(), String::new());
        }
        for prefix in &self.known_prefixes {
            if let Some(rest) = model_trim.strip_prefix(prefix.as_str()) {
                return (prefix.clone(), rest.trim().to_string());
            }
        }
        let mut words = model_trim.split_whitespace();
        match words.next() {
            Some(first) => (first.to_string(), words.collect::<Vec<_>>().join(" ")),
            None => (model_trim.to_string(), String::new()),
        }
    }
}

/// Collects records in input order, stamping each at creation.
#[derive(Debug, Default)]
pub struct RecordAssembler {
    splitter: ModelSplitter,
    records: Vec<PriceRecord>,
}

impl RecordAssembler {
    pub fn new(splitter: ModelSplitter) -> Self {
        Self {
            splitter,
            records: Vec::new(),
        }
    }

    pub fn push(
        &mut self,
        brand: &str,
        model_trim: &str,
        years: YearRange,
        prices: PriceRange,
    ) -> &PriceRecord {
        let (model, sub_model) = self.splitter.split(model_trim, brand);
        let now = OffsetDateTime::now_utc();
        self.records.push(PriceRecord {
            brand: brand.to_string(),
            model_trim: model_trim.to_string(),
            model,
            sub_model,
            year_start: years.start,
            year_end: years.end,
            price_min: prices.min,
            price_max: prices.max,
            created_at: now,
            updated_at: now,
        });
        &self.records[self.records.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> Vec<PriceRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> ModelSplitter {
        ModelSplitter::new(&ParserSettings::default())
    }

    #[test]
    fn split_single_model_brand() {
        let (m, s) = splitter().split("AION Y PLUS 490", "AION");
        assert_eq!(m, "AION Y PLUS 490");
        assert_eq!(s, "");
    }

    #[test]
    fn split_known_prefix() {
        let (m, s) = splitter().split("HILUX VIGO 2.5 E", "TOYOTA");
        assert_eq!(m, "HILUX VIGO");
        assert_eq!(s, "2.5 E");
    }

    #[test]
    fn split_prefers_longest_prefix() {
        let mut settings = ParserSettings::default();
        settings.known_model_prefixes = vec!["RANGER".into(), "RANGER DOUBLE CAB".into()];
        let (m, s) = ModelSplitter::new(&settings).split("RANGER DOUBLE CAB 2.2 XLT", "FORD");
        assert_eq!(m, "RANGER DOUBLE CAB");
        assert_eq!(s, "2.2 XLT");
    }

    #[test]
    fn split_first_word_fallback() {
        let (m, s) = splitter().split("CIVIC 1.8 EL", "HONDA");
        assert_eq!(m, "CIVIC");
        assert_eq!(s, "1.8 EL");
        let (m, s) = splitter().split("COROLLA", "TOYOTA");
        assert_eq!(m, "COROLLA");
        assert_eq!(s, "");
    }

    #[test]
    fn assembler_stamps_equal_timestamps() {
        let mut asm = RecordAssembler::new(splitter());
        let rec = asm.push(
            "TOYOTA",
            "COROLLA",
            YearRange {
                start: 2018,
                end: 2020,
            },
            PriceRange {
                min: 500_000,
                max: 700_000,
                swapped: false,
            },
        );
        assert_eq!(rec.created_at, rec.updated_at);
        assert_eq!(rec.model, "COROLLA");
        assert_eq!(asm.len(), 1);
        let out = asm.finish();
        assert_eq!(out[0].price_max, 700_000);
    }
}
