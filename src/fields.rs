use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Reasons a single data line is rejected. None of these abort a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("invalid year range format: {0:?}")]
    InvalidYearRange(String),
    #[error("invalid year {0:?}")]
    InvalidYear(String),
    #[error("empty price string after cleaning")]
    EmptyPrice,
    #[error("invalid price number {0:?}")]
    InvalidPrice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
    /// The source listed the bounds in descending order.
    pub swapped: bool,
}

const CURRENCY_SYMBOLS: &[char] = &['$', '฿'];

/// Parses `"YYYY-YYYY"`. Whitespace around either side is tolerated; the two
/// years are returned as written, with no ordering correction.
pub fn parse_year_range(token: &str) -> Result<YearRange, FieldError> {
    let parts: Vec<&str> = token.split('-').collect();
    if parts.len() != 2 {
        return Err(FieldError::InvalidYearRange(token.to_string()));
    }
    let start = parse_year(parts[0])?;
    let end = parse_year(parts[1])?;
    Ok(YearRange { start, end })
}

fn parse_year(raw: &str) -> Result<i32, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::InvalidYear(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| FieldError::InvalidYear(raw.to_string()))
}

/// Removes thousands separators and currency symbols.
pub fn clean_price_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parses the price column of a data line into ordered bounds.
///
/// The cleaned text is split on whitespace when it has any, otherwise on
/// hyphens. With two or more tokens only the first and last are used.
pub fn parse_price_range(raw: &str) -> Result<PriceRange, FieldError> {
    let cleaned = clean_price_text(raw);

    let tokens: Vec<&str> = if cleaned.contains(char::is_whitespace) {
        cleaned.split_whitespace().collect()
    } else if cleaned.contains('-') {
        cleaned.split('-').filter(|t| !t.is_empty()).collect()
    } else if cleaned.is_empty() {
        Vec::new()
    } else {
        vec![cleaned.as_str()]
    };

    match tokens.as_slice() {
        [] => Err(FieldError::EmptyPrice),
        [only] => {
            let value = parse_price(only)?;
            Ok(PriceRange {
                min: value,
                max: value,
                swapped: false,
            })
        }
        [first, .., last] => {
            let lo = parse_price(first)?;
            let hi = parse_price(last)?;
            if lo > hi {
                debug!("price bounds inverted in {:?}; swapping {} and {}", raw, lo, hi);
                Ok(PriceRange {
                    min: hi,
                    max: lo,
                    swapped: true,
                })
            } else {
                Ok(PriceRange {
                    min: lo,
                    max: hi,
                    swapped: false,
                })
            }
        }
    }
}

fn parse_price(token: &str) -> Result<i64, FieldError> {
    token
        .parse::<i64>()
        .map_err(|_| FieldError::InvalidPrice(token.to_string()))
}
