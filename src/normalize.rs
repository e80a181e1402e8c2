use crate::config::Config;
use unicode_normalization::UnicodeNormalization;

/// Cleans extracted text before it is split into lines.
pub fn normalize_text(cfg: &Config, raw: &str) -> String {
    let mut text = raw.to_string();

    if cfg.postprocess.normalize_newlines {
        text = text.replace("\r\n", "\n");
    }

    if cfg.postprocess.normalize_unicode {
        text = text.nfkc().collect::<String>();
    }

    sanitize_control_chars(
        &text,
        &cfg.postprocess.control_chars_to_sanitize,
        &cfg.parser.page_separator,
    )
}

fn sanitize_control_chars(s: &str, codes: &[u8], page_separator: &str) -> String {
    if codes.is_empty() {
        return s.to_string();
    }

    let mut mask = [false; 128];
    for &code in codes {
        if (code as usize) < mask.len() {
            mask[code as usize] = true;
        }
    }

    s.chars()
        .filter(|&ch| {
            // Line structure and page breaks are what the parser runs on.
            if ch == '\n' || ch == '\r' || ch == '\t' || page_separator.contains(ch) {
                return true;
            }
            let cp = ch as u32;
            if cp < 128 { !mask[cp as usize] } else { true }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_separator_even_if_listed() {
        let out = sanitize_control_chars("a\u{000C}b\u{0002}c", &[0x02, 0x0C], "\u{000C}");
        assert_eq!(out, "a\u{000C}bc");
    }

    #[test]
    fn empty_mask_is_identity() {
        assert_eq!(sanitize_control_chars("a\u{0001}", &[], "\u{000C}"), "a\u{0001}");
    }
}
