use pricelist_extract::{config::Config, normalize::normalize_text};

#[test]
fn normalizes_newlines_and_keeps_page_breaks() {
    let cfg = Config::default();
    let out = normalize_text(&cfg, "TOYOTA\r\n\u{000C}COROLLA 2018-2020 500,000\r\n");
    assert_eq!(out, "TOYOTA\n\u{000C}COROLLA 2018-2020 500,000\n");
}

#[test]
fn sanitizes_control_chars() {
    let cfg = Config::default();
    let out = normalize_text(&cfg, "Alpha\u{0002}Beta\u{0084}\nLine\tTabbed\r\nNext");

    assert!(!out.contains('\u{0002}'));
    assert!(out.contains("AlphaBeta"));
    // Non-ASCII controls are left alone.
    assert!(out.contains('\u{0084}'));
    assert!(out.contains('\n'));
    assert!(out.contains('\t'));
}

#[test]
fn nfkc_folds_fullwidth_digits_when_enabled() {
    let mut cfg = Config::default();
    cfg.postprocess.normalize_unicode = true;
    let out = normalize_text(&cfg, "ＣＩＶＩＣ ２０１８-２０２０ ５００,０００");
    assert_eq!(out, "CIVIC 2018-2020 500,000");
}
