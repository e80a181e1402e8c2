use pricelist_extract::{
    classify::NoiseKind,
    config::ParserSettings,
    parser::PriceListParser,
    record::PriceRecord,
};

const FF: &str = "\u{000C}";

fn settings_from_page_one() -> ParserSettings {
    ParserSettings {
        content_start_page: 1,
        ..ParserSettings::default()
    }
}

fn parser() -> PriceListParser {
    PriceListParser::new(&settings_from_page_one()).unwrap()
}

fn summary(records: &[PriceRecord]) -> Vec<(String, String, i32, i32, i64, i64)> {
    records
        .iter()
        .map(|r| {
            (
                r.brand.clone(),
                r.model_trim.clone(),
                r.year_start,
                r.year_end,
                r.price_min,
                r.price_max,
            )
        })
        .collect()
}

#[test]
fn brand_then_data_line_yields_one_record() {
    let out = parser().parse_lines(["TOYOTA", "COROLLA 2018-2020 500,000-700,000"]);
    assert_eq!(out.records.len(), 1);
    let r = &out.records[0];
    assert_eq!(r.brand, "TOYOTA");
    assert_eq!(r.model_trim, "COROLLA");
    assert_eq!((r.year_start, r.year_end), (2018, 2020));
    assert_eq!((r.price_min, r.price_max), (500_000, 700_000));
    assert_eq!(r.created_at, r.updated_at);
    assert_eq!(out.report.records, 1);
    assert_eq!(out.report.brands_seen, vec!["TOYOTA".to_string()]);
}

#[test]
fn default_settings_skip_first_seven_pages() {
    let p = PriceListParser::new(&ParserSettings::default()).unwrap();

    let early = p.parse_lines(["TOYOTA", "COROLLA 2018-2020 500,000-700,000"]);
    assert!(early.records.is_empty());
    assert_eq!(early.report.skipped.pre_content, 2);

    let mut lines: Vec<&str> = vec![FF; 7];
    lines.extend(["TOYOTA", "COROLLA 2018-2020 500,000-700,000"]);
    let out = p.parse_lines(lines);
    assert_eq!(out.report.final_page, 8);
    assert_eq!(out.records.len(), 1);
}

#[test]
fn lines_before_any_brand_are_dropped() {
    let out = parser().parse_lines([
        "COROLLA 2018-2020 500,000-700,000",
        "TOYOTA",
        "CAMRY 2019-2021 900,000",
    ]);
    assert_eq!(
        summary(&out.records),
        vec![("TOYOTA".into(), "CAMRY".into(), 2019, 2021, 900_000, 900_000)]
    );
    assert_eq!(out.report.skipped.no_brand, 1);
}

#[test]
fn motorcycle_marker_ends_extraction() {
    let out = parser().parse_lines([
        "HONDA",
        "CIVIC 2016-2020 600,000-800,000",
        "ราคาประเมินรถจักรยานยนต์",
        "HONDA",
        "CIVIC 2016-2020 600,000-800,000",
        "YAMAHA",
        "NMAX 2020-2022 60,000-70,000",
    ]);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.report.motorcycle_marker_line, Some(3));
    assert_eq!(out.report.skipped.motorcycle, 5);
    assert_eq!(out.report.brands_seen, vec!["HONDA".to_string()]);
}

#[test]
fn page_breaks_only_advance_the_counter() {
    let ff2 = format!("{FF}{FF}");
    let out = parser().parse_lines([FF, ff2.as_str(), FF]);
    assert!(out.records.is_empty());
    assert_eq!(out.report.final_page, 5);
    assert_eq!(out.report.skipped.total(), 0);
}

#[test]
fn text_after_page_break_is_dropped_by_default() {
    let first = format!("{FF}TOYOTA");
    let lines = [first.as_str(), "COROLLA 2018-2020 500,000"];

    let out = parser().parse_lines(lines);
    assert!(out.records.is_empty());
    assert_eq!(out.report.skipped.no_brand, 1);

    let reclassify = PriceListParser::new(&ParserSettings {
        reclassify_after_page_break: true,
        ..settings_from_page_one()
    })
    .unwrap();
    let out = reclassify.parse_lines(lines);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.report.final_page, 2);
}

#[test]
fn inverted_prices_are_swapped() {
    let out = parser().parse_lines([
        "HONDA",
        "CITY 2014-2016 500 100",
        "JAZZ 2014-2016 100 500",
        "BRIO 2014-2016 250,000",
    ]);
    assert_eq!(
        summary(&out.records),
        vec![
            ("HONDA".into(), "CITY".into(), 2014, 2016, 100, 500),
            ("HONDA".into(), "JAZZ".into(), 2014, 2016, 100, 500),
            ("HONDA".into(), "BRIO".into(), 2014, 2016, 250_000, 250_000),
        ]
    );
    assert_eq!(out.report.price_swaps, 1);
    assert!(out.records.iter().all(|r| r.price_min <= r.price_max));
}

#[test]
fn year_ranges_are_kept_as_written() {
    let out = parser().parse_lines(["MAZDA", "MAZDA2 2020-2018 400,000"]);
    assert_eq!((out.records[0].year_start, out.records[0].year_end), (2020, 2018));
}

#[test]
fn malformed_lines_are_skipped_not_fatal() {
    let out = parser().parse_lines([
        "NISSAN",
        "ALMERA 2018~2022 400,000",
        "NOTE 2018-2022 ราคา",
        "2018-2022 2018-2022 350,000",
        "something unexpected",
        "MARCH 2013-2016 250,000",
    ]);
    assert_eq!(
        summary(&out.records),
        vec![("NISSAN".into(), "MARCH".into(), 2013, 2016, 250_000, 250_000)]
    );
    let s = &out.report.skipped;
    assert_eq!(s.unrecognized, 2);
    assert_eq!(s.invalid_price, 1);
    assert_eq!(s.empty_model, 1);
}

#[test]
fn duplicated_year_range_is_stripped_from_model() {
    let out = parser().parse_lines(["TOYOTA", "COROLLA2018-2020 2018-2020 500,000"]);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].model_trim, "COROLLA");
    assert!(!out.records[0].model_trim.contains("2018-2020"));
}

#[test]
fn noise_lines_and_brand_switches() {
    let out = parser().parse_lines([
        "สารบัญ",
        "TOYOTA,",
        "แบบ / รุ่น ปีผลิต ราคาประเมิน",
        "HILUX VIGO 2.5 E 2008-2011 410,000-450,000",
        "12",
        "2568",
        "FORD",
        "RANGER DOUBLE CAB 2.2 XLT 2015-2018 520,000",
    ]);
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].brand, "TOYOTA");
    assert_eq!(out.records[0].model, "HILUX VIGO");
    assert_eq!(out.records[0].sub_model, "2.5 E");
    assert_eq!(out.records[1].brand, "FORD");
    assert_eq!(out.records[1].model, "RANGER DOUBLE CAB");
    // the leading header line comes before any brand
    assert_eq!(out.report.skipped.no_brand, 1);
    assert_eq!(out.report.skipped.noise, 3);
    assert_eq!(
        out.report.brands_seen,
        vec!["TOYOTA".to_string(), "FORD".to_string()]
    );
}

#[test]
fn reparsing_is_idempotent() {
    let p = parser();
    let text = "BMW\nSERIES 3 320D 2019-2022 1,500,000-1,900,000\nX1 SDRIVE20D 2020-2023 1,800,000 1,600,000\n";
    let a = p.parse_text(text);
    let b = p.parse_text(text);
    assert_eq!(a.records.len(), 2);
    assert_eq!(a.records.len(), b.records.len());
    assert!(a.records.iter().zip(&b.records).all(|(x, y)| x.same_listing(y)));
    assert_eq!(a.report, b.report);
}

#[test]
fn diagnostics_are_capped() {
    let p = parser().with_diagnostics(2);
    let out = p.parse_lines(["KIA", "junk one", "junk two", "junk three"]);
    assert_eq!(out.report.skipped.unrecognized, 3);
    assert_eq!(out.report.diagnostics.len(), 2);
    assert_eq!(out.report.diagnostics[0].line, 2);
    assert_eq!(out.report.diagnostics[0].text, "junk one");
}

#[test]
fn extra_brands_are_recognized() {
    let p = PriceListParser::new(&ParserSettings {
        extra_brands: vec!["VINFAST".into()],
        ..settings_from_page_one()
    })
    .unwrap();
    let out = p.parse_lines(["VINFAST", "VF 5 2023-2024 450,000-500,000"]);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].brand, "VINFAST");
}

#[test]
fn motorcycle_entry_in_table_of_contents_does_not_latch() {
    let p = PriceListParser::new(&ParserSettings::default()).unwrap();
    let mut lines: Vec<&str> = vec!["สารบัญ", "ราคาประเมินรถจักรยานยนต์ ........ 120"];
    lines.extend(vec![FF; 7]);
    lines.extend(["TOYOTA", "COROLLA 2018-2020 500,000-700,000"]);

    let out = p.parse_lines(lines);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.report.motorcycle_marker_line, None);
    assert_eq!(out.report.skipped.motorcycle, 0);
    assert_eq!(out.report.skipped.pre_content, 2);
}

#[test]
fn brand_at_top_of_page_is_lost_without_reclassify() {
    let top = format!("{FF}TOYOTA");
    let lines = [
        "HONDA",
        "CIVIC 2016-2020 600,000",
        top.as_str(),
        "COROLLA 2018-2020 500,000",
    ];

    let out = parser().parse_lines(lines);
    assert_eq!(out.records[1].brand, "HONDA");
    assert_eq!(out.records[1].model_trim, "COROLLA");

    let reclassify = PriceListParser::new(&ParserSettings {
        reclassify_after_page_break: true,
        ..settings_from_page_one()
    })
    .unwrap();
    let out = reclassify.parse_lines(lines);
    assert_eq!(out.records[1].brand, "TOYOTA");
}

#[test]
fn noise_diagnostics_name_the_rule() {
    let p = parser().with_diagnostics(10);
    let out = p.parse_lines(["KIA", "ปีผลิต", "42"]);
    let kinds: Vec<Option<NoiseKind>> = out.report.diagnostics.iter().map(|d| d.noise).collect();
    assert_eq!(
        kinds,
        vec![Some(NoiseKind::TableHeader), Some(NoiseKind::PageNumber)]
    );

    let json = serde_json::to_value(&out.report.diagnostics[0]).unwrap();
    assert_eq!(json["reason"], "noise");
    assert_eq!(json["noise"], "table_header");
}
