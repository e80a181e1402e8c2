use pricelist_extract::{
    catalog::{CommitSummary, JsonCatalog, PriceCatalog},
    config::ParserSettings,
    parser::PriceListParser,
};
use std::path::PathBuf;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "pricelist-catalog-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn parse(lines: &[&str]) -> Vec<pricelist_extract::record::PriceRecord> {
    let settings = ParserSettings {
        content_start_page: 1,
        ..ParserSettings::default()
    };
    PriceListParser::new(&settings)
        .unwrap()
        .parse_lines(lines.iter().copied())
        .records
}

#[test]
fn inserts_then_updates_and_persists() {
    let dir = scratch("persist");
    let path = dir.join("nested").join("market-prices.json");

    let first = parse(&[
        "TOYOTA",
        "COROLLA 2018-2020 500,000-700,000",
        "CAMRY 2019-2021 900,000",
    ]);
    let mut cat = JsonCatalog::open(&path).unwrap();
    assert!(cat.is_empty());
    let s = cat.upsert(&first).unwrap();
    assert_eq!(s, CommitSummary { inserted: 2, updated: 0 });
    assert!(path.exists());

    let second = parse(&[
        "TOYOTA",
        "COROLLA 2018-2020 520,000-720,000",
        "YARIS 2017-2019 300,000",
    ]);
    let mut reopened = JsonCatalog::open(&path).unwrap();
    assert_eq!(reopened.len(), 2);
    let s = reopened.upsert(&second).unwrap();
    assert_eq!(s, CommitSummary { inserted: 1, updated: 1 });

    let entries = JsonCatalog::open(&path).unwrap().entries();
    assert_eq!(entries.len(), 3);
    let corolla = entries.iter().find(|r| r.model_trim == "COROLLA").unwrap();
    assert_eq!((corolla.price_min, corolla.price_max), (520_000, 720_000));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn empty_commit_is_a_no_op() {
    let dir = scratch("empty");
    let path = dir.join("market-prices.json");
    let mut cat = JsonCatalog::open(&path).unwrap();
    assert_eq!(cat.upsert(&[]).unwrap(), CommitSummary::default());
    assert!(!path.exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn different_year_ranges_are_distinct_rows() {
    let dir = scratch("years");
    let path = dir.join("market-prices.json");
    let recs = parse(&[
        "HONDA",
        "CIVIC 2012-2015 400,000",
        "CIVIC 2016-2020 600,000",
    ]);
    let mut cat = JsonCatalog::open(&path).unwrap();
    assert_eq!(cat.upsert(&recs).unwrap().inserted, 2);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_catalog_fails_to_open() {
    let dir = scratch("corrupt");
    let path = dir.join("market-prices.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(JsonCatalog::open(&path).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn failed_save_rolls_back() {
    let dir = scratch("rollback");
    let path = dir.join("market-prices.json");

    let mut cat = JsonCatalog::open(&path).unwrap();
    cat.upsert(&parse(&["TOYOTA", "COROLLA 2018-2020 500,000"])).unwrap();
    assert_eq!(cat.len(), 1);

    // A directory where the temp file goes makes the next save fail.
    std::fs::create_dir_all(dir.join("market-prices.json.tmp")).unwrap();
    let res = cat.upsert(&parse(&[
        "TOYOTA",
        "COROLLA 2018-2020 520,000",
        "CAMRY 2019-2021 900,000",
    ]));
    assert!(res.is_err());
    assert_eq!(cat.len(), 1);
    assert_eq!(cat.entries()[0].price_min, 500_000);

    let on_disk = JsonCatalog::open(&path).unwrap().entries();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].price_min, 500_000);

    let _ = std::fs::remove_dir_all(&dir);
}
