use crate::{load_config, resolve_range, Cli};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn range_defaults_to_a_week_from_today() {
    let today = date(2026, 10, 19);
    let (start, end) = resolve_range(None, None, today).unwrap();
    assert_eq!(start, today);
    assert_eq!(end, date(2026, 10, 25));

    // A start alone still spans a week, crossing the month
    let (start, end) = resolve_range(Some(date(2026, 1, 28)), None, today).unwrap();
    assert_eq!((start, end), (date(2026, 1, 28), date(2026, 2, 3)));
}

#[test]
fn single_day_range_is_allowed() {
    let day = date(2026, 3, 8);
    assert_eq!(resolve_range(Some(day), Some(day), day).unwrap(), (day, day));
}

#[test]
fn reversed_range_is_rejected() {
    let err = resolve_range(Some(date(2026, 1, 5)), Some(date(2026, 1, 4)), date(2026, 1, 1)).unwrap_err();
    assert!(err.to_string().contains("after end date"));
}

#[test]
fn cli_parses_dates_and_flags() {
    let cli = Cli::try_parse_from([
        "tide-almanac",
        "--start",
        "2026-01-01",
        "--end",
        "2026-01-07",
        "--preview-dir",
        "previews",
        "-vv",
    ])
    .unwrap();
    assert_eq!(cli.start, Some(date(2026, 1, 1)));
    assert_eq!(cli.end, Some(date(2026, 1, 7)));
    assert_eq!(cli.output, PathBuf::from("almanac.pdf"));
    assert_eq!(cli.preview_dir, Some(PathBuf::from("previews")));
    assert_eq!(cli.verbose, 2);
    assert!(!cli.stdout);

    assert!(Cli::try_parse_from(["tide-almanac", "--start", "01/01/2026"]).is_err());
}

#[test]
fn explicit_config_errors_are_fatal() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "this is not = [valid").unwrap();
    let path = file.path().to_path_buf();
    assert!(load_config(Some(&path)).is_err());

    let missing = PathBuf::from("/nonexistent/tide-almanac.toml");
    assert!(load_config(Some(&missing)).is_err());
}
