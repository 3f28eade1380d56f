use std::collections::HashSet;

use chrono::NaiveDate;
use climate_etl::generator::{default_start, generate_records, generate_sample_csv};
use climate_etl::record::{DATA_SOURCE, LOCATIONS};
use climate_etl::PipelineError;

#[test]
fn one_record_per_date_and_location() {
    for days in [0u32, 1, 5, 31, 366] {
        let rows = generate_records(default_start(), days).unwrap();
        assert_eq!(rows.len(), days as usize * LOCATIONS.len());

        let keys: HashSet<_> = rows.iter().map(|r| (r.date, r.location_id.clone())).collect();
        assert_eq!(keys.len(), rows.len(), "duplicate (date, location) for days={days}");
    }
}

#[test]
fn precipitation_never_negative() {
    let start = NaiveDate::from_ymd_opt(1999, 12, 30).unwrap();
    for r in generate_records(start, 50).unwrap() {
        assert!(r.precip_mm >= 0.0, "negative precip in {r:?}");
    }
}

#[test]
fn location_attributes_depend_only_on_id() {
    for r in generate_records(default_start(), 10).unwrap() {
        let loc = LOCATIONS.iter().find(|l| l.id == r.location_id).unwrap();
        assert_eq!(r.location_name, loc.name);
        assert_eq!((r.lat, r.lon), (loc.lat, loc.lon));
        assert_eq!(r.data_source, DATA_SOURCE);
    }
}

#[test]
fn reruns_are_byte_identical() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let a = tmp.path().join("a/bronze.csv");
    let b = tmp.path().join("b/bronze.csv");
    let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();

    generate_sample_csv(&a, start, 7)?;
    generate_sample_csv(&b, start, 7)?;
    assert_eq!(std::fs::read(&a)?, std::fs::read(&b)?);

    // Overwriting in place yields the same bytes too.
    let before = std::fs::read(&a)?;
    generate_sample_csv(&a, start, 7)?;
    assert_eq!(std::fs::read(&a)?, before);
    Ok(())
}

#[test]
fn dates_cross_month_boundaries() {
    let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
    let rows = generate_records(start, 3).unwrap();
    let dates: Vec<_> = rows.iter().step_by(LOCATIONS.len()).map(|r| r.date.to_string()).collect();
    assert_eq!(dates, ["2024-02-28", "2024-02-29", "2024-03-01"]);
}

#[test]
fn calendar_overflow_fails_instead_of_repeating_dates() {
    let start = NaiveDate::MAX.pred_opt().unwrap();
    let err = generate_records(start, 5).unwrap_err();
    assert!(matches!(err, PipelineError::DateOutOfRange { day: 2, .. }), "got {err}");
}
