//! Unit tests for the `inspect` command.

use super::*;
use crate::inspect::{InspectArgs, InspectConfig, InspectReport, run_inspect_with};
use foodscout_core::test_support::{MemoryBackend, choice_record};
use foodscout_core::{AreaDiscoveryIndex, ChoiceStore, Credentials, SessionPool};
use rstest::rstest;

fn station_config(radius: f64) -> InspectConfig {
    InspectConfig {
        lat: 25.05,
        lng: 121.53,
        radius,
        database: DEFAULT_DATABASE.into(),
        credentials: Credentials::default(),
    }
}

fn seeded_backend() -> MemoryBackend {
    let backend = MemoryBackend::new();
    let pool = SessionPool::new(backend.clone(), 1);
    let mut session = pool
        .acquire(&Credentials::default())
        .expect("open seeding session");
    AreaDiscoveryIndex::new()
        .record_discovered(&mut session, 25.05, 121.53, 200.0)
        .expect("record area");
    AreaDiscoveryIndex::new()
        .record_discovered(&mut session, 35.68, 139.76, 200.0)
        .expect("record distant area");
    let choices = ChoiceStore::new();
    for record in [
        choice_record(25.0501, 121.5301, "Noodle Bar"),
        choice_record(35.6812, 139.7671, "Ramen Counter"),
    ] {
        choices.insert(&mut session, &record).expect("insert choice");
    }
    backend
}

#[rstest]
fn report_lists_only_nearby_entries() {
    let backend = seeded_backend();
    let mut output = Vec::new();
    run_inspect_with(&station_config(1000.0), backend.clone(), &mut output)
        .expect("inspect should succeed");

    let report: InspectReport = serde_json::from_slice(&output).expect("JSON report");
    assert_eq!(report.areas.len(), 1);
    assert_eq!(report.areas[0].radius, 200.0);
    let names: Vec<_> = report
        .choices
        .iter()
        .map(|record| record.restaurant.name.as_str())
        .collect();
    assert_eq!(names, vec!["Noodle Bar"]);
    assert_eq!(backend.open_connections(), 0);
}

#[rstest]
fn rejected_credentials_surface_as_store_errors() {
    let backend = MemoryBackend::new().requiring_credentials("finder", "secret");
    let mut output = Vec::new();
    let err = run_inspect_with(&station_config(1000.0), backend, &mut output)
        .expect_err("anonymous login is rejected");
    assert!(matches!(err, CliError::OpenStore(_)));
}

#[rstest]
fn converting_defaults_the_radius() {
    let args = InspectArgs {
        lat: Some(25.05),
        lng: Some(121.53),
        ..InspectArgs::default()
    };
    let config = InspectConfig::try_from(args).expect("config should build");
    assert_eq!(config, station_config(1000.0));
}

#[rstest]
#[case::latitude(Some(91.0), Some(0.0), None, ARG_LAT)]
#[case::longitude(Some(0.0), Some(-181.0), None, ARG_LNG)]
#[case::radius(Some(0.0), Some(0.0), Some(-5.0), ARG_RADIUS)]
fn converting_rejects_invalid_regions(
    #[case] lat: Option<f64>,
    #[case] lng: Option<f64>,
    #[case] radius: Option<f64>,
    #[case] expected: &'static str,
) {
    let args = InspectArgs {
        lat,
        lng,
        radius,
        ..InspectArgs::default()
    };
    match InspectConfig::try_from(args).expect_err("invalid region") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, expected),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_without_longitude_errors() {
    let args = InspectArgs {
        lat: Some(25.05),
        ..InspectArgs::default()
    };
    match InspectConfig::try_from(args).expect_err("missing longitude") {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_LNG);
            assert_eq!(env, ENV_INSPECT_LNG);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}
