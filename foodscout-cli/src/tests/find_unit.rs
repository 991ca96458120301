//! Focused unit tests covering `find` configuration and output.

use super::helpers::{Workspace, write_utf8};
use super::*;
use crate::find::{FindArgs, FindConfig, FindReport, config_from_layers_for_test, run_find_with};
use crate::find::{DefaultFinderBuilder, Finder, FinderBuilder};
use crate::sources::PlacesSource;
use foodscout_core::{RankingMode, SearchError, SearchOutcome, SearchQuery, SearchSource};
use rstest::{fixture, rstest};
use std::time::Duration;

#[fixture]
fn complete_args() -> FindArgs {
    FindArgs {
        lat: Some(25.05),
        lng: Some(121.53),
        radius: Some(200.0),
        api_key: Some("key".to_owned()),
        ..FindArgs::default()
    }
}

#[rstest]
#[case::lat(ARG_LAT, ENV_FIND_LAT)]
#[case::lng(ARG_LNG, ENV_FIND_LNG)]
#[case::radius(ARG_RADIUS, ENV_FIND_RADIUS)]
fn converting_without_coordinates_errors(
    complete_args: FindArgs,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let mut args = complete_args;
    match field {
        ARG_LAT => args.lat = None,
        ARG_LNG => args.lng = None,
        _ => args.radius = None,
    }
    let err = FindConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn converting_applies_defaults(complete_args: FindArgs) {
    let config = FindConfig::try_from(complete_args).expect("config should build");

    assert_eq!(config.query, SearchQuery::new(25.05, 121.53, 200.0));
    assert_eq!(config.database, DEFAULT_DATABASE);
    assert_eq!(config.places, PlacesSource::Api("key".to_owned()));
    assert_eq!(config.finder.store.location, DEFAULT_DATABASE);
    assert_eq!(config.finder.store.max_sessions, 10);
    assert_eq!(config.finder.search.language, "en");
    assert_eq!(config.finder.search.pagination.max_pages, 3);
    assert_eq!(
        config.finder.search.pagination.page_delay,
        Duration::from_secs(3)
    );
}

#[rstest]
fn converting_applies_overrides(complete_args: FindArgs) {
    let args = FindArgs {
        database: Some("var/cache.sqlite".into()),
        db_name: Some("foodscout".to_owned()),
        db_user: Some("finder".to_owned()),
        db_password: Some("secret".to_owned()),
        max_sessions: Some(2),
        language: Some("zh-TW".to_owned()),
        max_pages: Some(1),
        page_delay_ms: Some(0),
        ranking_mode: Some(RankingMode::HighestSelect),
        ..complete_args
    };
    let config = FindConfig::try_from(args).expect("config should build");

    assert_eq!(config.database, "var/cache.sqlite");
    assert_eq!(config.finder.store.credentials.username, "finder");
    assert_eq!(config.finder.store.credentials.password, "secret");
    assert_eq!(config.finder.store.max_sessions, 2);
    assert_eq!(config.finder.search.language, "zh-TW");
    assert_eq!(config.finder.search.ranking_mode, RankingMode::HighestSelect);
    assert_eq!(config.finder.search.pagination.max_pages, 1);
    assert_eq!(config.finder.search.pagination.page_delay, Duration::ZERO);
}

#[rstest]
fn zero_max_sessions_is_rejected(complete_args: FindArgs) {
    let args = FindArgs {
        max_sessions: Some(0),
        ..complete_args
    };
    match FindConfig::try_from(args).expect_err("zero sessions") {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_MAX_SESSIONS),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
#[case::fixture_wins(Some("places.json"), Some("key"), Some(PlacesSource::Fixture("places.json".into())))]
#[case::api_key(None, Some("key"), Some(PlacesSource::Api("key".to_owned())))]
#[case::blank_key(None, Some("  "), None)]
#[case::nothing(None, None, None)]
fn places_source_resolution(
    #[case] fixture: Option<&str>,
    #[case] api_key: Option<&str>,
    #[case] expected: Option<PlacesSource>,
) {
    let resolved = PlacesSource::resolve(fixture.map(Into::into), api_key.map(str::to_owned));
    match (resolved, expected) {
        (Ok(source), Some(expected)) => assert_eq!(source, expected),
        (Err(CliError::MissingPlacesSource { fixture, api_key }), None) => {
            assert_eq!(fixture, ARG_PLACES_FIXTURE);
            assert_eq!(api_key, ARG_API_KEY);
        }
        (other, _) => panic!("unexpected resolution {other:?}"),
    }
}

#[rstest]
fn api_key_is_redacted_from_debug_output() {
    let rendered = format!("{:?}", PlacesSource::Api("super-secret".to_owned()));
    assert!(!rendered.contains("super-secret"));
}

#[rstest]
fn validate_sources_reports_missing_fixture(complete_args: FindArgs) {
    let workspace = Workspace::new();
    let args = FindArgs {
        places_fixture: Some(workspace.path("missing.json")),
        ..complete_args
    };
    let config = FindConfig::try_from(args).expect("config should build");
    match config.validate_sources().expect_err("missing fixture") {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, ARG_PLACES_FIXTURE),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_directory_fixture(complete_args: FindArgs) {
    let workspace = Workspace::new();
    let dir = workspace.path("fixtures");
    std::fs::create_dir(&dir).expect("create fixture directory");
    let args = FindArgs {
        places_fixture: Some(dir.clone()),
        ..complete_args
    };
    let config = FindConfig::try_from(args).expect("config should build");
    match config.validate_sources().expect_err("directory fixture") {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_PLACES_FIXTURE);
            assert_eq!(path, dir);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "lat": "north" }));

    match config_from_layers_for_test(composer.layers()).expect_err("invalid layer") {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "lat": 1.0,
            "lng": 2.0,
            "radius": 300.0,
            "language": "ja",
            "api_key": "from-file",
        }),
        None,
    );
    composer.push_environment(json!({
        "radius": 250.0,
        "language": "zh-TW",
    }));
    composer.push_cli(json!({
        "radius": 200.0,
        "ranking_mode": "highest-rate",
    }));

    let config = config_from_layers_for_test(composer.layers()).expect("merged config");
    assert_eq!(config.query, SearchQuery::new(1.0, 2.0, 200.0));
    assert_eq!(config.finder.search.language, "zh-TW");
    assert_eq!(config.places, PlacesSource::Api("from-file".to_owned()));
    assert_eq!(config.finder.search.ranking_mode, RankingMode::HighestRate);
}

struct RejectingBuilder;

struct RejectingFinder;

impl Finder for RejectingFinder {
    fn find(&self, _query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        Err(SearchError::NotImplemented {
            mode: RankingMode::HighestSelect,
        })
    }
}

impl FinderBuilder for RejectingBuilder {
    fn build(&self, _config: &FindConfig) -> Result<Box<dyn Finder>, CliError> {
        Ok(Box::new(RejectingFinder))
    }
}

#[rstest]
fn search_errors_are_surfaced(complete_args: FindArgs) {
    let mut output = Vec::new();
    let err = run_find_with(complete_args, &RejectingBuilder, &mut output)
        .expect_err("finder rejects every search");
    assert!(matches!(
        err,
        CliError::Search(SearchError::NotImplemented { .. })
    ));
    assert!(output.is_empty());
}

#[rstest]
fn default_builder_serves_fixture_searches() {
    let workspace = Workspace::new();
    let args = FindArgs {
        lat: Some(25.05),
        lng: Some(121.53),
        radius: Some(200.0),
        database: Some(workspace.path("db/foodscout.sqlite")),
        places_fixture: Some(workspace.station_fixture()),
        page_delay_ms: Some(0),
        ..FindArgs::default()
    };

    let mut output = Vec::new();
    run_find_with(args, &DefaultFinderBuilder, &mut output).expect("search should succeed");

    let report: FindReport = serde_json::from_slice(&output).expect("JSON report");
    assert_eq!(report.source, SearchSource::Remote);
    assert_eq!(report.count, 3);
    let names: Vec<_> = report
        .records
        .iter()
        .map(|record| record.restaurant.name.as_str())
        .collect();
    assert!(names.contains(&"Corner Tea Stand"));
}

#[rstest]
fn malformed_fixture_fails_to_build(complete_args: FindArgs) {
    let workspace = Workspace::new();
    let fixture = workspace.path("broken.json");
    write_utf8(&fixture, b"{ not json");
    let args = FindArgs {
        places_fixture: Some(fixture),
        database: Some(workspace.path("cache.sqlite")),
        ..complete_args
    };
    let mut output = Vec::new();
    let err = run_find_with(args, &DefaultFinderBuilder, &mut output).expect_err("bad fixture");
    assert!(matches!(err, CliError::LoadPlacesFixture(_)));
}
