use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gvadash::error_display::user_message_from_report;
use gvadash::{
    App, AppConfig, AppEvent, ChartExportFormat, CompressionFormat, GvaTable, Grouping,
    LoadOptions, SelectorFocus, TableError, Theme, ViewMode,
};
use std::io::Write;
use std::path::Path;

mod common;

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn test_app(dir: &Path) -> App {
    let mut config = AppConfig::default();
    config.chart.export_dir = dir.to_path_buf();
    App::new(common::sample_aggregator(dir), Theme::default(), config)
}

/// Process an event and every follow-up event it returns, like the main loop does.
fn send(app: &mut App, event: AppEvent) {
    let mut next = Some(event);
    while let Some(event) = next {
        next = app.event(&event);
    }
}

#[test]
fn test_app_creation() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    assert_eq!(app.grouping(), Grouping::CreativeIndustries);
    assert!(!app.indexed());
    assert_eq!(app.focus(), SelectorFocus::Breakdown);
    assert_eq!(app.view(), ViewMode::Chart);
    assert_eq!(app.matrix().years, vec![2009, 2010, 2011, 2012]);
    assert_eq!(app.figure().series.len(), Grouping::CreativeIndustries.row_order().len());
}

#[test]
fn test_config_selects_initial_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.display.default_grouping = "Digital Sector".to_string();
    config.display.default_indexed = true;
    config.display.default_view = "table".to_string();
    let app = App::new(common::sample_aggregator(dir.path()), Theme::default(), config);

    assert_eq!(app.grouping(), Grouping::DigitalSector);
    assert!(app.indexed());
    assert_eq!(app.view(), ViewMode::Table);
    assert_eq!(
        app.matrix().value("Telecommunications        ", 2011),
        Some(110.0)
    );
}

#[test]
fn test_full_workflow() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(dir.path());

    // 1. Pick the sector-level breakdown directly
    assert_eq!(
        app.event(&key('1')),
        Some(AppEvent::SelectGrouping(Grouping::All))
    );
    send(&mut app, key('1'));
    assert_eq!(app.grouping(), Grouping::All);
    assert_eq!(app.matrix().value("UK", 2011), Some(1470000.0));
    assert_eq!(app.debug.num_computes, 2);

    // 2. Switch to indexed through the Measure selector
    send(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)));
    assert_eq!(app.focus(), SelectorFocus::Measure);
    send(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Right, KeyModifiers::NONE)));
    assert!(app.indexed());
    assert_eq!(app.matrix().value("UK", 2011), Some(105.0));
    assert_eq!(app.figure().y_label, "Index (2010 = 100)");
    assert_eq!(app.debug.num_computes, 3);

    // 3. Back to the breakdown selector and step to Cultural Sector (wraps backwards)
    send(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::NONE)));
    send(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)));
    assert_eq!(app.grouping(), Grouping::CulturalSector);
    assert!(app.indexed());
    assert_eq!(app.matrix().value("Arts", 2010), Some(100.0));
    assert_eq!(app.debug.num_computes, 4);

    // 4. Table view does not recompute
    send(&mut app, key('t'));
    assert_eq!(app.view(), ViewMode::Table);
    assert_eq!(app.debug.num_computes, 4);

    // 5. Quit
    assert_eq!(app.event(&key('q')), Some(AppEvent::Exit));
}

#[test]
fn test_direct_events_only_recompute_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(dir.path());

    assert_eq!(
        app.event(&AppEvent::SelectGrouping(Grouping::CreativeIndustries)),
        None
    );
    assert_eq!(app.event(&AppEvent::SetIndexed(false)), None);
    assert_eq!(
        app.event(&AppEvent::SetIndexed(true)),
        Some(AppEvent::Recompute)
    );
    assert_eq!(app.debug.num_computes, 1);
    assert_eq!(app.event(&AppEvent::Recompute), None);
    assert_eq!(app.debug.num_computes, 2);
    assert_eq!(app.event(&AppEvent::Resize(80, 24)), None);
}

#[test]
fn test_export_from_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(dir.path());

    send(&mut app, key('i'));
    send(&mut app, key('E'));
    let eps = dir.path().join("creative-industries-indexed.eps");
    assert_eq!(app.export_path(ChartExportFormat::Eps), eps);
    let content = std::fs::read_to_string(&eps).unwrap();
    assert!(content.starts_with("%!PS-Adobe-3.0 EPSF-3.0"));
    assert!(content.contains("(Creative Industries)"));
    let status = app.status().unwrap();
    assert!(!status.is_error);
    assert!(status.text.contains("creative-industries-indexed.eps"));
}

#[test]
fn test_export_failure_shows_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = test_app(dir.path());

    send(
        &mut app,
        AppEvent::Export(dir.path().join("chart.svg")),
    );
    let status = app.status().unwrap();
    assert!(status.is_error);
    assert!(status.text.starts_with("Export failed"));

    // A new selection clears the status line
    send(&mut app, key('3'));
    assert!(app.status().is_none());
}

#[test]
fn test_load_gzip_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gva.csv.gz");
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(common::SAMPLE_CSV.as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let table = GvaTable::load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.years(), vec![2009, 2010, 2011, 2012]);

    let plain = GvaTable::load(
        &common::write_sample_csv(dir.path()),
        &LoadOptions::default(),
    )
    .unwrap();
    assert_eq!(table.observations(), plain.observations());
}

#[test]
fn test_load_with_explicit_compression() {
    let dir = tempfile::tempdir().unwrap();
    // No telling extension: compression comes from the options
    let path = dir.path().join("gva.data");
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(common::SAMPLE_CSV.as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let options = LoadOptions::new().with_compression(CompressionFormat::Gzip);
    let table = GvaTable::load(&path, &options).unwrap();
    assert!(!table.is_empty());
}

#[test]
fn test_load_errors_have_user_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "sector,sub-sector,year\nUK,All,2010\n").unwrap();

    let err = GvaTable::load(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, TableError::MissingColumn(ref c) if c == "gva"));
    let report = color_eyre::eyre::Report::new(err);
    let msg = user_message_from_report(&report, Some(&path));
    assert!(msg.contains("Column 'gva' not found"), "got: {}", msg);

    let missing = dir.path().join("nope.csv");
    assert!(GvaTable::load(&missing, &LoadOptions::default()).is_err());
}
