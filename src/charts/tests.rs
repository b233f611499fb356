use super::*;
use tempfile::tempdir;

// === parse_size ===

#[test]
fn test_parse_size_valid_formats() {
    let test_cases = vec![
        ("2000x1000", (2000, 1000)),
        ("1200x800", (1200, 800)),
        ("640x480", (640, 480)),
    ];

    for (input, expected) in test_cases {
        let result = parse_size(input);
        assert!(result.is_ok(), "Failed to parse size: {}", input);
        assert_eq!(result.unwrap(), expected);
    }
}

#[test]
fn test_parse_size_invalid_formats() {
    let invalid_cases = vec![
        "1200",      // no separator
        "1200x",     // no height
        "x800",      // no width
        "axb",       // not numeric
        "1200y800",  // wrong separator
        "0x800",     // zero width
        "1200x0",    // zero height
        "",          // empty
        "1200x800x", // trailing part
    ];

    for invalid_input in invalid_cases {
        let result = parse_size(invalid_input);
        assert!(result.is_err(), "Should fail for input: {}", invalid_input);
    }
}

// === helpers ===

#[test]
fn test_finite_segments_split_on_nan() {
    let data = vec![
        (1.0, 1.0),
        (2.0, f64::NAN),
        (3.0, 3.0),
        (4.0, 4.0),
        (5.0, f64::NAN),
    ];
    let segments = finite_segments(&data);
    assert_eq!(segments, vec![vec![(1.0, 1.0)], vec![(3.0, 3.0), (4.0, 4.0)]]);
    assert!(finite_segments(&[(1.0, f64::NAN)]).is_empty());
}

#[test]
fn test_padded_range() {
    assert_eq!(padded_range([1.0, 5.0].into_iter(), 0.25, 0.5), (0.0, 6.0));
    assert_eq!(padded_range([2.0].into_iter(), 0.1, 0.5), (1.5, 2.5));
    assert_eq!(padded_range([f64::NAN].into_iter(), 0.1, 0.5), (0.0, 1.0));
    assert_eq!(padded_range(std::iter::empty(), 0.0, 1.0), (0.0, 1.0));
}

#[test]
fn test_date_coord_round_trip() {
    let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
    assert_eq!(coord_date(date_coord(date)), Some(date));
    assert_eq!(coord_date(date_coord(date) + 0.4), Some(date));
}

// === ChartRenderer ===

#[test]
fn test_output_path_naming() {
    let dir = tempdir().unwrap();
    let charts_dir = dir.path().join("charts");
    let renderer =
        ChartRenderer::new(ChartStyle::default(), &charts_dir, "USD_01-01-2020_31-03-2020").unwrap();

    assert!(charts_dir.is_dir());
    assert_eq!(
        renderer.output_path(6, "histogram"),
        charts_dir.join("USD_01-01-2020_31-03-2020_06_histogram.png")
    );
}

#[test]
fn test_render_rejects_empty_series() {
    let dir = tempdir().unwrap();
    let renderer = ChartRenderer::new(ChartStyle::default(), dir.path(), "empty").unwrap();
    let err = renderer.render(&[], "BYN/USD").unwrap_err();
    assert!(matches!(err, ChartError::ChartGeneration(_)));
}

fn daily_records(count: usize) -> Vec<RateRecord> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            let date = start + chrono::Duration::days(i as i64);
            let rate = 2.1 + 0.002 * i as f64 + 0.01 * ((i % 7) as f64 - 3.0);
            RateRecord::new(date, rate)
        })
        .collect()
}

fn small_renderer(dir: &Path, prefix: &str) -> ChartRenderer {
    let style = ChartStyle::default().with_size((800, 400));
    ChartRenderer::new(style, dir, prefix).unwrap()
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_render_writes_seven_charts_in_order() {
    let dir = tempdir().unwrap();
    let renderer = small_renderer(dir.path(), "USD_01-01-2020_30-03-2020");

    let written = renderer
        .render(&daily_records(90), "BYN/USD 01-01-2020 - 30-03-2020")
        .unwrap();

    assert_eq!(
        file_names(&written),
        vec![
            "USD_01-01-2020_30-03-2020_01_daily.png",
            "USD_01-01-2020_30-03-2020_02_monthly.png",
            "USD_01-01-2020_30-03-2020_03_quarterly.png",
            "USD_01-01-2020_30-03-2020_04_decomposition.png",
            "USD_01-01-2020_30-03-2020_05_changes.png",
            "USD_01-01-2020_30-03-2020_06_histogram.png",
            "USD_01-01-2020_30-03-2020_07_rolling_std.png",
        ]
    );
    for path in &written {
        assert!(path.starts_with(dir.path()));
        assert!(std::fs::metadata(path).unwrap().len() > 0, "{}", path.display());
    }
}

#[test]
fn test_render_short_series_skips_decomposition() {
    let dir = tempdir().unwrap();
    let renderer = small_renderer(dir.path(), "EUR_01-01-2020_03-01-2020");

    let written = renderer.render(&daily_records(3), "BYN/EUR").unwrap();

    assert_eq!(written.len(), 6);
    assert!(written.iter().all(|p| p.exists()));
    assert!(
        !file_names(&written)
            .iter()
            .any(|name| name.contains("decomposition"))
    );
    assert!(!renderer.output_path(4, "decomposition").exists());
}

#[test]
fn test_render_single_record() {
    let dir = tempdir().unwrap();
    let renderer = small_renderer(dir.path(), "RUB_01-01-2020_01-01-2020");

    let written = renderer.render(&daily_records(1), "BYN/RUB").unwrap();

    let names = file_names(&written);
    assert_eq!(names.len(), 6);
    assert!(names[4].ends_with("_06_histogram.png"));
    assert!(names[5].ends_with("_07_rolling_std.png"));
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn test_style_with_size() {
    let style = ChartStyle::default().with_size((800, 600));
    assert_eq!((style.width, style.height), (800, 600));
}
