//! Orchestration tests against the in-memory backend
//!
//! Time is paused, so the interaction budget and navigation timeout elapse
//! instantly.
//!
//! Run with: cargo test -p lab-analysis --test analyzer

#[path = "common/fake.rs"]
mod fake;

use fake::{FakeLauncher, PageScript};
use lab_analysis::config::{AnalysisConfig, DeviceProfile};
use lab_analysis::{AnalysisError, Analyzer, MetricName, MetricStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn test_config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.analysis.interaction_budget_ms = 1_000;
    config.analysis.navigation_timeout_ms = 10_000;
    config.analysis.seed = Some(7);
    config
}

#[tokio::test(start_paused = true)]
async fn test_successful_analysis_reports_metrics() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Tasks(vec![50.0, 75.0, 400.0]));
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let report = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(report.url, "https://example.com");
    assert_eq!(report.device, DeviceProfile::mobile().description());
    assert_eq!(report.metrics.len(), 4);

    let tbt = report.metric(MetricName::Tbt).unwrap();
    assert_eq!(tbt.value, 525.0);
    assert_eq!(tbt.status, MetricStatus::NeedsImprovement);
    assert_eq!(report.metric(MetricName::InpLab).unwrap().value, 400.0);
    assert_eq!(report.metric(MetricName::LongTaskCount).unwrap().value, 3.0);

    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_steps_run_in_order() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Tasks(vec![]));
    let analyzer = Analyzer::new(launcher.clone(), &test_config());

    analyzer.analyze("https://example.com").await.unwrap();

    let events = launcher.session_events(0);
    let position = |name: &str| events.iter().position(|e| e.starts_with(name)).unwrap();
    let last_click = events.iter().rposition(|e| e == "click").unwrap();

    assert_eq!(events[0], "arm");
    assert!(position("goto") < position("click"));
    assert!(last_click < position("extract"));
    assert_eq!(events.last().map(String::as_str), Some("close"));
    assert!(events.contains(&"type test".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_empty_url_launches_nothing() {
    let launcher = FakeLauncher::new();
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    for raw in ["", "   ", "not a url", "ftp://example.com/file"] {
        let err = analyzer.analyze(raw).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)), "{:?} gave {:?}", raw, err);
        assert!(err.is_client_error());
    }

    assert_eq!(counters.acquired(), 0);
    assert_eq!(counters.released(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_navigation_releases_session_once() {
    let launcher = FakeLauncher::new().page("https://down.example", PageScript::Fail);
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher.clone(), &test_config());

    let err = analyzer.analyze("https://down.example").await.unwrap_err();

    assert!(matches!(err, AnalysisError::Navigation { .. }));
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 1);

    // Nothing ran against the page after the failed load
    let events = launcher.session_events(0);
    assert!(!events.iter().any(|e| e == "click" || e == "extract"));
}

#[tokio::test(start_paused = true)]
async fn test_navigation_timeout_releases_session() {
    let launcher = FakeLauncher::new().page("https://slow.example", PageScript::Hang);
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let err = analyzer.analyze("https://slow.example").await.unwrap_err();

    match err {
        AnalysisError::NavigationTimeout { url, timeout_ms } => {
            assert_eq!(url, "https://slow.example");
            assert_eq!(timeout_ms, 10_000);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(counters.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_acquisition_failure_has_nothing_to_release() {
    let launcher = FakeLauncher::new().failing_acquire();
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let err = analyzer.analyze("https://example.com").await.unwrap_err();

    assert!(matches!(err, AnalysisError::SessionAcquisition(_)));
    assert!(!err.is_client_error());
    assert_eq!(counters.released(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_instrumentation_failure_skips_navigation() {
    let launcher = FakeLauncher::new()
        .page("https://example.com", PageScript::Tasks(vec![100.0]))
        .failing_instrumentation();
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher.clone(), &test_config());

    let err = analyzer.analyze("https://example.com").await.unwrap_err();

    assert!(matches!(err, AnalysisError::Instrumentation(_)));
    assert_eq!(counters.released(), 1);
    assert_eq!(launcher.session_events(0), vec!["close".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_buffer_is_instrumentation_error() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Garbage);
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let err = analyzer.analyze("https://example.com").await.unwrap_err();

    assert!(matches!(err, AnalysisError::Instrumentation(_)));
    assert_eq!(counters.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_click_failures_do_not_abort_analysis() {
    let launcher = FakeLauncher::new()
        .page("https://example.com", PageScript::Tasks(vec![250.0]))
        .broken_click(1);
    let analyzer = Analyzer::new(launcher, &test_config());

    let report = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(report.metric(MetricName::InpLab).unwrap().value, 250.0);
}

#[tokio::test(start_paused = true)]
async fn test_typing_and_scroll_failures_do_not_abort_analysis() {
    let launcher = FakeLauncher::new()
        .page("https://example.com", PageScript::Tasks(vec![90.0, 110.0]))
        .failing_typing()
        .failing_scrolls();
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher.clone(), &test_config());

    let report = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(report.metric(MetricName::Tbt).unwrap().value, 200.0);
    let events = launcher.session_events(0);
    assert!(events.iter().any(|e| e == "type test"));
    assert!(events.iter().any(|e| e == "scroll"));
    assert_eq!(counters.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_element_lookup_failures_do_not_abort_analysis() {
    let launcher = FakeLauncher::new()
        .page("https://example.com", PageScript::Tasks(vec![75.0]))
        .failing_lookups();
    let analyzer = Analyzer::new(launcher.clone(), &test_config());

    let report = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(report.metric(MetricName::LongTaskCount).unwrap().value, 1.0);
    let events = launcher.session_events(0);
    assert!(!events.iter().any(|e| e == "click" || e.starts_with("type")));
    assert!(events.iter().any(|e| e == "scroll"));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_failure_keeps_successful_report() {
    let launcher = FakeLauncher::new()
        .page("https://example.com", PageScript::Tasks(vec![120.0]))
        .failing_close();
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let report = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(report.metric(MetricName::InpLab).unwrap().value, 120.0);
    assert_eq!(counters.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_failure_keeps_navigation_error() {
    let launcher = FakeLauncher::new()
        .page("https://down.example", PageScript::Fail)
        .failing_close();
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let err = analyzer.analyze("https://down.example").await.unwrap_err();

    assert!(matches!(err, AnalysisError::Navigation { .. }), "got {:?}", err);
    assert_eq!(counters.released(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_caller_still_releases_session() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Tasks(vec![80.0]));
    let counters = launcher.counters.clone();
    let mut config = test_config();
    config.analysis.interaction_budget_ms = 5_000;
    config.analysis.max_concurrent = 1;
    let analyzer = Arc::new(Analyzer::new(launcher.clone(), &config));

    let caller = tokio::spawn({
        let analyzer = analyzer.clone();
        async move { analyzer.analyze("https://example.com").await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(counters.acquired(), 1);
    assert_eq!(counters.released(), 0);

    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    // The session finishes its budget in the background, then closes
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(counters.released(), counters.acquired());
    assert_eq!(launcher.session_events(0).last().map(String::as_str), Some("close"));
    assert_eq!(analyzer.available_permits(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_analyses_are_isolated() {
    let launcher = FakeLauncher::new()
        .page("https://a.example", PageScript::Tasks(vec![60.0]))
        .page("https://b.example", PageScript::Tasks(vec![300.0, 400.0, 700.0]));
    let counters = launcher.counters.clone();
    let analyzer = Analyzer::new(launcher, &test_config());

    let (a, b) = tokio::join!(
        analyzer.analyze("https://a.example"),
        analyzer.analyze("https://b.example")
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.url, "https://a.example");
    assert_eq!(a.metric(MetricName::LongTaskCount).unwrap().value, 1.0);
    assert_eq!(a.metric(MetricName::Tbt).unwrap().value, 60.0);

    assert_eq!(b.url, "https://b.example");
    assert_eq!(b.metric(MetricName::LongTaskCount).unwrap().value, 3.0);
    assert_eq!(b.metric(MetricName::Tbt).unwrap().value, 1400.0);
    assert_eq!(b.metric(MetricName::Tbt).unwrap().status, MetricStatus::Poor);

    assert_eq!(counters.acquired(), 2);
    assert_eq!(counters.released(), 2);
    assert_eq!(counters.max_live(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_is_bounded() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Tasks(vec![]));
    let counters = launcher.counters.clone();
    let mut config = test_config();
    config.analysis.max_concurrent = 1;
    let analyzer = Analyzer::new(launcher, &config);

    let (a, b, c) = tokio::join!(
        analyzer.analyze("https://example.com"),
        analyzer.analyze("https://example.com"),
        analyzer.analyze("https://example.com")
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    assert_eq!(counters.acquired(), 3);
    assert_eq!(counters.max_live(), 1);
    assert_eq!(analyzer.available_permits(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_rejects_new_work() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Tasks(vec![]));
    let analyzer = Analyzer::new(launcher, &test_config());

    analyzer.shutdown();
    let err = analyzer.analyze("https://example.com").await.unwrap_err();

    assert!(matches!(err, AnalysisError::Unavailable));
}

#[tokio::test(start_paused = true)]
async fn test_desktop_preset_descriptor() {
    let launcher = FakeLauncher::new().page("https://example.com", PageScript::Tasks(vec![]));
    let config = AnalysisConfig::from_str(
        r#"
        [analysis]
        interaction_budget_ms = 500

        [device]
        preset = "desktop"
        "#,
    )
    .unwrap();
    let analyzer = Analyzer::new(launcher, &config);

    let report = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(report.device, "Desktop (Chrome, 4G, 1920x1080)");
}
