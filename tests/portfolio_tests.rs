mod harness;
mod support;

use std::sync::Arc;

use tickwatch::adapter::outbound::rules::MemoryRuleSource;
use rust_decimal_macros::dec;
use tickwatch::adapter::outbound::store::{JsonAlertStateFile, JsonPortfolioFile, MemoryAlertStore};
use tickwatch::application::Engine;
use tickwatch::error::{Error, PersistenceError};
use tickwatch::infrastructure::bootstrap::{self, Collaborators};
use tickwatch::domain::Direction;
use tickwatch::port::{MonitorApi, PortfolioRepository};

use harness::recording_transport::RecordingTransport;
use harness::scripted_fetcher::ScriptedFetcher;
use support::engine::{test_config, TestEngine};
use support::rules::RULES_JSON;

async fn engine_over(repository: Arc<dyn PortfolioRepository>) -> Engine {
    bootstrap::assemble(
        &test_config(),
        Collaborators {
            rules: Box::new(MemoryRuleSource::from_json(RULES_JSON).unwrap()),
            fetcher: Arc::new(ScriptedFetcher::new()),
            transport: Arc::new(RecordingTransport::new()),
            repository,
            alerts: Arc::new(MemoryAlertStore::new()),
        },
    )
    .await
    .unwrap()
}

/// An engine over files in `dir`, the way separate CLI invocations see it.
async fn session_in(
    dir: &std::path::Path,
    fetcher: Arc<ScriptedFetcher>,
    transport: RecordingTransport,
) -> Engine {
    bootstrap::assemble(
        &test_config(),
        Collaborators {
            rules: Box::new(MemoryRuleSource::from_json(RULES_JSON).unwrap()),
            fetcher,
            transport: Arc::new(transport),
            repository: Arc::new(JsonPortfolioFile::new(dir.join("portfolio.json"))),
            alerts: Arc::new(JsonAlertStateFile::new(dir.join("alerts.json"))),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn portfolio_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.json");

    let first = engine_over(Arc::new(JsonPortfolioFile::new(&path))).await;
    first.add_ticker("aapl").await.unwrap();
    first.add_ticker("MSFT").await.unwrap();
    first.add_ticker("XOM").await.unwrap();
    first.remove_ticker("msft").await.unwrap();
    drop(first);

    let second = engine_over(Arc::new(JsonPortfolioFile::new(&path))).await;
    let tickers: Vec<String> = second
        .list_portfolio()
        .await
        .into_iter()
        .map(|entry| entry.ticker.to_string())
        .collect();

    assert_eq!(tickers, vec!["AAPL", "XOM"]);
}

#[tokio::test]
async fn fired_alert_is_not_resent_by_the_next_invocation() {
    let dir = tempfile::tempdir().unwrap();

    let fetcher = Arc::new(ScriptedFetcher::new());
    let transport = RecordingTransport::new();
    let first = session_in(dir.path(), fetcher.clone(), transport.clone()).await;
    first.add_ticker("AAPL").await.unwrap();
    fetcher.prices("AAPL", &[dec!(205)]);
    assert_eq!(first.run_cycle_now().await.unwrap().alerts.len(), 1);
    drop(first);
    assert!(dir.path().join("alerts.json").exists());

    let fetcher = Arc::new(ScriptedFetcher::new());
    let second = session_in(dir.path(), fetcher.clone(), transport.clone()).await;
    let fired = second.check_alerts(Some("AAPL")).await.unwrap();
    assert_eq!(fired[0].direction, Some(Direction::Above));

    fetcher.prices("AAPL", &[dec!(206)]);
    assert!(second.run_cycle_now().await.unwrap().alerts.is_empty());
    assert_eq!(transport.delivered().len(), 1);
}

#[tokio::test]
async fn add_and_remove_are_idempotent() {
    let t = TestEngine::new(&test_config(), &["AAPL"]).await;

    let again = t.engine.add_ticker(" aapl ").await.unwrap();
    assert!(!again.changed);
    assert_eq!(again.tickers.len(), 1);

    let absent = t.engine.remove_ticker("NVDA").await.unwrap();
    assert!(!absent.changed);
    assert_eq!(t.store.tickers().len(), 1);
}

#[tokio::test]
async fn failed_commit_leaves_portfolio_unchanged() {
    let t = TestEngine::new(&test_config(), &["AAPL"]).await;
    t.store.fail_saves(true);

    let err = t.engine.add_ticker("MSFT").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Persistence(PersistenceError::Unavailable(_))
    ));
    assert!(t.engine.remove_ticker("AAPL").await.is_err());

    let listed: Vec<String> = t
        .engine
        .list_portfolio()
        .await
        .into_iter()
        .map(|entry| entry.ticker.to_string())
        .collect();
    assert_eq!(listed, vec!["AAPL"]);

    t.store.fail_saves(false);
    assert!(t.engine.add_ticker("MSFT").await.unwrap().changed);
    assert_eq!(t.store.tickers().len(), 2);
}

#[tokio::test]
async fn invalid_ticker_is_rejected() {
    let t = TestEngine::new(&test_config(), &[]).await;

    for raw in ["", "   ", "BRK B"] {
        let err = t.engine.add_ticker(raw).await.unwrap_err();
        assert!(matches!(err, Error::Domain(_)), "{raw:?} gave {err:?}");
    }
    assert!(t.store.tickers().is_empty());
}

#[tokio::test]
async fn corrupt_portfolio_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = bootstrap::assemble(
        &test_config(),
        Collaborators {
            rules: Box::new(MemoryRuleSource::from_json(RULES_JSON).unwrap()),
            fetcher: Arc::new(ScriptedFetcher::new()),
            transport: Arc::new(RecordingTransport::new()),
            repository: Arc::new(JsonPortfolioFile::new(&path)),
            alerts: Arc::new(MemoryAlertStore::new()),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(Error::Persistence(PersistenceError::Corrupt { .. }))
    ));
}
