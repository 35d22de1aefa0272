use std::sync::Arc;

use tickwatch::adapter::outbound::rules::MemoryRuleSource;
use tickwatch::adapter::outbound::store::{MemoryAlertStore, MemoryPortfolioStore};
use tickwatch::application::Engine;
use tickwatch::infrastructure::bootstrap::{self, Collaborators};
use tickwatch::infrastructure::config::Config;
use tickwatch::port::MonitorApi;

use super::rules::RULES_JSON;
use crate::harness::recording_transport::RecordingTransport;
use crate::harness::scripted_fetcher::ScriptedFetcher;

/// Config tuned for tests: 1s cache TTL, no request pacing, fast retries,
/// one message per event.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.cache.ttl_secs = 1;
    config.monitor.fetch_rate_per_sec = 0.0;
    config.monitor.workers = 4;
    config.dispatch.base_delay_ms = 10;
    config.dispatch.max_delay_ms = 100;
    config.dispatch.summary = false;
    config
}

/// An engine over in-memory adapters, with handles to drive them.
pub struct TestEngine {
    pub engine: Arc<Engine>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub transport: RecordingTransport,
    pub store: Arc<MemoryPortfolioStore>,
    pub alerts: Arc<MemoryAlertStore>,
    pub rules: MemoryRuleSource,
}

impl TestEngine {
    pub async fn new(config: &Config, tickers: &[&str]) -> Self {
        Self::with_rules(config, tickers, RULES_JSON).await
    }

    pub async fn with_rules(config: &Config, tickers: &[&str], rules_json: &str) -> Self {
        let engine = Self::build(
            config,
            rules_json,
            Arc::new(MemoryPortfolioStore::new()),
            Arc::new(MemoryAlertStore::new()),
        )
        .await;

        for ticker in tickers {
            engine.engine.add_ticker(ticker).await.expect("add ticker");
        }
        engine
    }

    /// A second session over this engine's portfolio and alert stores,
    /// with its own fetcher and transport.
    pub async fn reopen(&self, config: &Config) -> Self {
        Self::build(config, RULES_JSON, self.store.clone(), self.alerts.clone()).await
    }

    async fn build(
        config: &Config,
        rules_json: &str,
        store: Arc<MemoryPortfolioStore>,
        alerts: Arc<MemoryAlertStore>,
    ) -> Self {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let transport = RecordingTransport::new();
        let rules = MemoryRuleSource::from_json(rules_json).expect("valid rules");

        let engine = bootstrap::assemble(
            config,
            Collaborators {
                rules: Box::new(rules.clone()),
                fetcher: fetcher.clone(),
                transport: Arc::new(transport.clone()),
                repository: store.clone(),
                alerts: alerts.clone(),
            },
        )
        .await
        .expect("assemble engine");

        Self {
            engine: Arc::new(engine),
            fetcher,
            transport,
            store,
            alerts,
            rules,
        }
    }
}
