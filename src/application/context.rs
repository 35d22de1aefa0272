//! Shared services handed to every cycle and operation.

use std::sync::Arc;

use crate::application::cache::PriceCache;
use crate::application::dispatch::Dispatcher;
use crate::application::portfolio::Portfolio;
use crate::application::rules::RuleBook;
use crate::application::tracker::AlertTracker;

/// Cloneable bundle of the engine's stores.
#[derive(Clone)]
pub struct MonitorContext {
    pub rules: Arc<RuleBook>,
    pub cache: Arc<PriceCache>,
    pub tracker: Arc<AlertTracker>,
    pub portfolio: Arc<Portfolio>,
    pub dispatcher: Arc<Dispatcher>,
}
