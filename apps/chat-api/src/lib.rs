pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;

use std::sync::Arc;

use config::Config;
use db::history::HistoryStore;
use gateway::correlator::ResponseCorrelator;
use gateway::fanout::Fanout;
use gateway::handler::RelayDispatcher;
use gateway::history::HistorySink;
use gateway::registry::SessionRegistry;
use ligo_common::{BusError, TopicBus};
use tokio::task::JoinHandle;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub fanout: Arc<Fanout>,
    pub history: HistorySink,
    pub bus: Arc<dyn TopicBus>,
    pub dispatcher: Arc<RelayDispatcher>,
    pub correlator: Arc<ResponseCorrelator>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the relay core over a topic bus and a history store.
    pub fn new(config: Config, bus: Arc<dyn TopicBus>, store: Arc<dyn HistoryStore>) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let history = HistorySink::new(store, config.history_room.clone());
        let fanout = Arc::new(Fanout::new(registry.clone(), Some(history.clone())));
        let dispatcher = Arc::new(RelayDispatcher::new(registry.clone(), bus.clone()));
        let correlator = Arc::new(ResponseCorrelator::new(fanout.clone()));

        Self {
            registry,
            fanout,
            history,
            bus,
            dispatcher,
            correlator,
            config: Arc::new(config),
        }
    }

    /// Subscribe to every relay topic in the configured consumer group.
    pub async fn start_consumers(&self) -> Result<Vec<JoinHandle<()>>, BusError> {
        gateway::consumer::spawn_consumers(
            self.bus.clone(),
            &self.config.consumer_group,
            self.fanout.clone(),
            self.correlator.clone(),
        )
        .await
    }
}
