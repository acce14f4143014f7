pub mod consumer;
pub mod correlator;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod history;
pub mod registry;
pub mod server;
