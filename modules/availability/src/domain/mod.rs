pub mod aggregator;
pub mod error;
pub mod events;
pub mod locks;
pub mod mutator;
pub mod overlap;
pub mod ports;
pub mod repo;
pub mod service;
pub mod time;
