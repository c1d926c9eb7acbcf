//! State notification adapters

mod broadcast;

pub use broadcast::BroadcastNotifier;
