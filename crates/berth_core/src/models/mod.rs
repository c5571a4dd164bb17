//! The record types the store holds.
//!
//! Every type here carries a stable [`berth_codec::TypeId`] and stable
//! field tags; both are wire contracts and must never be repurposed.

mod alert;
mod indexer;
mod log;
mod module;
mod profile;
mod setting;

pub use alert::AlertEntry;
pub use indexer::Indexer;
pub use log::{LogEntry, LogLevel};
pub use module::ExternalModule;
pub use profile::{Profile, ServiceConfig};
pub use setting::SettingRecord;
