//! Core modules: the record model, the store, its text codecs and the
//! persistence, configuration and journaling around them.

pub mod codec;
pub mod config;
pub mod error;
pub mod journal;
pub mod persistence;
pub mod record;
pub mod session;
pub mod store;
pub mod time;
pub mod tui;
