//! hs2-notebook - query execution for notebook snippets on HiveServer2-style engines.
//!
//! A snippet holds a script of one or more statements. The connector submits
//! them one at a time, tracks which one is current in the handle document the
//! caller keeps, classifies backend outcomes and digs progress, sub-jobs and
//! result sizes out of the engine logs.

pub mod config;
pub mod connector;
pub mod driver;
pub mod error;
pub mod handle;
pub mod logging;
pub mod logs;
pub mod query;
pub mod session;
pub mod snippet;
pub mod statement;

pub use connector::HiveServerConnector;
pub use error::{ConnectorError, Result};
