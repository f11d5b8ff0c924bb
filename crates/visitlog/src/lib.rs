//! `visitlog` - A building visitor register
//!
//! This library provides visitor registration with field validation, a
//! locally persisted register, search and ordering for display, and CSV
//! export.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod logging;
pub mod query;
pub mod storage;
pub mod store;
pub mod visitor;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{export_csv, CsvExport};
pub use form::{
    check_visitor, registration_notice, Field, FieldError, RegistrationForm, ValidationErrors,
};
pub use logging::init_logging;
pub use query::{QueryView, SortOrder};
pub use storage::{KeyValueBackend, PersistentStore};
pub use store::{ClearConfirmation, StoreStats, VisitorStore};
pub use visitor::{Purpose, Visitor};
