//! KnowledgeVault Core Library
//!
//! This crate provides the record store behind KnowledgeVault, a personal
//! catalogue of learning resources (books, videos, articles, courses).
//!
//! # Architecture
//!
//! - **Collection**: an in-memory snapshot of every record; all record
//!   operations are transforms on a collection value
//! - **Storage**: a single CSV file replaced atomically on each save, plus
//!   timestamped backups
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open()?;
//!
//! // Add a record (a duplicate title + link is silently skipped)
//! store.add(NewRecord::new("SQL Basics").with_link("http://x"))?;
//!
//! // Query records
//! let books = store.collection().filter(&Filter::new().with_category(Category::Book));
//! ```
//!
//! # Modules
//!
//! - `store`: File-backed storage interface (main entry point)
//! - `collection`: Record snapshot with id assignment, dedup and CRUD
//! - `maintenance`: Bulk transforms (dedupe, reassign ids, clear)
//! - `merge`: Import merging
//! - `models`: Data structures for records and categories
//! - `schema`: Column set and normalization
//! - `codec`: CSV, JSON and XLSX encodings
//! - `query`: Filters and tag listings
//! - `report`: Aggregate counts
//! - `storage`: Atomic persistence and backups
//! - `config`: Application configuration

pub mod codec;
pub mod collection;
pub mod config;
pub mod maintenance;
pub mod merge;
pub mod models;
pub mod query;
pub mod report;
pub mod schema;
pub mod storage;
pub mod store;

pub use codec::FileFormat;
pub use collection::{AddOutcome, Collection};
pub use config::Config;
pub use merge::MergeReport;
pub use models::{Category, NewRecord, Record, RecordUpdate};
pub use query::Filter;
pub use report::Summary;
pub use storage::{StorageError, StorageResult};
pub use store::Store;
