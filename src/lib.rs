// Expense Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod notice;
pub mod record;
pub mod storage;
pub mod summary;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use db::{ExpenseStore, COUNTER_KEY};
pub use error::{Result, StoreError};
pub use notice::{Notice, NoticeKind};
pub use record::{category_label, Category, Expense, ExpenseFilter, StoredExpense};
pub use storage::{open_storage, KeyValueStore, MemoryStorage, SqliteStorage};
pub use summary::{summarize, CategoryTotal, Summary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
