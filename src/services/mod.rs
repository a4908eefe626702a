pub mod history_store;
pub mod usage_refresh;

pub use history_store::{HistoryStore, LocalHistoryStore};
pub use usage_refresh::UsageRefreshHook;
