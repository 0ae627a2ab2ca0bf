pub mod audio_store;
pub mod janitor;
pub mod response_cache;

pub use audio_store::{AudioStore, StoredAudio};
pub use janitor::FileJanitor;
pub use response_cache::{CacheEntry, ResponseCache};
