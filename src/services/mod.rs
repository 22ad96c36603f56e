// Service exports
pub mod appwrite;
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod refresher;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use cache::{CacheManager, CacheKey, CacheError};
pub use memory::InMemoryAccountStore;
pub use postgres::{PostgresClient, PostgresError};
pub use refresher::GlobalIndexRefresher;
pub use store::{AccountStore, AccountPage, StoreError};
