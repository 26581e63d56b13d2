mod store;

pub use store::CredentialStore;
pub use store::ENV_ACCESS_TOKEN;
pub use store::ENV_REFRESH_TOKEN;
pub use store::ENV_TOKEN_EXPIRY;
pub use store::SqliteStore;
pub use store::StorageError;
pub use store::mirror_tokens;
