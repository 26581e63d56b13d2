use crate::{cli, config::Config, error, management::CredentialStore, success};

/// Forgets the stored tokens. The next start has to log in again.
pub async fn logout(config: Config) {
    let store = cli::open_store(&config);
    if let Err(e) = store.clear_tokens() {
        error!("Failed to clear stored tokens: {}", e);
    }
    success!("Stored tokens removed.");
}
