use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Connection pool shared by the Google API clients
///
/// The timeout covers a full synchronous recognition of a one-minute clip.
pub fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .timeout(Duration::from_secs(120))
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Some(Duration::from_secs(30)))
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .user_agent(concat!("nova/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("Failed to build default HTTP client")
        })
        .clone()
}
