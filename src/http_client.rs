//! Shared HTTP client for Google API calls.
//!
//! A single lazy-initialized client keeps TLS sessions and pooled
//! connections alive across polls instead of rebuilding a client per
//! request.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global client for Drive and Sheets requests.
///
/// 60s timeout covers large invoice downloads; idle connections are kept
/// around long enough to be reused by the next poll.
static GOOGLE_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .expect("Failed to create Google HTTP client")
});

/// Get the shared Google HTTP client.
#[inline]
pub fn google_client() -> &'static Client {
    &GOOGLE_CLIENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_is_singleton() {
        let a = google_client();
        let b = google_client();
        assert!(std::ptr::eq(a, b));
    }
}
