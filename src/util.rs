//! Small utility helpers shared across the crate.

use std::env;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Return the first non-empty environment variable from `keys`, or `None`.
pub fn env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Normalise a URL by prepending `http://` or `https://` when the scheme is missing.
pub fn normalize_url(raw: &str) -> String {
    if raw.contains("://") {
        return raw.to_string();
    }
    let scheme = if raw.starts_with("localhost") || raw.starts_with("127.") || raw.contains(":80") {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{raw}")
}

/// A seeded generator when `seed` is given, an entropy-seeded one otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn normalize_url_adds_scheme() {
        assert_eq!(normalize_url("localhost:3000"), "http://localhost:3000");
        assert_eq!(normalize_url("chat.example.com"), "https://chat.example.com");
        assert_eq!(normalize_url("https://x.dev"), "https://x.dev");
    }

    #[test]
    fn same_seed_same_sequence() {
        let a: Vec<u32> = seeded_rng(Some(4)).sample_iter(rand::distributions::Standard).take(5).collect();
        let b: Vec<u32> = seeded_rng(Some(4)).sample_iter(rand::distributions::Standard).take(5).collect();
        assert_eq!(a, b);
    }
}
