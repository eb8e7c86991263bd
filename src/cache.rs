//! Offline resource cache — cache-first lookup over a fixed manifest.
//!
//! At install time every manifest entry is fetched and stored.  Afterwards a
//! request is answered from the cache when its canonical URL is present and
//! goes to the network otherwise.  Network responses are never written back:
//! the cache is a read-only table over the install manifest.
//!
//! The table can be snapshotted to disk so a restart serves from cache
//! without reinstalling.

use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use directories::ProjectDirs;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::APP_NAME;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid resource key `{key}`: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: url::ParseError,
    },
    #[error("fetch {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("fetch {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("cache snapshot {}: {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },
}

/// A stored (or freshly fetched) response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    #[serde(with = "base64_body")]
    pub body: Vec<u8>,
}

impl Resource {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Result of [`CacheGateway::intercept`].
#[derive(Clone, Debug)]
pub struct Served {
    pub resource: Resource,
    pub from_cache: bool,
}

/// The network side of the gateway.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Resource, CacheError>> + Send;
}

/// Plain HTTP fetcher backed by reqwest.
#[derive(Clone)]
pub struct HttpFetcher {
    http_client: HttpClient,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(HttpFetcher { http_client })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Resource, CacheError> {
        let network = |err: reqwest::Error| CacheError::Network {
            url: url.to_string(),
            reason: err.to_string(),
        };
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(network)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(network)?.to_vec();
        Ok(Resource {
            url: url.to_string(),
            status,
            content_type,
            body,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    name: String,
    entries: Vec<Resource>,
}

pub struct CacheGateway<F: Fetcher> {
    name: String,
    origin: Url,
    entries: HashMap<String, Resource>,
    fetcher: F,
    snapshot_path: Option<PathBuf>,
}

impl<F: Fetcher> CacheGateway<F> {
    /// An empty, memory-only cache.
    pub fn new(name: &str, origin: Url, fetcher: F) -> Self {
        CacheGateway {
            name: name.to_string(),
            origin,
            entries: HashMap::new(),
            fetcher,
            snapshot_path: None,
        }
    }

    /// A cache backed by `<dir>/<name>.json`.  An existing snapshot with the
    /// same cache name is loaded; one written under another name is ignored.
    pub fn open(name: &str, origin: Url, fetcher: F, dir: &Path) -> Result<Self, CacheError> {
        let path = dir.join(format!("{name}.json"));
        let mut gateway = Self::new(name, origin, fetcher);

        if path.exists() {
            let snapshot = read_snapshot(&path)?;
            if snapshot.name == gateway.name {
                for resource in snapshot.entries {
                    gateway.entries.insert(resource.url.clone(), resource);
                }
            }
        }

        gateway.snapshot_path = Some(path);
        Ok(gateway)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch and store every manifest entry.  All or nothing: if any fetch
    /// fails (or answers with a non-2xx status), or the snapshot cannot be
    /// written, nothing is stored.
    pub async fn install<S: AsRef<str>>(&mut self, manifest: &[S]) -> Result<usize, CacheError> {
        let mut staged = Vec::with_capacity(manifest.len());
        for key in manifest {
            let url = self.canonical(key.as_ref())?;
            let resource = self.fetcher.fetch(&url).await?;
            if !resource.is_ok() {
                return Err(CacheError::Status {
                    url: url.to_string(),
                    status: resource.status,
                });
            }
            staged.push((url.to_string(), resource));
        }

        let count = staged.len();
        let mut merged = self.entries.clone();
        merged.extend(staged);
        self.write_snapshot(&merged)?;
        self.entries = merged;
        Ok(count)
    }

    /// Serve `key` from the cache, or from the network on a miss.  Network
    /// failures are returned as-is.
    pub async fn intercept(&self, key: &str) -> Result<Served, CacheError> {
        let url = self.canonical(key)?;
        if let Some(resource) = self.entries.get(url.as_str()) {
            return Ok(Served {
                resource: resource.clone(),
                from_cache: true,
            });
        }

        let resource = self.fetcher.fetch(&url).await?;
        Ok(Served {
            resource,
            from_cache: false,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.canonical(key)
            .map(|url| self.entries.contains_key(url.as_str()))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write `entries` as the snapshot, if this cache has one.
    fn write_snapshot(&self, entries: &HashMap<String, Resource>) -> Result<(), CacheError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        let snapshot_err = |reason: String| CacheError::Snapshot {
            path: path.clone(),
            reason,
        };

        let mut entries: Vec<Resource> = entries.values().cloned().collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        let snapshot = Snapshot {
            name: self.name.clone(),
            entries,
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| snapshot_err(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| snapshot_err(e.to_string()))?;
        }
        fs::write(path, json).map_err(|e| snapshot_err(e.to_string()))?;
        Ok(())
    }

    /// Resolve `key` against the origin and drop any fragment.
    fn canonical(&self, key: &str) -> Result<Url, CacheError> {
        let mut url = self
            .origin
            .join(key.trim())
            .map_err(|source| CacheError::InvalidKey {
                key: key.to_string(),
                source,
            })?;
        url.set_fragment(None);
        Ok(url)
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, CacheError> {
    let snapshot_err = |reason: String| CacheError::Snapshot {
        path: path.to_path_buf(),
        reason,
    };
    let contents = fs::read_to_string(path).map_err(|e| snapshot_err(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| snapshot_err(e.to_string()))
}

/// Platform cache directory for snapshots, if one can be determined.
pub fn default_cache_dir() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", APP_NAME, APP_NAME)?;
    Some(proj_dirs.cache_dir().to_path_buf())
}

mod base64_body {
    use super::{BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
