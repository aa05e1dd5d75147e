//! Durable response cache for the query service.
//!
//! One JSON object per line, append-only. The key covers the exact request
//! content plus the sampling temperature, so identical requests replay the
//! recorded response instead of re-invoking the provider. Entries never
//! expire and are never invalidated; independent sessions may append to the
//! same file, so loading skips lines it cannot parse instead of failing.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ElicitError, Result};
use crate::types::ChatMessage;

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the cache key for a request.
pub fn request_key(messages: &[ChatMessage], temperature: f64) -> Result<String> {
    let payload = serde_json::to_vec(&(messages, temperature))?;
    Ok(sha256_hex(&payload))
}

#[derive(Serialize, Deserialize)]
struct CacheLine {
    key: String,
    response: String,
}

/// Append-only JSONL response cache.
#[derive(Debug)]
pub struct ResponseCache {
    path: PathBuf,
    entries: HashMap<String, String>,
    hits: u64,
    misses: u64,
}

impl ResponseCache {
    /// Open a cache file, creating it if absent, and index its entries.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = HashMap::new();

        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            for line in raw.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<CacheLine>(line) {
                    Ok(entry) => {
                        entries.insert(entry.key, entry.response);
                    }
                    Err(e) => {
                        tracing::warn!(target: "elicit::cache", error = %e, "skipping malformed cache line");
                    }
                }
            }
        }

        Ok(Self {
            path,
            entries,
            hits: 0,
            misses: 0,
        })
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get(key) {
            Some(response) => {
                self.hits += 1;
                Some(response.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Record a response and append it to the cache file.
    pub fn put(&mut self, key: String, response: String) -> Result<()> {
        let line = serde_json::to_string(&CacheLine {
            key: key.clone(),
            response: response.clone(),
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ElicitError::Cache(format!(
                    "failed to open cache file {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
        writeln!(file, "{}", line)
            .map_err(|e| ElicitError::Cache(format!("failed to append cache entry: {}", e)))?;

        self.entries.insert(key, response);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_depends_on_messages_and_temperature() {
        let messages = vec![ChatMessage::user("hello")];
        let a = request_key(&messages, 0.0).unwrap();
        let b = request_key(&messages, 0.0).unwrap();
        let c = request_key(&messages, 0.7).unwrap();
        let d = request_key(&[ChatMessage::user("other")], 0.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.jsonl");

        let mut cache = ResponseCache::open(&path).unwrap();
        cache.put("k1".to_string(), "v1".to_string()).unwrap();
        cache.put("k2".to_string(), "v2".to_string()).unwrap();
        drop(cache);

        let mut reopened = ResponseCache::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("k1"), Some("v1".to_string()));
        assert_eq!(reopened.hits(), 1);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.jsonl");
        std::fs::write(
            &path,
            "{\"key\":\"good\",\"response\":\"ok\"}\nnot json at all\n",
        )
        .unwrap();

        let mut cache = ResponseCache::open(&path).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("good"), Some("ok".to_string()));
    }
}
