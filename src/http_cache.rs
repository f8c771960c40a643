use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{
    ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const STORE_VERSION: u32 = 1;
const STORE_DIR: &str = "pl_dashboard";
const STORE_FILE: &str = "http_cache.json";
const ERROR_SNIPPET_CHARS: usize = 220;

/// Entries not revalidated for a week are dropped on the next save.
pub const MAX_ENTRY_AGE_SECS: u64 = 7 * 24 * 60 * 60;

static STORE: Mutex<Option<ResponseStore>> = Mutex::new(None);

/// On-disk layout of the response cache. A file with another `version` is ignored.
#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    version: u32,
    entries: HashMap<String, StoredResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredResponse {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

impl StoredResponse {
    fn from_response(body: &str, headers: &HeaderMap, now: u64) -> Self {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            body: body.to_string(),
            etag: header(ETAG),
            last_modified: header(LAST_MODIFIED),
            fetched_at: now,
        }
    }

    fn revalidate(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(etag) = &self.etag {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(stamp) = &self.last_modified {
            req = req.header(IF_MODIFIED_SINCE, stamp);
        }
        req
    }
}

/// Response bodies keyed by URL, bound to the file they persist to.
/// `path` is `None` when no cache directory can be resolved; the store then
/// lives in memory only.
#[derive(Debug, Default)]
struct ResponseStore {
    path: Option<PathBuf>,
    entries: HashMap<String, StoredResponse>,
}

impl ResponseStore {
    fn open(path: Option<PathBuf>) -> Self {
        let entries = path
            .as_deref()
            .map(read_store_file)
            .unwrap_or_default();
        Self { path, entries }
    }

    fn get(&self, url: &str) -> Option<StoredResponse> {
        self.entries.get(url).cloned()
    }

    fn put(&mut self, url: &str, entry: StoredResponse, now: u64) {
        self.entries.insert(url.to_string(), entry);
        let dropped = prune_stale(&mut self.entries, now);
        if dropped > 0 {
            debug!(dropped, "pruned stale http cache entries");
        }
        let Some(path) = &self.path else {
            return;
        };
        if let Err(err) = write_store_file(path, &self.entries) {
            warn!("http cache not saved: {err:#}");
        }
    }
}

/// GET `url` and return the body, revalidating against the on-disk cache when
/// `use_cache` is set. With the cache off this is a plain request.
pub fn fetch_json(
    client: &Client,
    url: &str,
    extra_headers: &[(&str, &str)],
    use_cache: bool,
) -> Result<String> {
    if use_cache {
        return fetch_json_cached(client, url, extra_headers);
    }
    let resp = with_headers(client.get(url), extra_headers)
        .send()
        .context("request failed")?;
    let (_, body) = success_body(resp)?;
    Ok(body)
}

/// Conditional GET. A 304 serves the stored body and refreshes its age; a 2xx
/// replaces the stored entry with the new body and validators.
pub fn fetch_json_cached(
    client: &Client,
    url: &str,
    extra_headers: &[(&str, &str)],
) -> Result<String> {
    let stored = with_store(|store| store.get(url));

    let mut req = with_headers(client.get(url), extra_headers);
    if let Some(entry) = &stored {
        req = entry.revalidate(req);
    }
    let resp = req.send().context("request failed")?;
    let now = unix_now();

    if resp.status() == StatusCode::NOT_MODIFIED {
        let mut entry = stored.ok_or_else(|| anyhow!("received 304 without cache body"))?;
        debug!(url, "not modified, serving cached body");
        entry.fetched_at = now;
        let body = entry.body.clone();
        with_store(|store| store.put(url, entry, now));
        return Ok(body);
    }

    let (headers, body) = success_body(resp)?;
    let entry = StoredResponse::from_response(&body, &headers, now);
    with_store(|store| store.put(url, entry, now));
    Ok(body)
}

/// `$XDG_CACHE_HOME/pl_dashboard`, else `$HOME/.cache/pl_dashboard`.
pub fn app_cache_dir() -> Option<PathBuf> {
    cache_dir_from(std::env::var("XDG_CACHE_HOME").ok(), std::env::var("HOME").ok())
}

fn cache_dir_from(xdg_cache_home: Option<String>, home: Option<String>) -> Option<PathBuf> {
    let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    if let Some(base) = non_blank(xdg_cache_home) {
        return Some(PathBuf::from(base).join(STORE_DIR));
    }
    non_blank(home).map(|home| PathBuf::from(home).join(".cache").join(STORE_DIR))
}

pub(crate) fn http_error(status: StatusCode, body: &str) -> anyhow::Error {
    let snippet = body
        .trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(ERROR_SNIPPET_CHARS)
        .collect::<String>();
    anyhow!("http {}: {}", status, snippet)
}

fn success_body(resp: Response) -> Result<(HeaderMap, String)> {
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(http_error(status, &body));
    }
    Ok((headers, body))
}

fn with_headers(mut req: RequestBuilder, extra_headers: &[(&str, &str)]) -> RequestBuilder {
    for (name, value) in extra_headers {
        req = req.header(*name, *value);
    }
    req
}

fn with_store<T>(f: impl FnOnce(&mut ResponseStore) -> T) -> T {
    // A poisoned lock still guards whole entries; keep using it.
    let mut guard = STORE.lock().unwrap_or_else(PoisonError::into_inner);
    let store = guard.get_or_insert_with(|| {
        ResponseStore::open(app_cache_dir().map(|dir| dir.join(STORE_FILE)))
    });
    f(store)
}

/// Removes entries fetched more than `MAX_ENTRY_AGE_SECS` before `now` and
/// returns how many went.
fn prune_stale(entries: &mut HashMap<String, StoredResponse>, now: u64) -> usize {
    let before = entries.len();
    entries.retain(|_, e| now.saturating_sub(e.fetched_at) <= MAX_ENTRY_AGE_SECS);
    before - entries.len()
}

fn read_store_file(path: &Path) -> HashMap<String, StoredResponse> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    match serde_json::from_str::<StoreFile>(&raw) {
        Ok(file) if file.version == STORE_VERSION => file.entries,
        Ok(file) => {
            debug!(found = file.version, "discarding http cache from another version");
            HashMap::new()
        }
        Err(err) => {
            debug!("discarding unreadable http cache: {err}");
            HashMap::new()
        }
    }
}

/// Writes next to `path` first, then renames over it, so readers never see a
/// half-written file.
fn write_store_file(path: &Path, entries: &HashMap<String, StoredResponse>) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("create cache dir {}", dir.display()))?;
    }
    let file = StoreFileRef {
        version: STORE_VERSION,
        entries,
    };
    let json = serde_json::to_string(&file).context("serialize http cache")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, path).context("swap http cache")?;
    Ok(())
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    entries: &'a HashMap<String, StoredResponse>,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(body: &str, fetched_at: u64) -> StoredResponse {
        StoredResponse {
            body: body.to_string(),
            etag: Some("\"abc\"".to_string()),
            last_modified: None,
            fetched_at,
        }
    }

    #[test]
    fn http_error_flattens_and_truncates_body() {
        let body = format!("line one\nline two\r\n{}", "x".repeat(400));
        let err = http_error(StatusCode::TOO_MANY_REQUESTS, &body).to_string();
        assert!(err.starts_with("http 429 Too Many Requests: line one line two"));
        assert!(!err.contains('\n'));
        let snippet = err.splitn(2, ": ").nth(1).unwrap();
        assert_eq!(snippet.chars().count(), ERROR_SNIPPET_CHARS);
    }

    #[test]
    fn cache_dir_prefers_xdg_then_home() {
        assert_eq!(
            cache_dir_from(Some("/tmp/xdg".into()), Some("/home/fan".into())),
            Some(PathBuf::from("/tmp/xdg/pl_dashboard"))
        );
        assert_eq!(
            cache_dir_from(Some("  ".into()), Some("/home/fan".into())),
            Some(PathBuf::from("/home/fan/.cache/pl_dashboard"))
        );
        assert_eq!(cache_dir_from(None, Some(String::new())), None);
    }

    #[test]
    fn save_renames_tmp_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(STORE_FILE);

        let mut store = ResponseStore::open(Some(path.clone()));
        assert!(store.entries.is_empty());
        store.put("https://api/standings", stored("{\"response\":[]}", 1_000), 1_000);

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = ResponseStore::open(Some(path));
        assert_eq!(
            reopened.get("https://api/standings"),
            Some(stored("{\"response\":[]}", 1_000))
        );
    }

    #[test]
    fn other_version_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);
        let old = r#"{"version":0,"entries":{"https://api/teams":{"body":"[]","etag":null,"last_modified":null,"fetched_at":5}}}"#;
        fs::write(&path, old).unwrap();
        assert!(read_store_file(&path).is_empty());

        fs::write(&path, "not json").unwrap();
        assert!(read_store_file(&path).is_empty());
    }

    #[test]
    fn stale_entries_pruned_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORE_FILE);
        let now = 10 * MAX_ENTRY_AGE_SECS;

        let mut store = ResponseStore::open(Some(path.clone()));
        store
            .entries
            .insert("old".to_string(), stored("a", now - MAX_ENTRY_AGE_SECS - 1));
        store
            .entries
            .insert("edge".to_string(), stored("b", now - MAX_ENTRY_AGE_SECS));
        store.put("new", stored("c", now), now);

        let on_disk = read_store_file(&path);
        let mut keys: Vec<&str> = on_disk.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["edge", "new"]);
    }

    #[test]
    fn memory_only_store_still_serves_entries() {
        let mut store = ResponseStore::open(None);
        store.put("u", stored("body", 7), 7);
        assert_eq!(store.get("u").map(|e| e.body), Some("body".to_string()));
    }
}
