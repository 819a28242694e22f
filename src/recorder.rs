//! Ordered accumulation of captured entries and persistence to disk.

use crate::error::PersistError;
use crate::har::{self, Creator, Entry, Har, Log};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// HAR format version emitted in every document
pub const HAR_VERSION: &str = "1.2";

/// Owns the in-memory HAR log. Entries enter through `ingest` only, in
/// capture order, and leave as an independent copy via `to_document`.
#[derive(Debug)]
pub struct Recorder {
    creator: Creator,
    browser: Option<Creator>,
    entries: Mutex<Vec<Entry>>,
}

impl Recorder {
    pub fn new() -> Self {
        Recorder {
            creator: Creator {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                comment: None,
            },
            browser: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Recorder that also stamps the client library into the `browser` block
    pub fn with_browser(name: impl Into<String>, version: impl Into<String>) -> Self {
        let mut recorder = Recorder::new();
        recorder.browser = Some(Creator {
            name: name.into(),
            version: version.into(),
            comment: None,
        });
        recorder
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one entry. Short critical section, no I/O under the lock.
    pub fn ingest(&self, entry: Entry) {
        self.entries().push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drop all captured entries. The only reset; nothing expires on its own.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Snapshot of the full HAR document at this moment
    pub fn to_document(&self) -> Har {
        let entries = self.entries().clone();
        Har {
            log: Log {
                version: HAR_VERSION.to_string(),
                creator: self.creator.clone(),
                browser: self.browser.clone(),
                entries,
                comment: None,
            },
        }
    }

    /// Serialize the current document and write it to `path`, returning the
    /// path actually written.
    ///
    /// A `.har` suffix is appended unless the extension already is `har`
    /// (case-insensitively); an existing different extension is kept and
    /// suffixed, never replaced. The snapshot is taken under the lock and
    /// the write happens outside it, so concurrent ingests proceed and are
    /// simply absent from this save.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, PersistError> {
        let path = normalize_extension(path.as_ref());
        let document = self.to_document();
        let bytes = har::to_json(&document)?;
        har::write_atomic(&path, &bytes)?;
        log::debug!(
            "wrote {} entries to {}",
            document.log.entries.len(),
            path.display()
        );
        Ok(path)
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("har") => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".har");
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> Entry {
        let req = crate::snapshot::RequestSnapshot::new("GET", url);
        let resp = crate::snapshot::ResponseSnapshot {
            status: Some(200),
            status_text: "OK".to_string(),
            http_version: "HTTP/1.1".to_string(),
            ..Default::default()
        };
        crate::builder::build_entry(&req, &resp, std::time::Duration::ZERO).unwrap()
    }

    #[test]
    fn test_ingest_preserves_order() {
        let recorder = Recorder::new();
        for i in 0..5 {
            recorder.ingest(entry(&format!("https://example.com/{i}")));
        }

        let doc = recorder.to_document();
        assert_eq!(doc.log.entries.len(), 5);
        for (i, e) in doc.log.entries.iter().enumerate() {
            assert_eq!(e.request.url, format!("https://example.com/{i}"));
        }
    }

    #[test]
    fn test_to_document_is_a_snapshot() {
        let recorder = Recorder::new();
        recorder.ingest(entry("https://example.com/1"));
        let doc = recorder.to_document();
        recorder.ingest(entry("https://example.com/2"));

        assert_eq!(doc.log.entries.len(), 1);
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_document_metadata() {
        let recorder = Recorder::with_browser("reqwest", "0.12");
        let doc = recorder.to_document();
        assert_eq!(doc.log.version, "1.2");
        assert_eq!(doc.log.creator.name, "reqwest-har");
        assert_eq!(doc.log.browser.as_ref().unwrap().name, "reqwest");
    }

    #[test]
    fn test_clear_resets() {
        let recorder = Recorder::new();
        recorder.ingest(entry("https://example.com/"));
        assert!(!recorder.is_empty());
        recorder.clear();
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(Path::new("/tmp/x")), Path::new("/tmp/x.har"));
        assert_eq!(
            normalize_extension(Path::new("/tmp/x.HAR")),
            Path::new("/tmp/x.HAR")
        );
        assert_eq!(
            normalize_extension(Path::new("/tmp/x.json")),
            Path::new("/tmp/x.json.har")
        );
    }

    #[test]
    fn test_concurrent_ingest_keeps_every_entry() {
        use std::sync::Arc;

        let recorder = Arc::new(Recorder::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let recorder = Arc::clone(&recorder);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        recorder.ingest(entry(&format!("https://example.com/{t}/{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len(), 100);
    }
}
