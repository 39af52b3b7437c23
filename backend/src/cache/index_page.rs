use std::{
    io,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use axum::body::Bytes;
use chrono::{DateTime, Utc};
use tokio::{fs, sync::RwLock};

/// A loaded copy of the index page
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub body: Bytes,
    pub etag: String,
    pub last_modified: SystemTime,
}

impl CachedPage {
    /// `Last-Modified` header value (IMF-fixdate)
    pub fn last_modified_header(&self) -> String {
        DateTime::<Utc>::from(self.last_modified)
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
    }

    /// Whether an `If-None-Match` header value names this version
    pub fn matches(&self, if_none_match: &str) -> bool {
        if_none_match
            .split(',')
            .map(str::trim)
            .any(|tag| tag == "*" || tag.trim_start_matches("W/") == self.etag)
    }
}

/// The index HTML held in memory and re-read only when the file on disk
/// changes
#[derive(Debug)]
pub struct IndexPage {
    path: PathBuf,
    cached: RwLock<Option<CachedPage>>,
}

impl IndexPage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current page, reloading from disk if the modification time moved
    pub async fn load(&self) -> io::Result<CachedPage> {
        let metadata = fs::metadata(&self.path).await?;
        let modified = metadata.modified()?;

        if let Some(page) = self.cached.read().await.as_ref() {
            if page.last_modified == modified && page.body.len() as u64 == metadata.len() {
                return Ok(page.clone());
            }
        }

        let body = Bytes::from(fs::read(&self.path).await?);
        let page = CachedPage {
            etag: compute_etag(body.len(), modified),
            body,
            last_modified: modified,
        };

        tracing::info!(
            "Loaded index page from {} ({} bytes, etag {})",
            self.path.display(),
            page.body.len(),
            page.etag
        );

        *self.cached.write().await = Some(page.clone());
        Ok(page)
    }
}

fn compute_etag(len: usize, modified: SystemTime) -> String {
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("\"{:x}-{:x}\"", len, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_index(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("wiw-index-{}.html", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_reads_file_and_reuses_cache() {
        let path = temp_index("<html>hello</html>");
        let index = IndexPage::new(&path);

        let first = index.load().await.unwrap();
        let second = index.load().await.unwrap();

        assert_eq!(&first.body[..], b"<html>hello</html>");
        assert_eq!(first.etag, second.etag, "Unchanged file keeps its ETag");

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let index = IndexPage::new("/nonexistent/wiw/index.html");
        tokio_test::assert_err!(index.load().await);
    }

    #[test]
    fn test_etag_depends_on_length_and_mtime() {
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(compute_etag(10, t), compute_etag(10, t));
        assert_ne!(compute_etag(10, t), compute_etag(11, t));
        assert_ne!(compute_etag(10, t), compute_etag(10, t + Duration::from_secs(1)));
    }

    #[test]
    fn test_if_none_match() {
        let page = CachedPage {
            body: Bytes::from_static(b""),
            etag: "\"a-1\"".to_string(),
            last_modified: UNIX_EPOCH,
        };

        assert!(page.matches("\"a-1\""));
        assert!(page.matches("W/\"a-1\""));
        assert!(page.matches("\"zz\", \"a-1\""));
        assert!(page.matches("*"));
        assert!(!page.matches("\"a-2\""));
    }

    #[test]
    fn test_last_modified_header_format() {
        let page = CachedPage {
            body: Bytes::new(),
            etag: String::new(),
            last_modified: UNIX_EPOCH + Duration::from_secs(784_111_777),
        };
        assert_eq!(page.last_modified_header(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }
}
