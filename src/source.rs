// Source Resolution - where table bytes come from
// Ordered strategies: shared remote document first (when configured), local file last

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// TableFetcher - one way of obtaining the raw bytes of a table
///
/// Implementations are blocking. A failure only means "try the next one".
pub trait TableFetcher: Send + Sync {
    /// Human-readable origin (path or URL), recorded on the loaded table
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Vec<u8>>;
}

/// Bytes plus the strategy that produced them
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub origin: String,
}

// ============================================================================
// LOCAL FILE
// ============================================================================

#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalFile { path: path.into() }
    }
}

impl TableFetcher for LocalFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
    }
}

// ============================================================================
// REMOTE DOCUMENT
// ============================================================================

/// A CSV published at a URL, fetched with a fixed timeout and no retries
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    url: String,
    timeout: Duration,
}

impl RemoteDocument {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        RemoteDocument {
            url: url.into(),
            timeout,
        }
    }

    /// Shared Google Drive file, by file id
    pub fn google_drive(file_id: &str, timeout: Duration) -> Self {
        Self::new(google_drive_url(file_id), timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub fn google_drive_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=download&id={}", file_id)
}

impl TableFetcher for RemoteDocument {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<u8>> {
        debug!("Fetching {} (timeout {:?})", self.url, self.timeout);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} answered {}", self.url, status);
        }

        // Drive serves an HTML confirmation page instead of the file for large
        // or unshared documents
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            bail!("{} returned an HTML page instead of CSV", self.url);
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read body from {}", self.url))?;
        if bytes.is_empty() {
            bail!("{} returned an empty document", self.url);
        }

        Ok(bytes.to_vec())
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Try each strategy in order; the first success wins.
///
/// Errors only when every strategy failed, listing each attempt.
pub fn resolve(fetchers: &[Box<dyn TableFetcher>]) -> Result<Fetched> {
    let mut failures = Vec::new();

    for fetcher in fetchers {
        let origin = fetcher.describe();
        match fetcher.fetch() {
            Ok(bytes) => {
                info!("Fetched {} bytes from {}", bytes.len(), origin);
                return Ok(Fetched { bytes, origin });
            }
            Err(e) => {
                warn!("Source {} unavailable: {:#}", origin, e);
                failures.push(format!("{}: {:#}", origin, e));
            }
        }
    }

    if failures.is_empty() {
        return Err(anyhow!("No sources configured"));
    }
    Err(anyhow!("All sources failed: {}", failures.join(" | ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fetcher with a canned outcome that counts calls
    struct Canned {
        name: &'static str,
        bytes: Option<&'static [u8]>,
        calls: Arc<AtomicUsize>,
    }

    impl TableFetcher for Canned {
        fn describe(&self) -> String {
            self.name.to_string()
        }

        fn fetch(&self) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bytes
                .map(|b| b.to_vec())
                .ok_or_else(|| anyhow!("{} is down", self.name))
        }
    }

    /// Answer exactly one HTTP request with a raw response; returns the URL
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });

        format!("http://{}/table.csv", addr)
    }

    fn remote(url: String) -> RemoteDocument {
        RemoteDocument::new(url, Duration::from_secs(5))
    }

    fn canned(name: &'static str, bytes: Option<&'static [u8]>) -> (Box<dyn TableFetcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = Canned {
            name,
            bytes,
            calls: Arc::clone(&calls),
        };
        (Box::new(fetcher), calls)
    }

    #[test]
    fn test_first_success_wins() {
        let (remote, remote_calls) = canned("remote", Some(b"a,b\n"));
        let (local, local_calls) = canned("local", Some(b"c,d\n"));

        let fetched = resolve(&[remote, local]).unwrap();

        assert_eq!(fetched.origin, "remote");
        assert_eq!(fetched.bytes, b"a,b\n");
        assert_eq!(remote_calls.load(Ordering::SeqCst), 1);
        assert_eq!(local_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_falls_back_on_failure() {
        let (remote, _) = canned("remote", None);
        let (local, local_calls) = canned("local", Some(b"c,d\n"));

        let fetched = resolve(&[remote, local]).unwrap();

        assert_eq!(fetched.origin, "local");
        assert_eq!(local_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_failures_reported() {
        let (remote, _) = canned("remote", None);
        let (local, _) = canned("local", None);

        let err = resolve(&[remote, local]).unwrap_err().to_string();

        assert!(err.contains("remote is down"));
        assert!(err.contains("local is down"));
    }

    #[test]
    fn test_no_sources() {
        assert!(resolve(&[]).is_err());
    }

    #[test]
    fn test_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ACCNO\n12345\n").unwrap();

        let local = LocalFile::new(file.path());
        assert_eq!(local.fetch().unwrap(), b"ACCNO\n12345\n");
        assert_eq!(local.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let local = LocalFile::new(dir.path().join("nope.csv"));
        let err = local.fetch().unwrap_err();
        assert!(format!("{:#}", err).contains("nope.csv"));
    }

    #[test]
    fn test_unreachable_remote_fails_fast() {
        // Port 9 on localhost: nothing listens, connection is refused
        let remote = RemoteDocument::new("http://127.0.0.1:9/table.csv", Duration::from_secs(2));
        assert!(remote.fetch().is_err());
    }

    #[test]
    fn test_google_drive_url() {
        let remote = RemoteDocument::google_drive("abc123", Duration::from_secs(5));
        assert_eq!(remote.url(), "https://drive.google.com/uc?export=download&id=abc123");
    }

    #[test]
    fn test_remote_csv_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: 12\r\nConnection: close\r\n\r\nACCNO\n12345\n",
        );
        assert_eq!(remote(url).fetch().unwrap(), b"ACCNO\n12345\n");
    }

    #[test]
    fn test_remote_error_status() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let err = remote(url).fetch().unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_remote_html_page() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<html></html>",
        );
        let err = remote(url).fetch().unwrap_err();
        assert!(err.to_string().contains("HTML page"));
    }

    #[test]
    fn test_remote_empty_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let err = remote(url).fetch().unwrap_err();
        assert!(err.to_string().contains("empty document"));
    }

    #[test]
    fn test_resolve_falls_back_to_local_file() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 6\r\nConnection: close\r\n\r\n<html>",
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ACCNO\n12345\n").unwrap();

        let fetchers: Vec<Box<dyn TableFetcher>> =
            vec![Box::new(remote(url)), Box::new(LocalFile::new(file.path()))];
        let fetched = resolve(&fetchers).unwrap();

        assert_eq!(fetched.origin, file.path().display().to_string());
        assert_eq!(fetched.bytes, b"ACCNO\n12345\n");
    }
}
