use crate::events::{PipelineEvent, Reporter};
use crate::limiter::ConcurrencyLimiter;
use crate::link::{derived_name, normalize_link};
use crate::tracker::{CompletionTracker, TrackedUnit};
use futures::StreamExt;
use imgscrape_scanner::{ByteSource, Result, ScrapeError};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Last stage: save every unique link into the destination folder.
pub struct DownloadStage<S> {
    source: Arc<S>,
    folder: Arc<PathBuf>,
    limiter: ConcurrencyLimiter,
    tracker: CompletionTracker,
    reporter: Reporter,
}

impl<S> Clone for DownloadStage<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            folder: Arc::clone(&self.folder),
            limiter: self.limiter.clone(),
            tracker: self.tracker.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

impl<S: ByteSource> DownloadStage<S> {
    pub fn new(
        source: Arc<S>,
        folder: impl Into<PathBuf>,
        limiter: ConcurrencyLimiter,
        tracker: CompletionTracker,
        reporter: Reporter,
    ) -> Self {
        Self {
            source,
            folder: Arc::new(folder.into()),
            limiter,
            tracker,
            reporter,
        }
    }

    /// Spawns the dispatch loop. It schedules one download unit per received
    /// link without waiting for any of them, and ends when `links` is closed
    /// and drained.
    ///
    /// The returned handle resolves to the number of units scheduled. Once it
    /// has resolved, every unit is registered with the stage tracker.
    pub fn download_all(self, mut links: mpsc::Receiver<String>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut dispatched = 0;
            while let Some(link) = links.recv().await {
                let unit = self.tracker.track();
                let stage = self.clone();
                tokio::spawn(async move { stage.download_unit(link, unit).await });
                dispatched += 1;
            }
            debug!("Download dispatch finished after {} links", dispatched);
            dispatched
        })
    }

    async fn download_unit(&self, link: String, _unit: TrackedUnit) {
        match self.download_one(&link).await {
            Ok((url, path)) => self.reporter.emit(PipelineEvent::Saved { url, path }),
            Err(e) => self.reporter.emit(PipelineEvent::download_failed(link.as_str(), &e)),
        }
    }

    /// Fetches one resource into the destination folder and returns the
    /// fetched URL and the written path.
    ///
    /// The file is created before the transfer starts, so a failed transfer
    /// can leave an empty or partial file behind. Two links with the same
    /// final path segment write the same file; the last writer wins.
    pub async fn download_one(&self, link: &str) -> Result<(String, PathBuf)> {
        fs::create_dir_all(self.folder.as_path())
            .await
            .map_err(|e| ScrapeError::file_system(self.folder.as_path(), e))?;

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| ScrapeError::transfer(link, e))?;

        let url = normalize_link(link);
        let name = derived_name(&url);
        if name.is_empty() || name == "." || name == ".." {
            return Err(ScrapeError::file_system(
                self.folder.join(name),
                io::Error::new(io::ErrorKind::InvalidInput, format!("no file name in {}", url)),
            ));
        }
        let path = self.folder.join(name);

        let mut file = File::create(&path)
            .await
            .map_err(|e| ScrapeError::file_system(&path, e))?;

        let mut body = self.source.open_stream(&url).await?;
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| ScrapeError::transfer(&url, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| ScrapeError::transfer(&url, e))?;

        debug!("Wrote {} bytes from {} to {}", written, url, path.display());
        Ok((url, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use imgscrape_scanner::ByteStream;
    use std::collections::HashMap;
    use std::path::Path;

    struct StaticBodies(HashMap<String, Vec<u8>>);

    impl ByteSource for StaticBodies {
        async fn open_stream(&self, url: &str) -> Result<ByteStream> {
            let body = self
                .0
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::fetch(url, "HTTP 404 Not Found"))?;
            let chunks: Vec<Result<Bytes>> = body
                .chunks(3)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            Ok(stream::iter(chunks).boxed())
        }
    }

    struct BrokenBody;

    impl ByteSource for BrokenBody {
        async fn open_stream(&self, url: &str) -> Result<ByteStream> {
            let chunks = vec![
                Ok(Bytes::from_static(b"abc")),
                Err(ScrapeError::transfer(url, "connection reset")),
            ];
            Ok(stream::iter(chunks).boxed())
        }
    }

    fn stage<S: ByteSource>(source: S, folder: &Path) -> DownloadStage<S> {
        DownloadStage::new(
            Arc::new(source),
            folder,
            ConcurrencyLimiter::new(2),
            CompletionTracker::new(),
            Reporter::default(),
        )
    }

    #[tokio::test]
    async fn test_download_creates_folder_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("nested").join("images");
        let bodies = HashMap::from([("http://x.com/images/a.png".to_string(), b"PNGDATA!".to_vec())]);
        let stage = stage(StaticBodies(bodies), &folder);

        let (url, path) = stage.download_one("x.com/images/a.png").await.unwrap();

        assert_eq!(url, "http://x.com/images/a.png");
        assert_eq!(path, folder.join("a.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"PNGDATA!");
    }

    #[tokio::test]
    async fn test_query_string_kept_in_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let bodies = HashMap::from([("http://x.com/a.png?x=1".to_string(), b"q".to_vec())]);
        let stage = stage(StaticBodies(bodies), dir.path());

        let (_, path) = stage.download_one("http://x.com/a.png?x=1").await.unwrap();
        assert_eq!(path.file_name().unwrap(), "a.png?x=1");
    }

    #[tokio::test]
    async fn test_same_name_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let bodies = HashMap::from([
            ("http://one.test/logo.png".to_string(), b"first".to_vec()),
            ("http://two.test/logo.png".to_string(), b"second".to_vec()),
        ]);
        let stage = stage(StaticBodies(bodies), dir.path());

        stage.download_one("//one.test/logo.png").await.unwrap();
        stage.download_one("//two.test/logo.png").await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("logo.png")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_missing_resource_is_fetch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stage = stage(StaticBodies(HashMap::new()), dir.path());

        let err = stage.download_one("http://x.com/gone.png").await.unwrap_err();
        assert_eq!(err.kind(), "fetch");
        assert_eq!(stage.limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_mid_stream_error_is_transfer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stage = stage(BrokenBody, dir.path());

        let err = stage.download_one("http://x.com/cut.png").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transfer { .. }));
    }

    #[tokio::test]
    async fn test_url_without_file_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let stage = stage(StaticBodies(HashMap::new()), dir.path());

        for link in ["http://x.com/dir/", "http://x.com/.."] {
            let err = stage.download_one(link).await.unwrap_err();
            assert_eq!(err.kind(), "filesystem");
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_folder_blocked_by_file_is_filesystem_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let stage = stage(StaticBodies(HashMap::new()), &blocker);

        let err = stage.download_one("http://x.com/a.png").await.unwrap_err();
        assert_eq!(err.kind(), "filesystem");
    }
}
