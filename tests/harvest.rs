//! Integration tests for the harvesting engine.
//!
//! These drive `harvest` with in-memory post sources and a scripted fetcher,
//! checking stop conditions, deduplication and watermark handling on a real
//! temporary directory.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use tweet_media_harvester::{
    fs::MARKER_FILE, harvest, Error, Fetcher, HarvestOptions, MediaEntity, MediaKind, Post,
    PostSource, Result, StopReason, WatermarkStore,
};

const BASE_TIME: i64 = 1_600_000_000;

// ==================== Helpers ====================

/// Fetcher that writes the URL as file content and fails for chosen URLs.
#[derive(Default)]
struct ScriptedFetcher {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn failing_on(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(Error::Download("Failed to download file: HTTP 404".into()));
        }
        tokio::fs::write(destination, url.as_bytes()).await?;
        Ok(url.len() as u64)
    }
}

/// Fetcher that leaves a directory where the file should be.
struct DirectoryFetcher;

#[async_trait]
impl Fetcher for DirectoryFetcher {
    async fn fetch(&self, _url: &str, destination: &Path) -> Result<u64> {
        tokio::fs::create_dir(destination).await?;
        Ok(0)
    }
}

/// Source that counts how many posts were pulled.
struct CountingSource {
    posts: VecDeque<Post>,
    pulled: usize,
}

impl CountingSource {
    fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: posts.into(),
            pulled: 0,
        }
    }
}

#[async_trait]
impl PostSource for CountingSource {
    async fn next_post(&mut self) -> Result<Option<Post>> {
        let post = self.posts.pop_front();
        if post.is_some() {
            self.pulled += 1;
        }
        Ok(post)
    }
}

/// Source that yields its posts and then fails.
struct FailingSource {
    posts: VecDeque<Post>,
}

#[async_trait]
impl PostSource for FailingSource {
    async fn next_post(&mut self) -> Result<Option<Post>> {
        match self.posts.pop_front() {
            Some(post) => Ok(Some(post)),
            None => Err(Error::Api("Failed to get timeline".into())),
        }
    }
}

fn photo(id: &str) -> MediaEntity {
    MediaEntity {
        id: id.to_string(),
        kind: MediaKind::Photo,
        media_url: format!("https://pbs.example.com/media/{}", id),
        variants: Vec::new(),
    }
}

fn photo_url(id: &str) -> String {
    format!("https://pbs.example.com/media/{}?format=jpg&name=large", id)
}

fn post(id: &str, secs: i64, media: Vec<MediaEntity>) -> Post {
    Post {
        id: id.to_string(),
        created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        text: format!("post {}", id),
        media,
        raw: None,
    }
}

/// Five posts, one photo each, newest first: p5 (newest) .. p1.
fn five_posts() -> Vec<Post> {
    (1..=5)
        .rev()
        .map(|n| {
            post(
                &format!("p{}", n),
                BASE_TIME + n * 60,
                vec![photo(&format!("m{}", n))],
            )
        })
        .collect()
}

fn unbounded() -> HarvestOptions {
    HarvestOptions::default()
}

fn capped(max_downloads: u64) -> HarvestOptions {
    HarvestOptions {
        max_downloads,
        ..Default::default()
    }
}

fn mtime(path: &Path) -> f64 {
    std::fs::metadata(path)
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

fn media_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

// ==================== Stop Conditions ====================

#[tokio::test]
async fn test_first_run_downloads_everything_until_exhaustion() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::StreamExhausted);
    assert_eq!(summary.downloaded(), 5);
    assert_eq!(summary.stats.pic_count, 5);
    assert_eq!(summary.stats.posts_processed, 5);
    assert_eq!(summary.watermark_before, 0.0);
    assert_eq!(
        media_files(dir.path()),
        ["m1.jpg", "m2.jpg", "m3.jpg", "m4.jpg", "m5.jpg"]
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();

    let first = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();
    harvest(&mut source, &first, &unbounded(), dir.path())
        .await
        .unwrap();

    let second = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();
    let summary = harvest(&mut source, &second, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.downloaded(), 0);
    assert!(second.calls().is_empty());
    // The newest post sits exactly at the watermark and is re-checked, the next one stops the walk
    assert_eq!(summary.skipped_existing(), 1);
    assert_eq!(summary.stop_reason, StopReason::WatermarkReached);
}

#[tokio::test]
async fn test_watermark_stops_before_older_posts() {
    let dir = TempDir::new().unwrap();
    let t3 = (BASE_TIME + 3 * 60) as f64;

    let mut store = WatermarkStore::ensure_directory(dir.path()).unwrap();
    store.advance(t3).unwrap();

    let fetcher = ScriptedFetcher::default();
    let mut source = CountingSource::new(five_posts());
    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::WatermarkReached);
    assert_eq!(summary.watermark_before, t3);
    assert_eq!(summary.stats.posts_processed, 3);
    assert_eq!(media_files(dir.path()), ["m3.jpg", "m4.jpg", "m5.jpg"]);
    // p2 was pulled to discover it is too old, p1 never was
    assert_eq!(source.pulled, 4);
}

#[tokio::test]
async fn test_cap_stops_mid_post() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::default();
    let mut source = CountingSource::new(vec![
        post("p2", BASE_TIME + 60, vec![photo("a"), photo("b"), photo("c")]),
        post("p1", BASE_TIME, vec![photo("d")]),
    ]);

    let summary = harvest(&mut source, &fetcher, &capped(2), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::CapReached);
    assert_eq!(summary.downloaded(), 2);
    assert_eq!(fetcher.calls(), [photo_url("a"), photo_url("b")]);
    assert_eq!(media_files(dir.path()), ["a.jpg", "b.jpg"]);
    assert_eq!(source.pulled, 1);
}

#[tokio::test]
async fn test_zero_cap_downloads_nothing() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::default();
    let mut source = CountingSource::new(five_posts());

    let summary = harvest(&mut source, &fetcher, &capped(0), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::CapReached);
    assert_eq!(summary.downloaded(), 0);
    assert_eq!(source.pulled, 0);
    assert!(dir.path().is_dir());
}

#[tokio::test]
async fn test_empty_stream_is_exhausted() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("fresh");
    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = VecDeque::new();

    let summary = harvest(&mut source, &fetcher, &unbounded(), &out)
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::StreamExhausted);
    assert!(out.is_dir());
    assert!(!out.join(MARKER_FILE).exists());
    assert_eq!(summary.watermark_after, 0.0);
}

// ==================== Per-file Handling ====================

#[tokio::test]
async fn test_failed_file_does_not_abort_walk() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::failing_on(&[&photo_url("bad")]);
    let mut source: VecDeque<Post> = vec![
        post("p2", BASE_TIME + 60, vec![photo("bad"), photo("good")]),
        post("p1", BASE_TIME, vec![photo("older")]),
    ]
    .into();

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::StreamExhausted);
    assert_eq!(summary.downloaded(), 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.stats.failures[0].filename, "bad.jpg");
    assert_eq!(summary.stats.failures[0].post_id, "p2");
    assert!(!summary.is_clean());
    assert_eq!(media_files(dir.path()), ["good.jpg", "older.jpg"]);
}

#[tokio::test]
async fn test_failed_file_is_retried_next_run() {
    let dir = TempDir::new().unwrap();
    let posts = || -> VecDeque<Post> {
        vec![post("p1", BASE_TIME, vec![photo("flaky"), photo("fine")])].into()
    };

    let failing = ScriptedFetcher::failing_on(&[&photo_url("flaky")]);
    harvest(&mut posts(), &failing, &unbounded(), dir.path())
        .await
        .unwrap();

    let working = ScriptedFetcher::default();
    let summary = harvest(&mut posts(), &working, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(working.calls(), [photo_url("flaky")]);
    assert_eq!(summary.downloaded(), 1);
    assert_eq!(summary.skipped_existing(), 1);
}

#[tokio::test]
async fn test_existing_files_are_skipped_and_not_counted() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("m5.jpg"), b"from an earlier run").unwrap();

    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();
    let summary = harvest(&mut source, &fetcher, &capped(2), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.skipped_existing(), 1);
    assert_eq!(summary.downloaded(), 2);
    assert_eq!(fetcher.calls(), [photo_url("m4"), photo_url("m3")]);
    assert_eq!(
        std::fs::read(dir.path().join("m5.jpg")).unwrap(),
        b"from an earlier run"
    );
}

#[tokio::test]
async fn test_unrecognized_kind_is_ignored() {
    let dir = TempDir::new().unwrap();
    let poll = MediaEntity {
        id: "poll1".into(),
        kind: MediaKind::Unrecognized("poll".into()),
        media_url: String::new(),
        variants: Vec::new(),
    };
    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> =
        vec![post("p1", BASE_TIME, vec![poll, photo("pic")])].into();

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.downloaded(), 1);
    assert_eq!(summary.failed(), 0);
    assert_eq!(media_files(dir.path()), ["pic.jpg"]);
}

#[tokio::test]
async fn test_unsafe_media_id_is_refused() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> =
        vec![post("p1", BASE_TIME, vec![photo("../escape")])].into();

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.failed(), 1);
    assert!(fetcher.calls().is_empty());
    assert!(!dir.path().parent().unwrap().join("escape.jpg").exists());
}

#[tokio::test]
async fn test_stale_temporary_files_are_removed() {
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join(".m5.jpg.0123456789abcdef.part");
    std::fs::write(&stale, b"half").unwrap();

    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();
    harvest(&mut source, &fetcher, &capped(1), dir.path())
        .await
        .unwrap();

    assert!(!stale.exists());
    assert_eq!(media_files(dir.path()), ["m5.jpg"]);
}

// ==================== Timestamps ====================

#[tokio::test]
async fn test_file_and_marker_times_follow_posts() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    let newest = (BASE_TIME + 5 * 60) as f64;
    assert_eq!(mtime(&dir.path().join("m5.jpg")), newest);
    assert_eq!(mtime(&dir.path().join("m1.jpg")), (BASE_TIME + 60) as f64);
    assert_eq!(mtime(&dir.path().join(MARKER_FILE)), newest);
    assert_eq!(summary.watermark_after, newest);
}

#[tokio::test]
async fn test_watermark_not_advanced_without_downloads() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::failing_on(&[&photo_url("m5")]);
    let mut source: VecDeque<Post> =
        vec![post("p5", BASE_TIME + 300, vec![photo("m5")])].into();

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.watermark_after, 0.0);
    assert!(!dir.path().join(MARKER_FILE).exists());
}

// ==================== Stream Errors ====================

#[tokio::test]
async fn test_stream_error_is_returned() {
    let dir = TempDir::new().unwrap();
    let fetcher = ScriptedFetcher::default();
    let mut source = FailingSource {
        posts: vec![post("p1", BASE_TIME, vec![photo("first")])].into(),
    };

    let err = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap_err();

    match err {
        Error::StreamInterrupted {
            downloaded,
            failed,
            source,
        } => {
            assert_eq!(downloaded, 1);
            assert_eq!(failed, 0);
            assert!(matches!(*source, Error::Api(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // Work done before the failure stays on disk
    assert_eq!(media_files(dir.path()), ["first.jpg"]);
    assert_eq!(mtime(&dir.path().join(MARKER_FILE)), BASE_TIME as f64);
}

#[tokio::test]
async fn test_output_directory_that_is_a_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();

    let fetcher = ScriptedFetcher::default();
    let mut source: VecDeque<Post> = five_posts().into();
    let result = harvest(&mut source, &fetcher, &unbounded(), &file).await;

    assert!(matches!(result, Err(Error::OutputDirectory { .. })));
    assert!(fetcher.calls().is_empty());
}

// ==================== Side-effect Failures ====================

#[cfg(unix)]
#[tokio::test]
async fn test_unwritable_marker_is_reported_but_not_fatal() {
    let dir = TempDir::new().unwrap();
    // Dangling link into a missing directory: the marker can never be created
    std::os::unix::fs::symlink(
        dir.path().join("missing").join("target"),
        dir.path().join(MARKER_FILE),
    )
    .unwrap();

    let fetcher = ScriptedFetcher::default();
    let mut source = CountingSource::new(vec![
        post("p2", BASE_TIME + 60, vec![photo("newer")]),
        post("p1", BASE_TIME, vec![photo("older")]),
    ]);

    let summary = harvest(&mut source, &fetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::StreamExhausted);
    assert_eq!(source.pulled, 2);
    assert_eq!(summary.downloaded(), 2);
    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.marker_failures(), 2);
    assert!(summary.is_clean());
    assert_eq!(summary.watermark_after, 0.0);
    assert_eq!(media_files(dir.path()), ["newer.jpg", "older.jpg"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_file_time_failure_is_counted() {
    let dir = TempDir::new().unwrap();
    let mut source: VecDeque<Post> =
        vec![post("p1", BASE_TIME, vec![photo("first")])].into();

    let summary = harvest(&mut source, &DirectoryFetcher, &unbounded(), dir.path())
        .await
        .unwrap();

    assert_eq!(summary.downloaded(), 1);
    assert_eq!(summary.stats.timestamp_failures, 1);
    assert!(summary.is_clean());
    // The watermark still advances
    assert_eq!(mtime(&dir.path().join(MARKER_FILE)), BASE_TIME as f64);
}
