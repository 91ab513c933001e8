//! Day buckets for captured frames.
//!
//! ```text
//! <root>/
//!   2024-06-01/            one folder per local calendar day
//!     08-00-00.jpg         frames named %H-%M-%S, so lexical == chronological
//!     08-10-00.jpg
//!     02-30-00_1.jpg       repeated local time (DST fall-back), never overwritten
//!   2024-06-01.gif         compiled output, one per day
//!   .last_compiled         watermark: last day compiled and delivered
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use watchbell_core::{Result, WatchbellError};

const WATERMARK_FILE: &str = ".last_compiled";

/// A bucket is keyed by its calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey(pub NaiveDate);

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for BucketKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

impl BucketKey {
    pub fn previous(self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }
}

/// The bucket a timestamp falls into.
pub fn bucket_key(ts: NaiveDateTime) -> BucketKey {
    BucketKey(ts.date())
}

/// File name of the frame captured at `ts`.
pub fn frame_name(ts: NaiveDateTime, extension: &str) -> String {
    format!("{}.{}", ts.format("%H-%M-%S"), extension)
}

/// If `now` lies within `window` after the start of its bucket, the bucket
/// that just closed is due for compilation.
pub fn rollover_due(now: NaiveDateTime, window: Duration) -> Option<BucketKey> {
    let start = now.date().and_time(NaiveTime::MIN);
    if now - start < window {
        bucket_key(now).previous()
    } else {
        None
    }
}

/// Frame files in `dir` with `extension`, sorted by file name.
/// A missing directory has no frames.
pub fn list_frames(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        })
        .collect();
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

/// Maps time to bucket folders under one root and tracks the compile watermark.
#[derive(Debug, Clone)]
pub struct BucketDirectory {
    root: PathBuf,
    extension: String,
}

impl BucketDirectory {
    pub fn new(root: &Path, extension: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn bucket_path(&self, key: BucketKey) -> PathBuf {
        self.root.join(key.to_string())
    }

    /// Create the bucket folder if needed. Idempotent.
    pub fn ensure(&self, key: BucketKey) -> Result<PathBuf> {
        let path = self.bucket_path(key);
        if !path.exists() {
            std::fs::create_dir_all(&path)?;
            tracing::info!("📁 New bucket {}", path.display());
        }
        Ok(path)
    }

    /// Where the frame captured at `ts` goes.
    pub fn frame_path(&self, ts: NaiveDateTime) -> PathBuf {
        self.bucket_path(bucket_key(ts))
            .join(frame_name(ts, &self.extension))
    }

    /// [`frame_path`](Self::frame_path) unless that file exists already, as
    /// when local time repeats at the end of daylight saving. The repeat gets
    /// a `_N` suffix, which sorts right after the original name.
    pub fn next_frame_path(&self, ts: NaiveDateTime) -> PathBuf {
        let path = self.frame_path(ts);
        if !path.exists() {
            return path;
        }
        let dir = self.bucket_path(bucket_key(ts));
        let stem = ts.format("%H-%M-%S").to_string();
        (1..)
            .map(|n| dir.join(format!("{stem}_{n}.{}", self.extension)))
            .find(|p| !p.exists())
            .unwrap_or(path)
    }

    pub fn frames(&self, key: BucketKey) -> Result<Vec<PathBuf>> {
        list_frames(&self.bucket_path(key), &self.extension)
    }

    pub fn compiled_path(&self, key: BucketKey) -> PathBuf {
        self.root.join(format!("{key}.gif"))
    }

    /// Last bucket compiled and delivered, if any.
    pub fn watermark(&self) -> Option<BucketKey> {
        let path = self.root.join(WATERMARK_FILE);
        let raw = std::fs::read_to_string(&path).ok()?;
        match raw.parse() {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!("⚠️ Ignoring unreadable watermark {}: {e}", path.display());
                None
            }
        }
    }

    pub fn is_compiled(&self, key: BucketKey) -> bool {
        self.watermark().is_some_and(|w| w >= key)
    }

    /// Advance the watermark to `key`. Never moves it backwards.
    pub fn mark_compiled(&self, key: BucketKey) -> Result<()> {
        if self.is_compiled(key) {
            return Ok(());
        }
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(self.root.join(WATERMARK_FILE), key.to_string())
            .map_err(|e| WatchbellError::Persistence(format!("Watermark write error: {e}")))?;
        Ok(())
    }
}
