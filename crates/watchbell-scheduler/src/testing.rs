//! In-memory collaborators for unit tests.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use watchbell_core::traits::{Actuator, CaptureDevice, Clock, Formatter, StatusSource, Transport};
use watchbell_core::{Result, SubscriberId, WatchbellError};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(SubscriberId, String),
    File(SubscriberId, PathBuf),
}

/// Records every successful send; fails for the configured ids.
#[derive(Default)]
pub struct RecordingTransport {
    fail_for: HashSet<i64>,
    sent: Mutex<Vec<Sent>>,
    attempts: AtomicUsize,
}

impl RecordingTransport {
    pub fn failing_for(ids: &[i64]) -> Self {
        Self {
            fail_for: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, to: SubscriberId, sent: Sent) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.contains(&to.0) {
            return Err(WatchbellError::Delivery(format!("chat {to} unreachable")));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(&self, to: SubscriberId, text: &str) -> Result<()> {
        self.record(to, Sent::Text(to, text.to_string()))
    }

    async fn send_file(&self, to: SubscriberId, path: &Path) -> Result<()> {
        self.record(to, Sent::File(to, path.to_path_buf()))
    }
}

/// Returns queued payloads in order; an exhausted queue is a fetch error.
#[derive(Default)]
pub struct ScriptedSource {
    queue: Mutex<VecDeque<Result<serde_json::Value>>>,
}

impl ScriptedSource {
    pub fn push_ok(&self, value: serde_json::Value) {
        self.queue.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_err(&self, reason: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Err(WatchbellError::Fetch(reason.to_string())));
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch(&self) -> Result<serde_json::Value> {
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WatchbellError::Fetch("no payload queued".into())))
    }
}

/// Strings render bare, everything else as compact JSON.
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, payload: &serde_json::Value) -> String {
        match payload {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

pub struct FixedClock(Mutex<NaiveDateTime>);

impl FixedClock {
    pub fn at(s: &str) -> Self {
        Self(Mutex::new(dt(s)))
    }

    pub fn set(&self, s: &str) {
        *self.0.lock().unwrap() = dt(s);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

/// Parse `YYYY-mm-dd HH:MM:SS`.
pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Writes a small solid-colour image for every capture.
pub struct FakeCamera {
    pub color: Mutex<[u8; 3]>,
    pub fail: bool,
    captures: AtomicUsize,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            color: Mutex::new([200, 30, 30]),
            fail: false,
            captures: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for FakeCamera {
    async fn capture(&self, path: &Path) -> Result<()> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(WatchbellError::Capture("camera not detected".into()));
        }
        let color = *self.color.lock().unwrap();
        write_frame(path, color);
        Ok(())
    }
}

/// Write an 8x8 solid image; the format follows the extension.
pub fn write_frame(path: &Path, color: [u8; 3]) {
    image::RgbImage::from_pixel(8, 8, image::Rgb(color))
        .save(path)
        .unwrap();
}

/// Records toggles in order; optionally fails every call.
#[derive(Default)]
pub struct FakeLight {
    pub fail: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeLight {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Actuator for FakeLight {
    fn name(&self) -> &str {
        "fake-light"
    }

    async fn turn_on(&self) -> Result<()> {
        self.calls.lock().unwrap().push("on");
        if self.fail {
            return Err(WatchbellError::Actuation("503 Service Unavailable".into()));
        }
        Ok(())
    }

    async fn turn_off(&self) -> Result<()> {
        self.calls.lock().unwrap().push("off");
        if self.fail {
            return Err(WatchbellError::Actuation("503 Service Unavailable".into()));
        }
        Ok(())
    }
}
