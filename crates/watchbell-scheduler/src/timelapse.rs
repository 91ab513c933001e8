//! Timelapse notifier job.
//!
//! Every firing captures one frame into today's bucket, bracketed by the
//! optional light. Shortly after midnight the previous day's bucket is sealed:
//! it is compiled into a GIF, sent to every subscriber, and the watermark is
//! advanced. The watermark lives on disk, so a restart inside the window
//! neither recompiles nor resends.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use watchbell_core::traits::{Actuator, CaptureDevice, Clock};
use watchbell_core::{Artifact, Result, WatchbellError};

use crate::bucket::{BucketDirectory, bucket_key, rollover_due};
use crate::compile::GifCompiler;
use crate::engine::Job;
use crate::notify::Notifier;
use crate::state::SharedState;

/// Wraps an actuator so that its failures are logged and swallowed.
#[derive(Clone)]
pub struct ActuationGate {
    actuator: Arc<dyn Actuator>,
}

impl ActuationGate {
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self { actuator }
    }

    /// Returns whether the toggle succeeded.
    pub async fn on(&self) -> bool {
        match self.actuator.turn_on().await {
            Ok(()) => {
                tracing::debug!("💡 {} on", self.actuator.name());
                true
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to turn on {}: {e}", self.actuator.name());
                false
            }
        }
    }

    pub async fn off(&self) -> bool {
        match self.actuator.turn_off().await {
            Ok(()) => {
                tracing::debug!("💡 {} off", self.actuator.name());
                true
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to turn off {}: {e}", self.actuator.name());
                false
            }
        }
    }
}

/// What one successful firing did.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureReport {
    pub frame: PathBuf,
    /// Compiled artifact delivered during this firing, if any.
    pub delivered: Option<PathBuf>,
}

pub struct CaptureJob {
    buckets: BucketDirectory,
    compiler: GifCompiler,
    camera: Arc<dyn CaptureDevice>,
    gate: Option<ActuationGate>,
    clock: Arc<dyn Clock>,
    compile_window: Duration,
    notifier: Notifier,
    state: SharedState,
}

impl CaptureJob {
    pub fn new(
        buckets: BucketDirectory,
        compiler: GifCompiler,
        camera: Arc<dyn CaptureDevice>,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
        state: SharedState,
    ) -> Self {
        Self {
            buckets,
            compiler,
            camera,
            gate: None,
            clock,
            compile_window: Duration::minutes(10),
            notifier,
            state,
        }
    }

    pub fn with_gate(mut self, gate: ActuationGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_compile_window(mut self, window: Duration) -> Self {
        self.compile_window = window;
        self
    }

    /// One capture cycle. A capture failure is returned, but only after the
    /// light has been switched off and the rollover check has run.
    pub async fn capture_once(&self) -> Result<CaptureReport> {
        let now = self.clock.now();

        // The light is only toggled once the frame has somewhere to go.
        let captured = match self.buckets.ensure(bucket_key(now)) {
            Ok(_) => self.capture_under_light(now).await,
            Err(e) => Err(e),
        };

        let delivered = match self.compile_if_due(now).await {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::warn!("⚠️ Timelapse compilation failed, will retry: {e}");
                None
            }
        };

        let frame = captured?;
        Ok(CaptureReport { frame, delivered })
    }

    async fn capture_under_light(&self, now: NaiveDateTime) -> Result<PathBuf> {
        if let Some(gate) = &self.gate {
            gate.on().await;
        }
        let path = self.buckets.next_frame_path(now);
        let captured = self.camera.capture(&path).await;
        if let Some(gate) = &self.gate {
            gate.off().await;
        }
        captured?;
        tracing::info!("📸 Captured {}", path.display());
        Ok(path)
    }

    /// Compile and deliver the bucket that closed at the last midnight, if
    /// `now` is inside the trailing window and it has not been done yet.
    pub async fn compile_if_due(&self, now: NaiveDateTime) -> Result<Option<PathBuf>> {
        let Some(previous) = rollover_due(now, self.compile_window) else {
            return Ok(None);
        };
        if self.buckets.is_compiled(previous) {
            tracing::debug!("Bucket {previous} already compiled");
            return Ok(None);
        }

        let output = self.buckets.compiled_path(previous);
        let compiled = if output.exists() {
            // Compiled before a crash but never delivered.
            tracing::info!("🎞️ Reusing {} compiled before restart", output.display());
            Some(output)
        } else {
            let compiler = self.compiler.clone();
            let dir = self.buckets.bucket_path(previous);
            tokio::task::spawn_blocking(move || compiler.compile(&dir, &output))
                .await
                .map_err(|e| WatchbellError::Compile(format!("Compile task failed: {e}")))??
        };

        let Some(path) = compiled else {
            self.buckets.mark_compiled(previous)?;
            return Ok(None);
        };

        {
            let state = self.state.lock().await;
            let subscribers = state.subscribers.snapshot();
            self.notifier
                .deliver(&Artifact::File(path.clone()), &subscribers)
                .await;
        }
        self.buckets.mark_compiled(previous)?;
        tracing::info!("✅ Timelapse for {previous} delivered");
        Ok(Some(path))
    }
}

#[async_trait]
impl Job for CaptureJob {
    fn name(&self) -> &str {
        "timelapse"
    }

    async fn fire(&mut self) -> Result<()> {
        self.capture_once().await.map(|_| ())
    }
}
