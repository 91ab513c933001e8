//! Frame capture by running an external still-capture program.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use watchbell_core::config::TimelapseConfig;
use watchbell_core::traits::CaptureDevice;
use watchbell_core::{Result, WatchbellError};

const PATH_PLACEHOLDER: &str = "{path}";

/// Runs `program args...` with `{path}` replaced by the frame destination.
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &TimelapseConfig) -> Self {
        Self::new(config.camera_program.clone(), config.camera_args.clone())
    }

    fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect()
    }
}

#[async_trait]
impl CaptureDevice for CommandCamera {
    async fn capture(&self, path: &Path) -> Result<()> {
        let output = tokio::process::Command::new(&self.program)
            .args(self.args_for(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| WatchbellError::Capture(format!("Cannot run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WatchbellError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        if !path.exists() {
            return Err(WatchbellError::Capture(format!(
                "{} wrote no frame to {}",
                self.program,
                path.display()
            )));
        }

        Ok(())
    }
}
