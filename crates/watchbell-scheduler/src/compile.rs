//! Compiles a sealed bucket into an animated GIF.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{Delay, Frame};
use watchbell_core::{Result, WatchbellError};

use crate::bucket::list_frames;

/// Wider frames are scaled down before encoding.
const MAX_FRAME_WIDTH: u32 = 1280;

/// NeuQuant sampling factor, 1 (best, slowest) to 30.
const QUANTIZER_SPEED: i32 = 10;

/// Concatenates a bucket's frames, in file-name order, into a looping GIF.
#[derive(Debug, Clone)]
pub struct GifCompiler {
    frame_delay_ms: u32,
    extension: String,
}

impl GifCompiler {
    pub fn new(frame_delay_ms: u32, extension: &str) -> Self {
        Self {
            frame_delay_ms,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Compile every frame in `bucket_dir` into `output`.
    ///
    /// Returns `None` for an empty or missing bucket; nothing is written.
    /// Only call this for a bucket that will not receive more frames.
    /// Blocking: run it on a blocking thread from async code.
    pub fn compile(&self, bucket_dir: &Path, output: &Path) -> Result<Option<PathBuf>> {
        let frames = list_frames(bucket_dir, &self.extension)?;
        if frames.is_empty() {
            tracing::info!("🎞️ No frames in {}, nothing to compile", bucket_dir.display());
            return Ok(None);
        }

        // Written under a temporary name so a crash never leaves a truncated
        // GIF at the final path.
        let partial = output.with_extension("gif.partial");
        if let Err(e) = self.encode(&frames, &partial) {
            std::fs::remove_file(&partial).ok();
            return Err(e);
        }
        std::fs::rename(&partial, output)?;

        tracing::info!(
            "🎞️ Compiled {} frames from {} into {}",
            frames.len(),
            bucket_dir.display(),
            output.display()
        );
        Ok(Some(output.to_path_buf()))
    }

    fn encode(&self, frames: &[PathBuf], output: &Path) -> Result<()> {
        let file = File::create(output)?;
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), QUANTIZER_SPEED);
        encoder.set_repeat(Repeat::Infinite)?;

        let delay = Delay::from_numer_denom_ms(self.frame_delay_ms, 1);
        for path in frames {
            let mut img = image::open(path).map_err(|e| {
                WatchbellError::Compile(format!("Failed to read frame {}: {e}", path.display()))
            })?;
            if img.width() > MAX_FRAME_WIDTH {
                img = img.resize(MAX_FRAME_WIDTH, u32::MAX, FilterType::Triangle);
            }
            encoder.encode_frame(Frame::from_parts(img.to_rgba8(), 0, 0, delay))?;
        }
        Ok(())
    }
}
