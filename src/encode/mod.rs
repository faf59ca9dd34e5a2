pub mod assemble;
pub mod ffmpeg;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("Failed to spawn {program}. Is it installed?")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Encoder exited with status {status:?}:\n{stderr}")]
    Failed { status: Option<i32>, stderr: String },
    #[error("Encoder I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives raw RGBA frames for one silent video stream.
pub trait FrameSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<(), EncoderError>;

    /// Close the stream and wait for the encoder to finish writing.
    fn finish(self: Box<Self>) -> Result<(), EncoderError>;
}

/// External video encoder: a silent stream from frames, then a mux with audio.
pub trait Encoder {
    fn open_video(
        &self,
        output: &Path,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Box<dyn FrameSink>, EncoderError>;

    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), EncoderError>;
}
