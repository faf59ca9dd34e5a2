use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use super::{Encoder, EncoderError, FrameSink};

/// Video settings for the silent stream.
#[derive(Debug, Clone)]
pub struct VideoCodec {
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
}

impl Default for VideoCodec {
    fn default() -> Self {
        Self {
            codec: "libx264".into(),
            pix_fmt: "yuv420p".into(),
            crf: 18,
        }
    }
}

pub struct FfmpegEncoder {
    program: String,
    codec: VideoCodec,
}

impl FfmpegEncoder {
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            program: "ffmpeg".into(),
            codec,
        }
    }

    /// Use a different binary in place of `ffmpeg`.
    #[cfg(test)]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> EncoderError {
        EncoderError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

fn video_args(output: &Path, width: u32, height: u32, fps: u32, codec: &VideoCodec) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-f",
        "rawvideo",
        "-pixel_format",
        "rgba",
        "-video_size",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.push(format!("{}x{}", width, height).into());
    args.extend(["-framerate".into(), fps.to_string().into()]);
    args.extend(["-i".into(), "pipe:0".into()]);
    args.extend(["-c:v".into(), codec.codec.as_str().into()]);
    args.extend(["-pix_fmt".into(), codec.pix_fmt.as_str().into()]);
    args.extend(["-crf".into(), codec.crf.to_string().into()]);
    args.extend(["-preset".into(), "medium".into()]);
    args.push(output.as_os_str().to_owned());
    args
}

fn mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        video.as_os_str().to_owned(),
        "-i".into(),
        audio.as_os_str().to_owned(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-shortest".into(),
        output.as_os_str().to_owned(),
    ]
}

impl Encoder for FfmpegEncoder {
    fn open_video(
        &self,
        output: &Path,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Box<dyn FrameSink>, EncoderError> {
        let child = self
            .command()
            .args(video_args(output, width, height, fps, &self.codec))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, codec={}",
            width,
            height,
            fps,
            self.codec.codec
        );

        Ok(Box::new(FfmpegSink::new(child)))
    }

    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), EncoderError> {
        let result = self
            .command()
            .args(mux_args(video, audio, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !result.status.success() {
            return Err(EncoderError::Failed {
                status: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
            });
        }

        log::info!("Muxed audio into {}", output.display());
        Ok(())
    }
}

pub struct FfmpegSink {
    child: Option<Child>,
}

impl FfmpegSink {
    fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// Close stdin and wait for ffmpeg to exit. A non-zero exit carries
    /// its stderr.
    fn wait(&mut self) -> Result<(), EncoderError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        drop(child.stdin.take());

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(EncoderError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<(), EncoderError> {
        let stdin = self
            .child
            .as_mut()
            .and_then(|child| child.stdin.as_mut())
            .ok_or_else(|| {
                EncoderError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "ffmpeg stdin not available",
                ))
            })?;

        if let Err(err) = stdin.write_all(rgba) {
            // ffmpeg stopped reading; its exit status and stderr explain why
            self.wait()?;
            return Err(err.into());
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), EncoderError> {
        self.wait()?;
        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            log::debug!("Stopping unfinished ffmpeg process {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn mux_copies_video_and_encodes_aac() {
        let args = strings(&mux_args(Path::new("v.mp4"), Path::new("a.wav"), Path::new("out.mp4")));
        assert_eq!(
            args,
            ["-y", "-i", "v.mp4", "-i", "a.wav", "-c:v", "copy", "-c:a", "aac", "-shortest", "out.mp4"]
        );
    }

    #[test]
    fn video_reads_rgba_from_stdin() {
        let args = strings(&video_args(Path::new("v.mp4"), 1280, 720, 24, &VideoCodec::default()));
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-video_size") + 1], "1280x720");
        assert_eq!(args[pos("-framerate") + 1], "24");
        assert_eq!(args[pos("-pixel_format") + 1], "rgba");
        assert_eq!(args[pos("-i") + 1], "pipe:0");
        assert_eq!(args[pos("-c:v") + 1], "libx264");
        assert_eq!(args.last().map(String::as_str), Some("v.mp4"));
    }

    #[cfg(unix)]
    fn failing_script(dir: &Path, stderr: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg.sh");
        std::fs::write(&path, format!("#!/bin/sh\necho \"{}\" >&2\nexit 1\n", stderr)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_stderr_instead_of_broken_pipe() {
        let dir = tempfile::tempdir().unwrap();
        let program = failing_script(dir.path(), "Unknown encoder 'libx999'");
        let encoder = FfmpegEncoder::new(VideoCodec {
            codec: "libx999".into(),
            ..VideoCodec::default()
        })
        .with_program(program);

        let mut sink = encoder.open_video(&dir.path().join("v.mp4"), 640, 360, 30).unwrap();
        let frame = vec![0u8; 640 * 360 * 4];
        let mut result = Ok(());
        for _ in 0..50 {
            result = sink.write_frame(&frame);
            if result.is_err() {
                break;
            }
        }
        // Writes may all land in the pipe buffer before the exit is seen
        let err = match result {
            Err(err) => err,
            Ok(()) => sink.finish().unwrap_err(),
        };

        match err {
            EncoderError::Failed { status, stderr } => {
                assert_eq!(status, Some(1));
                assert!(stderr.contains("libx999"), "stderr was: {}", stderr);
            }
            other => panic!("expected encoder failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_mux_keeps_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = failing_script(dir.path(), "Invalid data found when processing input");
        let encoder = FfmpegEncoder::new(VideoCodec::default()).with_program(program);
        let err = encoder
            .mux(&dir.path().join("v.mp4"), &dir.path().join("a.wav"), &dir.path().join("o.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid data found when processing input"));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let encoder = FfmpegEncoder::new(VideoCodec::default()).with_program("audioline-no-such-encoder");
        let dir = tempfile::tempdir().unwrap();
        let err = encoder
            .mux(&dir.path().join("v.mp4"), &dir.path().join("a.wav"), &dir.path().join("o.mp4"))
            .unwrap_err();
        assert!(matches!(err, EncoderError::Spawn { .. }));
    }
}
