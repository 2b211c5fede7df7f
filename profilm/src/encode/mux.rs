use crate::encode::ffmpeg::{ensure_parent_dir, is_ffmpeg_on_path};
use crate::foundation::error::{ProfilmError, ProfilmResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Poll interval while waiting for the mux child to exit.
const WAIT_STEP: Duration = Duration::from_millis(25);

/// Structured result of a completed mux run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxReport {
    /// Path of the muxed file.
    pub out_path: PathBuf,
    /// Child exit code, when the platform reports one.
    pub exit_code: Option<i32>,
    /// Trimmed stderr output of the child.
    pub stderr: String,
}

/// Mux a silent MP4 and a raw mono s16le PCM track into `out`.
///
/// The video stream is copied, never re-encoded; only the score is encoded
/// (AAC). The child is bounded by `timeout` and killed past it. Every
/// failure here is an `Audio` error, recoverable at the session boundary by
/// shipping the silent video instead. A zero timeout fails the mux
/// unconditionally.
pub fn mux_with_audio(
    video: &Path,
    audio: &Path,
    out: &Path,
    sample_rate: u32,
    timeout: Duration,
) -> ProfilmResult<MuxReport> {
    if timeout.is_zero() {
        return Err(ProfilmError::audio("mux timed out after 0s"));
    }
    if sample_rate == 0 {
        return Err(ProfilmError::audio("mux sample rate must be non-zero"));
    }
    if !is_ffmpeg_on_path() {
        return Err(ProfilmError::audio(
            "ffmpeg is required for audio mux, but was not found on PATH",
        ));
    }
    ensure_parent_dir(out)?;

    let mut child = mux_command(video, audio, out, sample_rate)
        .spawn()
        .map_err(|e| ProfilmError::audio(format!("failed to spawn ffmpeg for mux: {e}")))?;

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ProfilmError::audio("failed to open mux stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes)?;
        Ok::<_, std::io::Error>(bytes)
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = std::fs::remove_file(out);
                    return Err(ProfilmError::audio(format!(
                        "mux timed out after {}s",
                        timeout.as_secs()
                    )));
                }
                std::thread::sleep(WAIT_STEP);
            }
            Err(e) => {
                return Err(ProfilmError::audio(format!(
                    "failed to poll mux process: {e}"
                )));
            }
        }
    };

    let stderr_bytes = stderr_drain
        .join()
        .map_err(|_| ProfilmError::audio("mux stderr drain thread panicked"))?
        .map_err(|e| ProfilmError::audio(format!("mux stderr read failed: {e}")))?;
    let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_owned();

    if !status.success() {
        let _ = std::fs::remove_file(out);
        return Err(ProfilmError::audio(format!(
            "ffmpeg mux exited with status {status}: {stderr}"
        )));
    }

    Ok(MuxReport { out_path: out.to_path_buf(), exit_code: status.code(), stderr })
}

fn mux_command(video: &Path, audio: &Path, out: &Path, sample_rate: u32) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    cmd.args(["-y", "-loglevel", "error", "-i"]).arg(video);
    cmd.args(["-f", "s16le", "-ar", &sample_rate.to_string(), "-ac", "1", "-i"])
        .arg(audio);
    cmd.args(["-c:v", "copy", "-c:a", "aac", "-shortest", "-movflags", "+faststart"])
        .arg(out);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_command_copies_video_and_encodes_audio() {
        let cmd = mux_command(
            Path::new("v.mp4"),
            Path::new("a.s16le"),
            Path::new("out.mp4"),
            44_100,
        );
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-y", "-loglevel", "error", "-i", "v.mp4", "-f", "s16le", "-ar", "44100",
                "-ac", "1", "-i", "a.s16le", "-c:v", "copy", "-c:a", "aac", "-shortest",
                "-movflags", "+faststart", "out.mp4",
            ]
        );
    }

    #[test]
    fn zero_timeout_is_a_recoverable_audio_error() {
        let err = mux_with_audio(
            Path::new("v.mp4"),
            Path::new("a.s16le"),
            Path::new("out.mp4"),
            44_100,
            Duration::ZERO,
        )
        .unwrap_err();
        assert!(err.is_recoverable(), "{err}");
    }

    #[test]
    fn missing_input_fails_and_leaves_no_output() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg not on PATH");
            return;
        }
        let out = std::env::temp_dir().join(format!("profilm-mux-miss-{}.mp4", std::process::id()));
        let err = mux_with_audio(
            Path::new("/nonexistent/profilm-missing-video.mp4"),
            Path::new("/nonexistent/profilm-missing-audio.s16le"),
            &out,
            44_100,
            Duration::from_secs(10),
        )
        .unwrap_err();
        assert!(err.is_recoverable(), "{err}");
        assert!(!out.exists(), "failed mux must not leave a partial file");
    }
}
