use crate::foundation::core::Fps;
use crate::foundation::error::{ProfilmError, ProfilmResult};
use crate::foundation::math::Lcg64;
use crate::timeline::schedule::Schedule;
use std::f64::consts::TAU;
use std::path::Path;

/// Output sample rate, mono.
pub const SAMPLE_RATE: u32 = 44_100;
/// Samples are clamped here before quantization.
const PEAK: f32 = 0.89;
/// Seconds between sub-bass pulses.
const PULSE_PERIOD: f64 = 2.0;
/// Transient click length in seconds.
const CLICK_LEN: f64 = 0.14;
/// Longest track the synthesizer will allocate, in seconds.
const MAX_TRACK_SECS: u64 = 2 * 60 * 60;

/// The synthesized mono score, 16-bit at [`SAMPLE_RATE`].
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Mono PCM samples.
    pub samples: Vec<i16>,
}

impl AudioTrack {
    /// Track length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Write raw signed 16-bit little-endian PCM to `path`.
    pub fn write_s16le(&self, path: &Path) -> ProfilmResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProfilmError::audio(format!(
                    "create audio output directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for &s in &self.samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        std::fs::write(path, bytes).map_err(|e| {
            ProfilmError::audio(format!("write audio file '{}': {e}", path.display()))
        })
    }
}

/// Convert a frame delta to the nearest sample index at `sample_rate`.
pub(crate) fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

/// Synthesize the score for `schedule`.
///
/// A pure function of the block schedule and its seed: a slowly rising
/// drone, a fixed sub-bass pulse, one transient click per block transition
/// scaled by importance, a tension tone gated in after the halfway point
/// and a progress-scaled noise floor. Oscillator phases are integrated
/// sample by sample so frequency ramps stay continuous.
///
/// Fails with an `Audio` error when the schedule is longer than
/// [`MAX_TRACK_SECS`]; the session falls back to silent video in that case.
pub fn synthesize(schedule: &Schedule) -> ProfilmResult<AudioTrack> {
    let total = frame_to_sample(schedule.total_frames(), schedule.fps(), SAMPLE_RATE);
    if total > MAX_TRACK_SECS * u64::from(SAMPLE_RATE) {
        return Err(ProfilmError::audio(format!(
            "schedule runs {:.0}s, past the {MAX_TRACK_SECS}s synthesizer cap",
            schedule.duration_secs()
        )));
    }
    let mut out = vec![0.0f32; total as usize];

    add_drone(&mut out);
    add_sub_pulse(&mut out);
    add_clicks(&mut out, schedule);
    add_tension(&mut out);
    add_noise_floor(&mut out, schedule.seed());

    for s in &mut out {
        *s = s.clamp(-PEAK, PEAK);
    }
    let samples = out.into_iter().map(|s| (s * 32_767.0) as i16).collect();
    Ok(AudioTrack { sample_rate: SAMPLE_RATE, samples })
}

/// Low drone. Frequency and amplitude creep up with progress; a slightly
/// detuned partner thickens it.
fn add_drone(out: &mut [f32]) {
    let n = out.len().max(1) as f64;
    let sr = f64::from(SAMPLE_RATE);
    let mut phase_a = 0.0f64;
    let mut phase_b = 0.0f64;
    for (i, s) in out.iter_mut().enumerate() {
        let p = i as f64 / n;
        let freq = 52.0 + 26.0 * p;
        phase_a += TAU * freq / sr;
        phase_b += TAU * freq * 1.005 / sr;
        let amp = 0.11 + 0.09 * p;
        *s += (amp * phase_a.sin() + 0.4 * amp * phase_b.sin()) as f32;
    }
}

/// A 42 Hz thump every [`PULSE_PERIOD`] seconds, decaying exponentially.
fn add_sub_pulse(out: &mut [f32]) {
    let sr = f64::from(SAMPLE_RATE);
    let mut phase = 0.0f64;
    for (i, s) in out.iter_mut().enumerate() {
        let t = i as f64 / sr;
        phase += TAU * 42.0 / sr;
        let env = (-3.5 * (t % PULSE_PERIOD)).exp();
        *s += (0.08 * env * phase.sin()) as f32;
    }
}

/// One short transient per block transition, louder for weightier blocks.
fn add_clicks(out: &mut [f32], schedule: &Schedule) {
    let sr = f64::from(SAMPLE_RATE);
    let click_samples = (CLICK_LEN * sr) as usize;
    for (frame, importance) in schedule.transitions() {
        let start = frame_to_sample(frame.0, schedule.fps(), SAMPLE_RATE) as usize;
        let gain = 0.2 * importance.click_gain();
        for j in 0..click_samples {
            let Some(s) = out.get_mut(start + j) else { break };
            let t = j as f64 / sr;
            let env = (-48.0 * t).exp();
            *s += (gain * env * (TAU * 660.0 * t).sin()) as f32;
        }
    }
}

/// Rising tone, gated in smoothly once the film passes its halfway point.
fn add_tension(out: &mut [f32]) {
    let n = out.len().max(1) as f64;
    let sr = f64::from(SAMPLE_RATE);
    let mut phase = 0.0f64;
    for (i, s) in out.iter_mut().enumerate() {
        let p = i as f64 / n;
        let gate = ((p - 0.5) / 0.5).clamp(0.0, 1.0);
        let freq = 220.0 + 300.0 * gate;
        phase += TAU * freq / sr;
        if gate <= 0.0 {
            continue;
        }
        let env = gate * gate * (3.0 - 2.0 * gate);
        *s += (0.055 * env * phase.sin()) as f32;
    }
}

/// Seeded white-noise floor, swelling with progress.
fn add_noise_floor(out: &mut [f32], seed: u64) {
    let n = out.len().max(1) as f64;
    let mut rng = Lcg64::new(seed ^ 0xA0D1_05EC);
    for (i, s) in out.iter_mut().enumerate() {
        let p = i as f64 / n;
        let amp = 0.003 + 0.012 * p;
        *s += (amp * (2.0 * rng.next_f64_01() - 1.0)) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Fps;
    use crate::timeline::block::{Block, BlockBody, BlockTag, HoldPolicy, Importance};
    use crate::timeline::schedule::{Schedule, HEAD_PAD};

    const FPS: Fps = Fps { num: 30, den: 1 };

    fn schedule() -> Schedule {
        let blocks = vec![
            Block {
                tag: BlockTag::Intro,
                body: BlockBody::Lines(vec!["a".into()]),
                policy: HoldPolicy::Timed(Importance::Normal),
                hold_frames: 40,
            },
            Block {
                tag: BlockTag::Closing,
                body: BlockBody::Lines(vec!["b".into()]),
                policy: HoldPolicy::Timed(Importance::Linger),
                hold_frames: 80,
            },
        ];
        Schedule::new(blocks, 77, FPS).unwrap()
    }

    #[test]
    fn track_length_matches_schedule() {
        let s = schedule();
        let track = synthesize(&s).unwrap();
        let expected = frame_to_sample(s.total_frames(), FPS, SAMPLE_RATE) as usize;
        assert_eq!(track.samples.len(), expected);
        assert!((track.duration_secs() - s.duration_secs()).abs() < 0.01);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let s = schedule();
        assert_eq!(synthesize(&s).unwrap(), synthesize(&s).unwrap());
    }

    #[test]
    fn overlong_schedule_is_refused() {
        let blocks = vec![Block {
            tag: BlockTag::Intro,
            body: BlockBody::Lines(vec!["a".into()]),
            policy: HoldPolicy::Exact(30 * 3 * 60 * 60),
            hold_frames: 30 * 3 * 60 * 60,
        }];
        let s = Schedule::new(blocks, 1, FPS).unwrap();
        let err = synthesize(&s).unwrap_err();
        assert!(err.is_recoverable(), "cap overrun must stay recoverable: {err}");
    }

    #[test]
    fn samples_stay_under_the_clamp_peak() {
        let track = synthesize(&schedule()).unwrap();
        let limit = (PEAK * 32_767.0) as i16 + 1;
        assert!(track.samples.iter().all(|&s| s.abs() <= limit));
        assert!(track.samples.iter().any(|&s| s != 0));
    }

    #[test]
    fn transitions_add_transient_energy() {
        let s = schedule();
        let track = synthesize(&s).unwrap();
        let onset = frame_to_sample(HEAD_PAD, FPS, SAMPLE_RATE) as usize;
        let window = 800;
        let mean_abs = |range: std::ops::Range<usize>| {
            let sum: f64 = track.samples[range.clone()]
                .iter()
                .map(|&v| f64::from(v).abs())
                .sum();
            sum / range.len() as f64
        };
        let before = mean_abs(onset - window..onset);
        let after = mean_abs(onset..onset + window);
        assert!(after > before, "click should lift energy at the first transition");
    }

    #[test]
    fn frame_to_sample_uses_rational_fps() {
        let ntsc = Fps { num: 30_000, den: 1001 };
        assert_eq!(frame_to_sample(0, ntsc, SAMPLE_RATE), 0);
        let one = frame_to_sample(1, ntsc, SAMPLE_RATE);
        assert!(one > 0);
        // 30 whole frames at 30 fps is exactly one second.
        assert_eq!(frame_to_sample(30, FPS, SAMPLE_RATE), u64::from(SAMPLE_RATE));
    }

    #[test]
    fn writes_two_bytes_per_sample() {
        let track = AudioTrack { sample_rate: SAMPLE_RATE, samples: vec![0, 1, -1, 32_000] };
        let path = std::env::temp_dir().join(format!("profilm-pcm-{}.s16le", std::process::id()));
        track.write_s16le(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[2..4], &1i16.to_le_bytes());
        let _ = std::fs::remove_file(&path);
    }
}
