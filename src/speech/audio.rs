// ============================================================
// Layer 7 — Audio Front End
// ============================================================
// WAV decoding, resampling, and log-mel spectrograms for the
// speech recognizer.
//
// The mel pipeline follows the Whisper reference front end:
//   - 16 kHz mono input
//   - 400-sample Hann-windowed FFT frames, hop 160
//   - triangular mel filterbank over the power spectrum
//   - log10, floor at peak - 8, then (x + 4) / 4

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Sample rate the speech model expects.
pub const SAMPLE_RATE: u32 = 16_000;

/// FFT window size in samples (25 ms at 16 kHz).
pub const N_FFT: usize = 400;

/// Hop length between frames (10 ms at 16 kHz).
pub const HOP_LENGTH: usize = 160;

/// Samples per 30 second model window.
pub const SEGMENT_SAMPLES: usize = 30 * SAMPLE_RATE as usize;

// ─── WAV Loading ──────────────────────────────────────────────────────────────

/// Decode a WAV file to mono f32 samples in [-1, 1].
///
/// Returns the samples together with the file's native sample rate.
/// Integer formats are normalised by their bit width; multi-channel
/// audio is mixed down by averaging each frame.
pub fn load_wav(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32)> {
    let path = path.as_ref();

    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Cannot read WAV file '{}'", path.display()))?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        bail!("WAV file '{}' declares a sample rate of 0", path.display());
    }
    if spec.channels == 0 {
        bail!("WAV file '{}' declares 0 channels", path.display());
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Corrupt sample data in '{}'", path.display()))?
        }
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Corrupt sample data in '{}'", path.display()))?,
    };

    // Mix down to mono
    let channels = spec.channels as usize;
    let samples: Vec<f32> = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        samples
    };

    if samples.is_empty() {
        bail!("WAV file '{}' contains no samples", path.display());
    }

    Ok((samples, spec.sample_rate))
}

// ─── Resampling ───────────────────────────────────────────────────────────────

/// Resample mono audio to the target rate with rubato's FFT resampler.
///
/// The last chunk is zero padded to the resampler's fixed input size,
/// so the output is trimmed back to the rate-scaled length.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    use rubato::{FftFixedInOut, Resampler};

    let mut resampler = FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, 1024, 1)
        .map_err(|e| anyhow!("Cannot build {} Hz -> {} Hz resampler: {}", from_rate, to_rate, e))?;

    let chunk_size = resampler.input_frames_max();
    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut output = Vec::with_capacity(expected + chunk_size);

    for chunk in samples.chunks(chunk_size) {
        let mut padded = chunk.to_vec();
        if padded.len() < chunk_size {
            padded.resize(chunk_size, 0.0);
        }

        let mut frames = resampler
            .process(&[padded], None)
            .map_err(|e| anyhow!("Resampling failed: {}", e))?;
        output.append(&mut frames.remove(0));
    }

    output.truncate(expected);
    Ok(output)
}

/// Pad or truncate samples to exactly one 30 second model window.
pub fn pad_segment(samples: &[f32]) -> Vec<f32> {
    let mut padded = vec![0.0f32; SEGMENT_SAMPLES];
    let len = samples.len().min(SEGMENT_SAMPLES);
    padded[..len].copy_from_slice(&samples[..len]);
    padded
}

// ─── Mel Spectrogram ──────────────────────────────────────────────────────────

/// Log-mel front end with a cached FFT plan, Hann window, and
/// triangular filterbank, reused across files.
pub struct MelFrontend {
    fft:     Arc<dyn Fft<f32>>,
    window:  Vec<f32>,
    filters: Vec<f32>,
    n_mels:  usize,
    n_freqs: usize,
}

impl MelFrontend {
    pub fn new(n_mels: usize) -> Self {
        let n_freqs = N_FFT / 2 + 1;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(N_FFT);

        let window: Vec<f32> = (0..N_FFT)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (N_FFT - 1) as f32).cos())
            })
            .collect();

        let filters = mel_filterbank(SAMPLE_RATE, N_FFT, n_mels);

        Self { fft, window, filters, n_mels, n_freqs }
    }

    /// Compute the log-mel spectrogram of one sample window.
    ///
    /// Returns a row-major [n_mels, n_frames] buffer and the frame
    /// count. A full 30 second window yields exactly 3000 frames.
    pub fn log_mel(&self, samples: &[f32]) -> Result<(Vec<f32>, usize)> {
        if samples.is_empty() {
            bail!("cannot compute a mel spectrogram of empty audio");
        }

        let n_frames = (samples.len() / HOP_LENGTH).max(1);
        let mut fft_buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); N_FFT];
        let mut mel = vec![0.0f32; self.n_mels * n_frames];

        for frame in 0..n_frames {
            let start = frame * HOP_LENGTH;
            let end = (start + N_FFT).min(samples.len());

            for i in 0..N_FFT {
                let sample = if start + i < end { samples[start + i] } else { 0.0 };
                fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut fft_buffer);

            for m in 0..self.n_mels {
                let mut energy = 0.0f32;
                for k in 0..self.n_freqs {
                    let c = fft_buffer[k];
                    let power = c.re * c.re + c.im * c.im;
                    energy += power * self.filters[m * self.n_freqs + k];
                }
                mel[m * n_frames + frame] = energy.max(1e-10).log10();
            }
        }

        // Dynamic range compression: floor 8 dB below the peak, then
        // shift into roughly [-1, 1]
        let peak = mel.iter().cloned().fold(f32::MIN, f32::max);
        for v in mel.iter_mut() {
            *v = ((*v).max(peak - 8.0) + 4.0) / 4.0;
        }

        Ok((mel, n_frames))
    }
}

/// Triangular mel filterbank, row-major [n_mels, n_fft/2 + 1].
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<f32> {
    let n_freqs = n_fft / 2 + 1;

    let hz_to_mel = |hz: f32| -> f32 { 2595.0 * (1.0 + hz / 700.0).log10() };
    let mel_to_hz = |mel: f32| -> f32 { 700.0 * (10.0f32.powf(mel / 2595.0) - 1.0) };

    let mel_low = hz_to_mel(0.0);
    let mel_high = hz_to_mel(sample_rate as f32 / 2.0);

    // Evenly spaced points on the mel scale, back to FFT bins
    let bin_points: Vec<usize> = (0..=n_mels + 1)
        .map(|i| mel_low + (mel_high - mel_low) * i as f32 / (n_mels + 1) as f32)
        .map(|m| mel_to_hz(m))
        .map(|hz| ((n_fft + 1) as f32 * hz / sample_rate as f32).floor() as usize)
        .collect();

    let mut filterbank = vec![0.0f32; n_mels * n_freqs];

    for m in 0..n_mels {
        let left = bin_points[m];
        let center = bin_points[m + 1];
        let right = bin_points[m + 2];

        for k in left..center {
            if k < n_freqs && center > left {
                filterbank[m * n_freqs + k] = (k - left) as f32 / (center - left) as f32;
            }
        }
        for k in center..right {
            if k < n_freqs && right > center {
                filterbank[m * n_freqs + k] = (right - k) as f32 / (right - center) as f32;
            }
        }
    }

    filterbank
}
