//! Linear-phase FIR crossover filters
//!
//! Windowed-sinc (Hamming) lowpass kernels with an odd, symmetric tap
//! count; the matching highpass is derived by spectral inversion so the
//! pair is exactly complementary: `lowpass + highpass` equals the input
//! delayed by the shared group delay of `(taps - 1) / 2` samples. The
//! only phase effect at any frequency is that constant delay.
//!
//! Convolution is FFT overlap-add via realfft — direct convolution over
//! tens of minutes of material is not viable.

use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

use st_core::Sample;

use crate::error::{DspError, DspResult};

/// Filter response type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Lowpass,
    Highpass,
}

/// Fully determines a linear-phase FIR kernel at a given sample rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Crossover cutoff (Hz)
    pub cutoff_hz: f64,
    /// Tap count; even values are rounded up to odd at design time
    pub taps: usize,
    /// Lowpass or highpass
    pub kind: FilterKind,
}

impl FilterSpec {
    pub fn lowpass(cutoff_hz: f64, taps: usize) -> Self {
        Self {
            cutoff_hz,
            taps,
            kind: FilterKind::Lowpass,
        }
    }

    pub fn highpass(cutoff_hz: f64, taps: usize) -> Self {
        Self {
            cutoff_hz,
            taps,
            kind: FilterKind::Highpass,
        }
    }

    /// Effective (odd) tap count after design-time rounding
    pub fn odd_taps(&self) -> usize {
        if self.taps % 2 == 0 {
            self.taps + 1
        } else {
            self.taps
        }
    }

    /// Constant delay the kernel imposes, in samples
    pub fn group_delay(&self) -> usize {
        (self.odd_taps() - 1) / 2
    }
}

/// Designed FIR filter, ready to apply
#[derive(Debug, Clone)]
pub struct FirFilter {
    spec: FilterSpec,
    kernel: Vec<Sample>,
}

impl FirFilter {
    /// Design a kernel for the spec. Fails with `InvalidCutoff` if the
    /// cutoff is not strictly between 0 and Nyquist.
    pub fn design(spec: FilterSpec, sample_rate: u32) -> DspResult<Self> {
        let nyquist = sample_rate as f64 / 2.0;
        if spec.cutoff_hz <= 0.0 || spec.cutoff_hz >= nyquist {
            return Err(DspError::InvalidCutoff {
                cutoff_hz: spec.cutoff_hz,
                nyquist_hz: nyquist,
            });
        }

        let taps = spec.odd_taps();
        let mut kernel = windowed_sinc_lowpass(spec.cutoff_hz, sample_rate, taps);

        if spec.kind == FilterKind::Highpass {
            // Spectral inversion: hp = delayed impulse - lp, which makes
            // the low/high pair sum exactly to a pure delay.
            for c in kernel.iter_mut() {
                *c = -*c;
            }
            kernel[(taps - 1) / 2] += 1.0;
        }

        Ok(Self { spec, kernel })
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn kernel(&self) -> &[Sample] {
        &self.kernel
    }

    /// Group delay in samples
    pub fn group_delay(&self) -> usize {
        self.spec.group_delay()
    }

    /// Filter, preserving input length. The output carries the kernel's
    /// group delay; the caller must compensate before recombining bands.
    pub fn apply(&self, input: &[Sample]) -> DspResult<Vec<Sample>> {
        let mut full = self.convolve(input)?;
        full.truncate(input.len());
        Ok(full)
    }

    /// Filter and remove the group delay, so outputs of equal-tap
    /// filters line up with the dry signal and with each other.
    pub fn apply_aligned(&self, input: &[Sample]) -> DspResult<Vec<Sample>> {
        let full = self.convolve(input)?;
        let gd = self.group_delay();
        Ok(full[gd..gd + input.len()].to_vec())
    }

    /// Full linear convolution (len = input + taps - 1), overlap-add
    fn convolve(&self, input: &[Sample]) -> DspResult<Vec<Sample>> {
        let taps = self.kernel.len();
        let mut out = vec![0.0; input.len() + taps - 1];
        if input.is_empty() {
            return Ok(out);
        }

        let fft_len = (taps * 4).next_power_of_two().max(256);
        let block = fft_len - taps + 1;

        let mut planner = RealFftPlanner::<f64>::new();
        let fwd = planner.plan_fft_forward(fft_len);
        let inv = planner.plan_fft_inverse(fft_len);

        // Kernel spectrum, computed once per call
        let mut time = fwd.make_input_vec();
        time[..taps].copy_from_slice(&self.kernel);
        let mut kernel_spec = fwd.make_output_vec();
        fwd.process(&mut time, &mut kernel_spec)
            .map_err(|e| DspError::Fft(e.to_string()))?;

        let mut spec = fwd.make_output_vec();
        let mut segment = inv.make_output_vec();
        let scale = 1.0 / fft_len as f64;

        let mut start = 0;
        while start < input.len() {
            let end = (start + block).min(input.len());

            time.fill(0.0);
            time[..end - start].copy_from_slice(&input[start..end]);
            fwd.process(&mut time, &mut spec)
                .map_err(|e| DspError::Fft(e.to_string()))?;

            for (s, k) in spec.iter_mut().zip(&kernel_spec) {
                *s *= k;
            }
            inv.process(&mut spec, &mut segment)
                .map_err(|e| DspError::Fft(e.to_string()))?;

            let seg_len = (end - start) + taps - 1;
            for (i, &v) in segment[..seg_len].iter().enumerate() {
                out[start + i] += v * scale;
            }
            start = end;
        }

        Ok(out)
    }
}

/// Two-way crossover: complementary lowpass/highpass pair at one cutoff
#[derive(Debug, Clone)]
pub struct Crossover {
    lowpass: FirFilter,
    highpass: FirFilter,
}

impl Crossover {
    pub fn new(cutoff_hz: f64, sample_rate: u32, taps: usize) -> DspResult<Self> {
        Ok(Self {
            lowpass: FirFilter::design(FilterSpec::lowpass(cutoff_hz, taps), sample_rate)?,
            highpass: FirFilter::design(FilterSpec::highpass(cutoff_hz, taps), sample_rate)?,
        })
    }

    /// Split into phase-aligned (low, high) bands that sum back to the
    /// input within numeric tolerance.
    pub fn split(&self, input: &[Sample]) -> DspResult<(Vec<Sample>, Vec<Sample>)> {
        Ok((
            self.lowpass.apply_aligned(input)?,
            self.highpass.apply_aligned(input)?,
        ))
    }

    pub fn lowpass(&self) -> &FirFilter {
        &self.lowpass
    }

    pub fn highpass(&self) -> &FirFilter {
        &self.highpass
    }

    pub fn group_delay(&self) -> usize {
        self.lowpass.group_delay()
    }
}

/// Hamming-windowed sinc lowpass kernel with unity DC gain
fn windowed_sinc_lowpass(cutoff_hz: f64, sample_rate: u32, taps: usize) -> Vec<Sample> {
    use std::f64::consts::PI;

    let mid = (taps - 1) as f64 / 2.0;
    let fc = cutoff_hz / sample_rate as f64;

    let mut kernel = vec![0.0; taps];
    for (i, c) in kernel.iter_mut().enumerate() {
        let n = i as f64 - mid;
        let sinc = if n.abs() < 1e-9 {
            2.0 * fc
        } else {
            (2.0 * PI * fc * n).sin() / (PI * n)
        };
        let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / (taps as f64 - 1.0)).cos();
        *c = sinc * window;
    }

    let sum: f64 = kernel.iter().sum();
    for c in kernel.iter_mut() {
        *c /= sum;
    }
    kernel
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SR: u32 = 48_000;

    fn sine(freq: f64, frames: usize) -> Vec<Sample> {
        (0..frames)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / SR as f64).sin())
            .collect()
    }

    fn rms(x: &[Sample]) -> f64 {
        (x.iter().map(|s| s * s).sum::<f64>() / x.len() as f64).sqrt()
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        assert!(matches!(
            FirFilter::design(FilterSpec::lowpass(0.0, 129), SR),
            Err(DspError::InvalidCutoff { .. })
        ));
        assert!(matches!(
            FirFilter::design(FilterSpec::lowpass(-80.0, 129), SR),
            Err(DspError::InvalidCutoff { .. })
        ));
        assert!(matches!(
            FirFilter::design(FilterSpec::lowpass(24_000.0, 129), SR),
            Err(DspError::InvalidCutoff { .. })
        ));
    }

    #[test]
    fn test_even_taps_rounded_up() {
        let f = FirFilter::design(FilterSpec::lowpass(80.0, 128), SR).unwrap();
        assert_eq!(f.kernel().len(), 129);
        assert_eq!(f.group_delay(), 64);
    }

    #[test]
    fn test_kernel_is_symmetric_linear_phase() {
        let f = FirFilter::design(FilterSpec::lowpass(500.0, 129), SR).unwrap();
        let k = f.kernel();
        for i in 0..k.len() / 2 {
            assert_abs_diff_eq!(k[i], k[k.len() - 1 - i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_bands_reconstruct_after_alignment() {
        let xo = Crossover::new(80.0, SR, 129).unwrap();
        let input = sine(55.0, 4096)
            .iter()
            .zip(sine(1000.0, 4096))
            .map(|(a, b)| a + 0.5 * b)
            .collect::<Vec<_>>();

        let (low, high) = xo.split(&input).unwrap();
        for i in 0..input.len() {
            assert_abs_diff_eq!(low[i] + high[i], input[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_output_length_preserved() {
        let f = FirFilter::design(FilterSpec::highpass(80.0, 257), SR).unwrap();
        let input = sine(440.0, 1000);
        assert_eq!(f.apply(&input).unwrap().len(), 1000);
        assert_eq!(f.apply_aligned(&input).unwrap().len(), 1000);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequency() {
        let f = FirFilter::design(FilterSpec::lowpass(80.0, 257), SR).unwrap();
        let out = f.apply_aligned(&sine(2000.0, 8192)).unwrap();
        // Hamming stopband is ~-53 dB; allow a margin
        assert!(rms(&out) < 0.01, "stopband leakage too high: {}", rms(&out));
    }

    #[test]
    fn test_highpass_passes_high_frequency() {
        let f = FirFilter::design(FilterSpec::highpass(80.0, 257), SR).unwrap();
        let out = f.apply_aligned(&sine(2000.0, 8192)).unwrap();
        assert!((rms(&out) - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.02);
    }
}
