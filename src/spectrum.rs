//! Narrow-band spectral transform of a sampled signal

use rustfft::{num_complex::Complex, FftPlanner};

#[derive(thiserror::Error, Debug)]
pub enum SpectrumError {
    #[error("cannot transform an empty signal")]
    EmptySignal,
    #[error("a {0} sample signal has no positive-frequency bin")]
    ShortSignal(usize),
    #[error("sampling rate {0} is not strictly positive")]
    BadSamplingRate(f64),
}

/// One-sided normalized amplitude spectrum
///
/// The FFT output is scaled by `1/n` and only the strictly-positive frequency
/// bins are kept: no DC term and, for even signal lengths, no Nyquist bin.
/// A pure sine of amplitude `A` therefore shows up with amplitude `A/2`.
#[derive(Debug)]
pub struct Spectrum {
    frequency: Vec<f64>,
    amplitude: Vec<f64>,
}
impl Spectrum {
    /// Transforms a signal sampled at `sampling_rate` points per unit time
    ///
    /// e.g. a sampling rate of 365 on a year of daily means resolves
    /// frequencies in cycles per year.
    pub fn new(signal: &[f64], sampling_rate: f64) -> Result<Self, SpectrumError> {
        if signal.is_empty() {
            return Err(SpectrumError::EmptySignal);
        }
        // 1 and 2 sample signals only carry DC (and Nyquist) content
        if signal.len() < 3 {
            return Err(SpectrumError::ShortSignal(signal.len()));
        }
        if !(sampling_rate > 0.) {
            return Err(SpectrumError::BadSamplingRate(sampling_rate));
        }
        let n = signal.len();
        let mut buffer: Vec<Complex<f64>> =
            signal.iter().map(|&x| Complex::new(x, 0.)).collect();
        FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

        let half = (n - 1) / 2;
        let df = sampling_rate / n as f64;
        let frequency = (1..=half).map(|k| k as f64 * df).collect();
        let amplitude = (1..=half).map(|k| buffer[k].norm() / n as f64).collect();
        Ok(Self {
            frequency,
            amplitude,
        })
    }
    pub fn frequency(&self) -> &[f64] {
        &self.frequency
    }
    pub fn amplitude(&self) -> &[f64] {
        &self.amplitude
    }
    pub fn len(&self) -> usize {
        self.frequency.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }
    /// Iterator over the (frequency, amplitude) bins
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequency
            .iter()
            .copied()
            .zip(self.amplitude.iter().copied())
    }
    /// The (frequency, amplitude) of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter()
            .fold(None, |peak: Option<(f64, f64)>, bin| match peak {
                Some(p) if p.1 >= bin.1 => Some(p),
                _ => Some(bin),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f64::consts::TAU;

    fn sine(n: usize, fs: f64, f0: f64, a: f64) -> Vec<f64> {
        (0..n).map(|t| a * (TAU * f0 * t as f64 / fs).sin()).collect()
    }

    #[test]
    fn empty_and_bad_rate() {
        assert!(matches!(
            Spectrum::new(&[], 1.),
            Err(SpectrumError::EmptySignal)
        ));
        assert!(matches!(
            Spectrum::new(&[1., 2., 3.], 0.),
            Err(SpectrumError::BadSamplingRate(_))
        ));
    }

    #[test]
    fn short_signal() {
        assert!(matches!(
            Spectrum::new(&[1.], 1.),
            Err(SpectrumError::ShortSignal(1))
        ));
        assert!(matches!(
            Spectrum::new(&[1., 2.], 1.),
            Err(SpectrumError::ShortSignal(2))
        ));
        // 3 samples is the shortest signal with a positive-frequency bin
        let spectrum = Spectrum::new(&[1., 2., 3.], 3.).unwrap();
        assert_eq!(spectrum.len(), 1);
        assert!(spectrum.peak().is_some());
    }

    #[test]
    fn pure_sine_peak() {
        let spectrum = Spectrum::new(&sine(64, 64., 5., 2.), 64.).unwrap();
        // one-sided without DC and Nyquist
        assert_eq!(spectrum.len(), 31);
        assert_eq!(spectrum.frequency()[0], 1.);
        let (f0, a) = spectrum.peak().unwrap();
        assert!((f0 - 5.).abs() < 1e-12);
        assert!((a - 1.).abs() < 1e-9);
    }

    #[test]
    fn noisy_sine_peak() {
        let mut rng = StdRng::seed_from_u64(42);
        let signal: Vec<f64> = sine(256, 32., 4., 1.)
            .into_iter()
            .map(|x| x + rng.gen_range(-0.05..0.05))
            .collect();
        let spectrum = Spectrum::new(&signal, 32.).unwrap();
        let (f0, _) = spectrum.peak().unwrap();
        assert!((f0 - 4.).abs() < 1e-9);
    }
}
