//! Interfaces towards the multipath executor
//!
//! The registry only prepares per-cluster delay filters; applying them to
//! waveforms and computing array responses belong to the simulator.

use gscm_core::Complex;
use std::f64::consts::PI;

use crate::node::ArrayDescription;

/// Builds the delay filters the executor convolves each cluster with
pub trait ChannelExecutor {
    /// One causal filter per delay, taps at the executor sample rate
    fn path_filters(&self, delays_s: &[f64]) -> Vec<Vec<f64>>;
}

/// Complex field response of an antenna array towards a direction
pub trait ArrayFieldResponse {
    fn field(&self, array: &ArrayDescription, azimuth_deg: f64, zenith_deg: f64) -> Complex;
}

/// Hann-windowed sinc fractional-delay filters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SincPathFilter {
    sample_rate_hz: f64,
    half_length: usize,
}

impl SincPathFilter {
    pub fn new(sample_rate_hz: f64, half_length: usize) -> Self {
        Self {
            sample_rate_hz,
            half_length: half_length.max(1),
        }
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    /// Taps `h[k] = sinc(k − τ·fs) · w(k − τ·fs)` for `k = 0 ..= ⌊τ·fs⌋ + L`
    pub fn filter(&self, delay_s: f64) -> Vec<f64> {
        let centre = delay_s.max(0.0) * self.sample_rate_hz;
        let half = self.half_length as f64;
        let len = centre.floor() as usize + self.half_length + 1;
        (0..len)
            .map(|k| {
                let x = k as f64 - centre;
                if x.abs() >= half {
                    0.0
                } else {
                    sinc(x) * 0.5 * (1.0 + (PI * x / half).cos())
                }
            })
            .collect()
    }
}

impl ChannelExecutor for SincPathFilter {
    fn path_filters(&self, delays_s: &[f64]) -> Vec<Vec<f64>> {
        delays_s.iter().map(|&d| self.filter(d)).collect()
    }
}

#[inline]
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Unit gain in every direction
#[derive(Debug, Clone, Copy, Default)]
pub struct IsotropicArray;

impl ArrayFieldResponse for IsotropicArray {
    fn field(&self, _array: &ArrayDescription, _azimuth_deg: f64, _zenith_deg: f64) -> Complex {
        Complex::new(1.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_delay_is_a_unit_tap() {
        let filter = SincPathFilter::new(1.0, 4);
        let taps = filter.filter(3.0);
        assert_eq!(taps.len(), 3 + 4 + 1);
        for (k, &h) in taps.iter().enumerate() {
            if k == 3 {
                assert!((h - 1.0).abs() < 1e-12);
            } else {
                assert!(h.abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_fractional_delay_peaks_nearby() {
        let filter = SincPathFilter::new(1.0, 8);
        let taps = filter.filter(5.4);
        let peak = taps
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 5);
        let dc: f64 = taps.iter().sum();
        assert!((dc - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_one_filter_per_delay() {
        let filter = SincPathFilter::new(30.72e6, 8);
        let filters = filter.path_filters(&[0.0, 1e-7, 5e-7]);
        assert_eq!(filters.len(), 3);
        assert!(filters[2].len() > filters[0].len());
    }

    #[test]
    fn test_isotropic() {
        let f = IsotropicArray.field(&ArrayDescription::default(), 30.0, 90.0);
        assert_eq!(f, Complex::new(1.0, 0.0));
    }
}
