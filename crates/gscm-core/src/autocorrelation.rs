//! Spatially correlated Gaussian random fields
//!
//! Each field is white N(0, 1) noise filtered by the 2-D exponential kernel
//!
//! ```text
//! h(x, y) = exp(-sqrt(x² + y²) / d)
//! ```
//!
//! truncated at `4.6·d`, where the correlation has dropped below 1 %. The
//! filtering is a linear convolution carried out in the frequency domain
//! and cropped back to the grid ("same" mode). The result is divided by its
//! standard deviation over the interior of the grid, so the declared area
//! sees unit variance.
//!
//! Sampling reads the pixel holding the position, so any two positions in
//! the same pixel read the same value.

use rand::Rng;
use rand_distr::StandardNormal;
use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

use crate::spatial_grid::{SpatialGrid, CORRELATION_CUTOFF};
use crate::types::{erf, GscmError, GscmResult, Point2};

/// One spatially correlated unit-variance Gaussian field
#[derive(Clone)]
pub struct AutoCorrelationField {
    grid: SpatialGrid,
    correlation_distance: Option<f64>,
    values: Vec<f64>,
}

impl fmt::Debug for AutoCorrelationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoCorrelationField")
            .field("rows", &self.grid.rows())
            .field("cols", &self.grid.cols())
            .field("correlation_distance", &self.correlation_distance)
            .finish()
    }
}

impl AutoCorrelationField {
    /// Build one field per entry of `distances`, drawing noise from `rng` in order.
    ///
    /// A `None` entry marks a quantity the scenario does not use and yields an
    /// all-zero field. All distances are validated before any noise is drawn.
    pub fn build<R: Rng + ?Sized>(
        rng: &mut R,
        grid: &SpatialGrid,
        distances: &[Option<f64>],
    ) -> GscmResult<Vec<Self>> {
        for d in distances.iter().flatten() {
            if !(d.is_finite() && *d > 0.0) {
                return Err(GscmError::InvalidCorrelationDistance(*d));
            }
        }

        let mut fields = Vec::with_capacity(distances.len());
        for &d in distances {
            let values = match d {
                Some(d) => correlated_noise(rng, grid, d),
                None => vec![0.0; grid.len()],
            };
            fields.push(Self {
                grid: grid.clone(),
                correlation_distance: d,
                values,
            });
        }
        Ok(fields)
    }

    /// Gaussian value at the pixel holding `pos`
    pub fn sample_normal(&self, pos: &Point2) -> GscmResult<f64> {
        let idx = self.grid.index_of(pos)?;
        Ok(self.values[idx])
    }

    /// U(0, 1) value at `pos` via the probability-integral transform
    pub fn sample_uniform(&self, pos: &Point2) -> GscmResult<f64> {
        let x = self.sample_normal(pos)?;
        Ok(gaussian_to_uniform(x))
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn correlation_distance(&self) -> Option<f64> {
        self.correlation_distance
    }

    /// Raw row-major pixel values
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Φ(x) for a standard normal x, kept inside [0, 1]
#[inline]
pub fn gaussian_to_uniform(x: f64) -> f64 {
    (0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))).clamp(0.0, 1.0)
}

fn correlated_noise<R: Rng + ?Sized>(rng: &mut R, grid: &SpatialGrid, d: f64) -> Vec<f64> {
    let rows = grid.rows();
    let cols = grid.cols();
    let res = grid.resolution();
    let half = (CORRELATION_CUTOFF * d / res).ceil() as usize;
    let ksize = 2 * half + 1;

    let noise: Vec<f64> = (0..rows * cols).map(|_| rng.sample(StandardNormal)).collect();

    let prows = rows + ksize - 1;
    let pcols = cols + ksize - 1;
    let mut fft = Fft2d::new(prows, pcols);

    let mut signal = vec![Complex64::new(0.0, 0.0); prows * pcols];
    for r in 0..rows {
        for c in 0..cols {
            signal[r * pcols + c] = Complex64::new(noise[r * cols + c], 0.0);
        }
    }

    let mut kernel = vec![Complex64::new(0.0, 0.0); prows * pcols];
    for kr in 0..ksize {
        for kc in 0..ksize {
            let dy = kr as f64 - half as f64;
            let dx = kc as f64 - half as f64;
            let r = (dx * dx + dy * dy).sqrt() * res;
            kernel[kr * pcols + kc] = Complex64::new((-r / d).exp(), 0.0);
        }
    }

    fft.forward(&mut signal);
    fft.forward(&mut kernel);
    for (s, k) in signal.iter_mut().zip(kernel.iter()) {
        *s *= k;
    }
    fft.inverse(&mut signal);

    let mut values = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            values.push(signal[(r + half) * pcols + c + half].re);
        }
    }

    let std = interior_std(grid, &values);
    if std > 0.0 {
        for v in values.iter_mut() {
            *v /= std;
        }
    }
    tracing::trace!(rows, cols, half_size = half, distance = d, std, "built correlated field");
    values
}

/// Standard deviation over the pixels outside the margin band
fn interior_std(grid: &SpatialGrid, values: &[f64]) -> f64 {
    let cols = grid.cols();
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for (idx, &v) in values.iter().enumerate() {
        if grid.is_interior(idx / cols, idx % cols) {
            n += 1;
            sum += v;
            sum_sq += v * v;
        }
    }
    if n < 2 {
        return 0.0;
    }
    let mean = sum / n as f64;
    (sum_sq / n as f64 - mean * mean).max(0.0).sqrt()
}

/// Separable 2-D FFT over a row-major buffer
struct Fft2d {
    rows: usize,
    cols: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    transposed: Vec<Complex64>,
}

impl Fft2d {
    fn new(rows: usize, cols: usize) -> Self {
        let mut planner = FftPlanner::new();
        let row_forward = planner.plan_fft_forward(cols);
        let row_inverse = planner.plan_fft_inverse(cols);
        let col_forward = planner.plan_fft_forward(rows);
        let col_inverse = planner.plan_fft_inverse(rows);
        let scratch_len = [&row_forward, &row_inverse, &col_forward, &col_inverse]
            .iter()
            .map(|p| p.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Self {
            rows,
            cols,
            row_forward,
            row_inverse,
            col_forward,
            col_inverse,
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
            transposed: vec![Complex64::new(0.0, 0.0); rows * cols],
        }
    }

    fn forward(&mut self, buffer: &mut [Complex64]) {
        let (row, col) = (self.row_forward.clone(), self.col_forward.clone());
        self.process(buffer, row.as_ref(), col.as_ref());
    }

    /// Inverse transform, normalised by the buffer size
    fn inverse(&mut self, buffer: &mut [Complex64]) {
        let (row, col) = (self.row_inverse.clone(), self.col_inverse.clone());
        self.process(buffer, row.as_ref(), col.as_ref());
        let scale = 1.0 / (self.rows * self.cols) as f64;
        for v in buffer.iter_mut() {
            *v *= scale;
        }
    }

    fn process(&mut self, buffer: &mut [Complex64], row_fft: &dyn Fft<f64>, col_fft: &dyn Fft<f64>) {
        // rustfft transforms every consecutive chunk of the plan length
        row_fft.process_with_scratch(buffer, &mut self.scratch);
        transpose(buffer, &mut self.transposed, self.rows, self.cols);
        col_fft.process_with_scratch(&mut self.transposed, &mut self.scratch);
        transpose(&self.transposed, buffer, self.cols, self.rows);
    }
}

fn transpose(src: &[Complex64], dst: &mut [Complex64], rows: usize, cols: usize) {
    for r in 0..rows {
        for c in 0..cols {
            dst[c * rows + r] = src[r * cols + c];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(dmax: f64) -> SpatialGrid {
        SpatialGrid::rasterize([-200.0, -200.0], [200.0, 200.0], 5.0, dmax).unwrap()
    }

    #[test]
    fn test_unit_variance_over_interior() {
        let g = grid(10.0);
        let mut rng = StdRng::seed_from_u64(7);
        let field = &AutoCorrelationField::build(&mut rng, &g, &[Some(10.0)]).unwrap()[0];

        let mut samples = Vec::new();
        let mut y = -195.0;
        while y < 200.0 {
            let mut x = -195.0;
            while x < 200.0 {
                samples.push(field.sample_normal(&[x, y]).unwrap());
                x += 5.0;
            }
            y += 5.0;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!((var.sqrt() - 1.0).abs() < 0.1, "std = {}", var.sqrt());
    }

    #[test]
    fn test_uniform_in_unit_interval() {
        let g = grid(20.0);
        let mut rng = StdRng::seed_from_u64(1);
        let field = &AutoCorrelationField::build(&mut rng, &g, &[Some(20.0)]).unwrap()[0];
        for i in 0..200 {
            let pos = [-190.0 + 1.9 * i as f64, 150.0 - 1.7 * i as f64];
            let u = field.sample_uniform(&pos).unwrap();
            assert!((0.0..=1.0).contains(&u));
        }
    }

    #[test]
    fn test_neighbours_correlated() {
        let g = grid(50.0);
        let mut rng = StdRng::seed_from_u64(3);
        let field = &AutoCorrelationField::build(&mut rng, &g, &[Some(50.0)]).unwrap()[0];
        let mut near = 0.0;
        let mut power = 0.0;
        for i in 0..60 {
            let p = [-150.0 + 5.0 * i as f64, 0.0];
            let q = [p[0] + 5.0, 0.0];
            let a = field.sample_normal(&p).unwrap();
            let b = field.sample_normal(&q).unwrap();
            near += a * b;
            power += a * a;
        }
        // exp(-5/50) ≈ 0.9 for adjacent pixels
        assert!(near / power > 0.6);
    }

    #[test]
    fn test_batched_fields_independent() {
        let g = grid(10.0);
        let mut rng = StdRng::seed_from_u64(11);
        let fields = AutoCorrelationField::build(&mut rng, &g, &[Some(10.0), Some(10.0)]).unwrap();
        assert_eq!(fields.len(), 2);
        assert_ne!(fields[0].values(), fields[1].values());
    }

    #[test]
    fn test_inapplicable_field_is_zero() {
        let g = grid(10.0);
        let mut rng = StdRng::seed_from_u64(0);
        let fields = AutoCorrelationField::build(&mut rng, &g, &[None]).unwrap();
        assert_eq!(fields[0].sample_normal(&[0.0, 0.0]).unwrap(), 0.0);
        assert_eq!(fields[0].sample_uniform(&[0.0, 0.0]).unwrap(), 0.5);
    }

    #[test]
    fn test_invalid_distance_rejected() {
        let g = grid(10.0);
        let mut rng = StdRng::seed_from_u64(0);
        let err = AutoCorrelationField::build(&mut rng, &g, &[Some(10.0), Some(f64::NAN)]).unwrap_err();
        assert!(matches!(err, GscmError::InvalidCorrelationDistance(_)));
        assert!(AutoCorrelationField::build(&mut rng, &g, &[Some(0.0)]).is_err());
    }

    #[test]
    fn test_same_seed_same_field() {
        let g = grid(10.0);
        let a = AutoCorrelationField::build(&mut StdRng::seed_from_u64(5), &g, &[Some(10.0)]).unwrap();
        let b = AutoCorrelationField::build(&mut StdRng::seed_from_u64(5), &g, &[Some(10.0)]).unwrap();
        assert_eq!(a[0].values(), b[0].values());
    }

    #[test]
    fn test_out_of_grid_sample() {
        let g = grid(10.0);
        let mut rng = StdRng::seed_from_u64(0);
        let field = &AutoCorrelationField::build(&mut rng, &g, &[Some(10.0)]).unwrap()[0];
        assert!(field.sample_normal(&[5000.0, 0.0]).is_err());
    }
}
