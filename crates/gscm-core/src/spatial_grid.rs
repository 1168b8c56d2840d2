//! Fixed-resolution pixel grid over the deployment plane
//!
//! The grid covers the declared scenario extents plus a margin wide enough
//! for the longest exponential correlation to decay below 1 %:
//!
//! ```text
//!   anchor = min - margin
//!     +-------------------------------+
//!     |   margin band                 |
//!     |     +-------------------+     |
//!     |     |  declared extents |     |
//!     |     +-------------------+     |
//!     |                               |
//!     +-------------------------------+
//! ```
//!
//! Every position lookup goes through [`SpatialGrid::to_pixel`].

use crate::types::{GscmError, GscmResult, Point2};

/// Grid resolution in metres
pub const GRID_RESOLUTION_M: f64 = 5.0;

/// Multiple of the correlation distance beyond which exp(-r/d) < 1 %
pub const CORRELATION_CUTOFF: f64 = 4.6;

/// Rasterized deployment area
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    min: Point2,
    max: Point2,
    anchor: Point2,
    resolution: f64,
    rows: usize,
    cols: usize,
    margin_px: usize,
}

impl SpatialGrid {
    /// Rasterize `[min, max]` with a margin derived from the longest
    /// correlation distance of the fields that will live on the grid.
    pub fn rasterize(
        min: Point2,
        max: Point2,
        resolution: f64,
        max_correlation_distance: f64,
    ) -> GscmResult<Self> {
        let finite = min.iter().chain(max.iter()).all(|v| v.is_finite());
        if !finite || max[0] <= min[0] || max[1] <= min[1] {
            return Err(GscmError::EmptyExtents(format!(
                "min ({:.2}, {:.2}) max ({:.2}, {:.2})",
                min[0], min[1], max[0], max[1]
            )));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(GscmError::Config(format!("grid resolution must be positive, got {resolution}")));
        }
        if !(max_correlation_distance.is_finite() && max_correlation_distance > 0.0) {
            return Err(GscmError::InvalidCorrelationDistance(max_correlation_distance));
        }

        let margin_px = (CORRELATION_CUTOFF * max_correlation_distance / resolution).ceil() as usize;
        let margin = margin_px as f64 * resolution;
        let anchor = [min[0] - margin, min[1] - margin];

        let inner_cols = ((max[0] - min[0]) / resolution).floor() as usize + 1;
        let inner_rows = ((max[1] - min[1]) / resolution).floor() as usize + 1;

        Ok(Self {
            min,
            max,
            anchor,
            resolution,
            rows: inner_rows + 2 * margin_px,
            cols: inner_cols + 2 * margin_px,
            margin_px,
        })
    }

    /// Pixel `(row, col)` holding `pos`; row runs along y, col along x.
    pub fn to_pixel(&self, pos: &Point2) -> GscmResult<(usize, usize)> {
        let col = ((pos[0] - self.anchor[0]) / self.resolution).floor();
        let row = ((pos[1] - self.anchor[1]) / self.resolution).floor();
        if !(col >= 0.0 && row >= 0.0 && (col as usize) < self.cols && (row as usize) < self.rows) {
            return Err(GscmError::OutOfBoundary { x: pos[0], y: pos[1] });
        }
        Ok((row as usize, col as usize))
    }

    /// Row-major linear index of the pixel holding `pos`
    pub fn index_of(&self, pos: &Point2) -> GscmResult<usize> {
        let (row, col) = self.to_pixel(pos)?;
        Ok(row * self.cols + col)
    }

    /// Whether `pos` lies inside the declared extents (margin excluded)
    pub fn contains(&self, pos: &Point2) -> bool {
        pos[0] >= self.min[0] && pos[0] <= self.max[0] && pos[1] >= self.min[1] && pos[1] <= self.max[1]
    }

    /// Fail with [`GscmError::OutOfBoundary`] unless `pos` is inside the declared extents
    pub fn check_boundary(&self, pos: &Point2) -> GscmResult<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(GscmError::OutOfBoundary { x: pos[0], y: pos[1] })
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn anchor(&self) -> Point2 {
        self.anchor
    }

    /// Margin width in pixels on each side
    pub fn margin_px(&self) -> usize {
        self.margin_px
    }

    /// Declared extents `(min, max)`
    pub fn extents(&self) -> (Point2, Point2) {
        (self.min, self.max)
    }

    /// Whether pixel `(row, col)` lies outside the margin band
    pub fn is_interior(&self, row: usize, col: usize) -> bool {
        row >= self.margin_px
            && col >= self.margin_px
            && row < self.rows - self.margin_px
            && col < self.cols - self.margin_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_rounded_to_resolution() {
        // 4.6 * 12 / 5 = 11.04 -> 12 pixels -> 60 m
        let grid = SpatialGrid::rasterize([0.0, 0.0], [100.0, 50.0], 5.0, 12.0).unwrap();
        assert_eq!(grid.margin_px(), 12);
        assert_eq!(grid.anchor(), [-60.0, -60.0]);
        assert_eq!(grid.cols(), 21 + 24);
        assert_eq!(grid.rows(), 11 + 24);
    }

    #[test]
    fn test_to_pixel_floor() {
        let grid = SpatialGrid::rasterize([0.0, 0.0], [100.0, 100.0], 5.0, 10.0).unwrap();
        let m = grid.margin_px();
        assert_eq!(grid.to_pixel(&[0.0, 0.0]).unwrap(), (m, m));
        assert_eq!(grid.to_pixel(&[4.99, 9.99]).unwrap(), (m + 1, m));
        assert_eq!(grid.to_pixel(&[5.0, 0.0]).unwrap(), (m, m + 1));
    }

    #[test]
    fn test_sub_pixel_moves_share_a_pixel() {
        let grid = SpatialGrid::rasterize([-250.0, -250.0], [250.0, 250.0], 5.0, 50.0).unwrap();
        let a = grid.index_of(&[100.2, 50.3]).unwrap();
        let b = grid.index_of(&[101.9, 51.1]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_grid() {
        let grid = SpatialGrid::rasterize([0.0, 0.0], [10.0, 10.0], 5.0, 5.0).unwrap();
        let err = grid.to_pixel(&[-1000.0, 0.0]).unwrap_err();
        assert_eq!(err, GscmError::OutOfBoundary { x: -1000.0, y: 0.0 });
        assert!(grid.check_boundary(&[-1.0, 5.0]).is_err());
        assert!(grid.check_boundary(&[5.0, 5.0]).is_ok());
    }

    #[test]
    fn test_empty_extents() {
        assert!(matches!(
            SpatialGrid::rasterize([0.0, 0.0], [0.0, 10.0], 5.0, 10.0),
            Err(GscmError::EmptyExtents(_))
        ));
        assert!(matches!(
            SpatialGrid::rasterize([0.0, 0.0], [10.0, 10.0], 5.0, -1.0),
            Err(GscmError::InvalidCorrelationDistance(_))
        ));
    }

    #[test]
    fn test_interior() {
        let grid = SpatialGrid::rasterize([0.0, 0.0], [20.0, 20.0], 5.0, 5.0).unwrap();
        let m = grid.margin_px();
        assert!(!grid.is_interior(0, 0));
        assert!(grid.is_interior(m, m));
        assert!(!grid.is_interior(grid.rows() - 1, m));
    }
}
