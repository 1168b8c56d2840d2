//! Core types shared by every stage of channel-link generation
//!
//! Positions are plain `[x, y, z]` arrays in metres. The deployment plane is
//! the x/y plane; z is antenna height above ground.
//!
//! ```text
//!        z
//!        ^   BS (x_bs, y_bs, h_bs)
//!        |    *
//!        |    |\
//!        |    | \  d3D
//!        |    |  \
//!        |    |   * UE (x_ue, y_ue, h_ut)
//!   -----+----+----+------> x/y plane
//!             <-d2D->
//! ```

use num_complex::Complex64;
use thiserror::Error;

/// Complex field / channel coefficient
pub type Complex = Complex64;

/// 3-D position in metres
pub type Position = [f64; 3];

/// 2-D position in metres (deployment plane)
pub type Point2 = [f64; 2];

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Result type for channel generation
pub type GscmResult<T> = Result<T, GscmError>;

/// Errors that abort a single link or field computation.
///
/// None of these leave a partially built cache behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GscmError {
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Scenario extents are empty: {0}")]
    EmptyExtents(String),

    #[error("Position ({x:.2}, {y:.2}) lies outside the scenario boundary")]
    OutOfBoundary { x: f64, y: f64 },

    #[error("Unsupported wrap-around layout: {sites} sites with {sectors} sectors")]
    UnsupportedLayout { sites: usize, sectors: usize },

    #[error("Invalid correlation distance: {0}")]
    InvalidCorrelationDistance(f64),

    #[error("Unknown node: {0}")]
    UnknownNode(u32),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Horizontal distance between two positions
#[inline]
pub fn distance_2d(a: &Position, b: &Position) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Euclidean distance between two positions
#[inline]
pub fn distance_3d(a: &Position, b: &Position) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

/// Line-of-sight angles seen from the BS towards the UE, in degrees.
///
/// Zenith angles are measured from the +z axis (90° is the horizon).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosAngles {
    pub aod: f64,
    pub aoa: f64,
    pub zod: f64,
    pub zoa: f64,
}

impl LosAngles {
    /// Compute the geometric LOS directions between a BS and a UE
    pub fn between(bs: &Position, ue: &Position) -> Self {
        let dx = ue[0] - bs[0];
        let dy = ue[1] - bs[1];
        let dz = ue[2] - bs[2];
        let d2d = (dx * dx + dy * dy).sqrt();

        let aod = dy.atan2(dx).to_degrees();
        let zod = d2d.atan2(dz).to_degrees();

        Self {
            aod,
            aoa: wrap_azimuth(aod + 180.0),
            zod,
            zoa: 180.0 - zod,
        }
    }
}

/// Geometry of one BS–UE link after wrap-around, as seen by the tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkGeometry {
    /// Carrier frequency in GHz
    pub fc_ghz: f64,
    /// Horizontal BS–UE distance in metres
    pub d2d: f64,
    /// 3-D BS–UE distance in metres
    pub d3d: f64,
    /// BS antenna height in metres
    pub h_bs: f64,
    /// UE antenna height in metres
    pub h_ut: f64,
}

impl LinkGeometry {
    /// Build the link geometry from a BS and a UE position
    pub fn new(bs: &Position, ue: &Position, frequency_hz: f64) -> Self {
        Self {
            fc_ghz: frequency_hz / 1e9,
            d2d: distance_2d(bs, ue),
            d3d: distance_3d(bs, ue),
            h_bs: bs[2],
            h_ut: ue[2],
        }
    }
}

/// Wrap an azimuth into [-180°, 180°)
#[inline]
pub fn wrap_azimuth(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Fold a zenith angle into [0°, 180°]
#[inline]
pub fn wrap_zenith(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 {
        360.0 - wrapped
    } else {
        wrapped
    }
}

/// Error function (Abramowitz & Stegun 7.1.26, |ε| < 1.5e-7)
pub fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = [0.0, 0.0, 10.0];
        let b = [3.0, 4.0, 22.0];
        assert!((distance_2d(&a, &b) - 5.0).abs() < 1e-12);
        assert!((distance_3d(&a, &b) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_los_angles() {
        let bs = [0.0, 0.0, 25.0];
        let ue = [100.0, 0.0, 25.0];
        let la = LosAngles::between(&bs, &ue);
        assert!(la.aod.abs() < 1e-12);
        assert!((la.aoa + 180.0).abs() < 1e-12);
        assert!((la.zod - 90.0).abs() < 1e-12);
        assert!((la.zoa - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_azimuth() {
        assert!((wrap_azimuth(190.0) + 170.0).abs() < 1e-12);
        assert!((wrap_azimuth(-190.0) - 170.0).abs() < 1e-12);
        assert!((wrap_azimuth(180.0) + 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_zenith() {
        assert!((wrap_zenith(190.0) - 170.0).abs() < 1e-12);
        assert!((wrap_zenith(-10.0) - 10.0).abs() < 1e-12);
        assert!((wrap_zenith(90.0) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_erf() {
        assert!(erf(0.0).abs() < 1e-7);
        assert!((erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((erf(-1.0) + 0.842_700_79).abs() < 1e-6);
        assert!((erf(3.0) - 0.999_977_9).abs() < 1e-6);
    }
}
