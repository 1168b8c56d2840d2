//! Toroidal wrap-around for regular hexagonal site layouts
//!
//! A finite cluster of `N` sites is tiled periodically over the plane. Each
//! site appears at its own position and at six images shifted by the cluster
//! shift vector rotated in 60° steps:
//!
//! ```text
//!            image 2     image 1
//!                 \       /
//!      image 3 --- [ site ] --- image 0
//!                 /       \
//!            image 4     image 5
//! ```
//!
//! A UE always sees the nearest image of every site.

use crate::types::{GscmError, GscmResult, Point2, Position};

/// Displacement vectors for the site images of a supported layout.
///
/// The first entry is always the zero offset.
pub fn offsets(inter_site_distance: f64, num_sites: usize, num_sectors: usize) -> GscmResult<Vec<Point2>> {
    let (i, j) = match (num_sites, num_sectors) {
        (3, 3) => (1.0, 1.0),
        (7, _) => (2.0, 1.0),
        (19, _) => (3.0, 2.0),
        _ => {
            return Err(GscmError::UnsupportedLayout {
                sites: num_sites,
                sectors: num_sectors,
            })
        }
    };

    let a1 = [inter_site_distance, 0.0];
    let a2 = [inter_site_distance * 0.5, inter_site_distance * 3f64.sqrt() / 2.0];
    let shift = [i * a1[0] + j * a2[0], i * a1[1] + j * a2[1]];

    let mut out = Vec::with_capacity(7);
    out.push([0.0, 0.0]);
    for k in 0..6 {
        let (s, c) = (k as f64 * std::f64::consts::FRAC_PI_3).sin_cos();
        out.push([c * shift[0] - s * shift[1], s * shift[0] + c * shift[1]]);
    }
    Ok(out)
}

/// Site image closest to the UE, with the resulting 3-D distance.
///
/// Distance comparisons use the horizontal plane; ties keep the earliest offset.
pub fn nearest_image(site: &Position, ue: &Position, offsets: &[Point2]) -> (Position, f64) {
    let mut best = *site;
    let mut best_d2 = f64::INFINITY;
    for off in offsets {
        let x = site[0] + off[0];
        let y = site[1] + off[1];
        let d2 = (x - ue[0]).powi(2) + (y - ue[1]).powi(2);
        if d2 < best_d2 {
            best_d2 = d2;
            best = [x, y, site[2]];
        }
    }
    if offsets.is_empty() {
        best_d2 = (site[0] - ue[0]).powi(2) + (site[1] - ue[1]).powi(2);
    }
    let d3 = (best_d2 + (best[2] - ue[2]).powi(2)).sqrt();
    (best, d3)
}

/// Vertices of the hexagonal cell around a site at the origin.
///
/// Circumradius `isd / √3`, flat sides facing the six neighbouring sites.
pub fn site_polygon(inter_site_distance: f64) -> [Point2; 6] {
    let radius = inter_site_distance / 3f64.sqrt();
    let mut vertices = [[0.0; 2]; 6];
    for (k, v) in vertices.iter_mut().enumerate() {
        let angle = (30.0 + 60.0 * k as f64).to_radians();
        *v = [radius * angle.cos(), radius * angle.sin()];
    }
    vertices
}
