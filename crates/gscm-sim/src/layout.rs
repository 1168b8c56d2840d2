//! Hexagonal site layouts and deployment extents
//!
//! Site positions lie on the lattice spanned by `a1 = isd·(1, 0)` and
//! `a2 = isd·(½, √3/2)`, the same lattice the wrap-around images use.

use gscm_core::config::Extents;
use gscm_core::wrap_around::site_polygon;
use gscm_core::{GscmError, GscmResult, Point2};

/// Ground positions of a regular 1, 3, 7 or 19 site layout centred on the origin
pub fn hex_sites(inter_site_distance: f64, num_sites: usize) -> GscmResult<Vec<Point2>> {
    let isd = inter_site_distance;
    let ring = |radius: f64, phase_deg: f64| -> Vec<Point2> {
        (0..6)
            .map(|k| {
                let a = (phase_deg + 60.0 * k as f64).to_radians();
                [radius * a.cos(), radius * a.sin()]
            })
            .collect()
    };

    let sites = match num_sites {
        1 => vec![[0.0, 0.0]],
        3 => vec![[0.0, 0.0], [isd, 0.0], [0.5 * isd, 0.5 * 3f64.sqrt() * isd]],
        7 => {
            let mut s = vec![[0.0, 0.0]];
            s.extend(ring(isd, 0.0));
            s
        }
        19 => {
            let mut s = vec![[0.0, 0.0]];
            s.extend(ring(isd, 0.0));
            // Second ring alternates between corner and edge positions
            let corners = ring(2.0 * isd, 0.0);
            let edges = ring(3f64.sqrt() * isd, 30.0);
            for (c, e) in corners.into_iter().zip(edges) {
                s.push(c);
                s.push(e);
            }
            s
        }
        _ => {
            return Err(GscmError::UnsupportedLayout {
                sites: num_sites,
                sectors: 0,
            })
        }
    };
    Ok(sites)
}

/// Bounding rectangle of the cells around `sites`
pub fn infer_extents(sites: &[Point2], inter_site_distance: f64) -> GscmResult<Extents> {
    if sites.is_empty() {
        return Err(GscmError::EmptyExtents("no sites to infer extents from".to_string()));
    }
    let polygon = site_polygon(inter_site_distance);
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for site in sites {
        for v in &polygon {
            for axis in 0..2 {
                let p = site[axis] + v[axis];
                min[axis] = min[axis].min(p);
                max[axis] = max[axis].max(p);
            }
        }
    }
    Ok(Extents::new(min, max))
}
