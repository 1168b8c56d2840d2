//! LOS probability models
//!
//! Returns the raw model value. Some parameter combinations (UMa with tall
//! UE heights, factory clutter inputs outside their intended range) push the
//! model outside [0, 1]; [`los_probability`] reports that as a warning and
//! hands the caller the unclamped value.

use crate::scenario::{FactoryHall, Scenario};
use crate::types::LinkGeometry;

/// Raw LOS probability for a link, `d2d` being the outdoor horizontal distance
pub fn los_probability_raw(scenario: Scenario, geom: &LinkGeometry, hall: &FactoryHall) -> f64 {
    let d = geom.d2d;
    match scenario {
        Scenario::RMa => {
            if d <= 10.0 {
                1.0
            } else {
                (-(d - 10.0) / 1000.0).exp()
            }
        }
        Scenario::UMi => {
            if d <= 18.0 {
                1.0
            } else {
                18.0 / d + (-d / 36.0).exp() * (1.0 - 18.0 / d)
            }
        }
        Scenario::UMa => {
            if d <= 18.0 {
                return 1.0;
            }
            let h_ut = geom.h_ut;
            let c_prime = if h_ut <= 13.0 {
                0.0
            } else {
                ((h_ut - 13.0) / 10.0).powf(1.5)
            };
            (18.0 / d + (-d / 63.0).exp() * (1.0 - 18.0 / d))
                * (1.0 + c_prime * 1.25 * (d / 100.0).powi(3) * (-d / 150.0).exp())
        }
        Scenario::InHMixed => {
            if d <= 1.2 {
                1.0
            } else if d < 6.5 {
                (-(d - 1.2) / 4.7).exp()
            } else {
                (-(d - 6.5) / 32.6).exp() * 0.32
            }
        }
        Scenario::InHOpen => {
            if d <= 5.0 {
                1.0
            } else if d <= 49.0 {
                (-(d - 5.0) / 70.8).exp()
            } else {
                (-(d - 49.0) / 211.7).exp() * 0.54
            }
        }
        Scenario::InFSL | Scenario::InFDL => {
            let k = -hall.clutter_size_m / (1.0 - hall.clutter_density).ln();
            (-d / k).exp()
        }
        Scenario::InFSH | Scenario::InFDH => {
            let k = -hall.clutter_size_m / (1.0 - hall.clutter_density).ln()
                * (geom.h_bs - geom.h_ut)
                / (hall.clutter_height_m - geom.h_ut);
            (-d / k).exp()
        }
        Scenario::InFHH => 1.0,
    }
}

/// LOS probability with an out-of-range diagnostic.
///
/// The computation continues with the unclamped value.
pub fn los_probability(scenario: Scenario, geom: &LinkGeometry, hall: &FactoryHall) -> f64 {
    let p = los_probability_raw(scenario, geom, hall);
    if !(0.0..=1.0).contains(&p) || p.is_nan() {
        tracing::warn!(
            scenario = %scenario,
            d2d = geom.d2d,
            h_ut = geom.h_ut,
            probability = p,
            "LOS probability outside [0, 1]"
        );
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(d2d: f64, h_bs: f64, h_ut: f64) -> LinkGeometry {
        LinkGeometry {
            fc_ghz: 3.5,
            d2d,
            d3d: (d2d * d2d + (h_bs - h_ut).powi(2)).sqrt(),
            h_bs,
            h_ut,
        }
    }

    #[test]
    fn test_short_links_are_los() {
        let hall = FactoryHall::default();
        for sc in [Scenario::UMi, Scenario::UMa, Scenario::RMa, Scenario::InHMixed, Scenario::InHOpen] {
            assert_eq!(los_probability(sc, &geom(1.0, 10.0, 1.5), &hall), 1.0, "{sc}");
        }
        assert_eq!(los_probability(Scenario::InFHH, &geom(80.0, 8.0, 8.0), &hall), 1.0);
    }

    #[test]
    fn test_decreasing_with_distance() {
        let hall = FactoryHall::default();
        for sc in [Scenario::UMi, Scenario::UMa, Scenario::RMa, Scenario::InFSL] {
            let near = los_probability(sc, &geom(20.0, 10.0, 1.5), &hall);
            let far = los_probability(sc, &geom(400.0, 10.0, 1.5), &hall);
            assert!(far < near, "{sc}");
            assert!((0.0..=1.0).contains(&far));
        }
    }

    #[test]
    fn test_uma_tall_ue_exceeds_one() {
        // C'(hUT) grows without bound above the intended 23 m ceiling
        let p = los_probability_raw(Scenario::UMa, &geom(450.0, 25.0, 60.0), &FactoryHall::default());
        assert!(p > 1.0);
        // The checked variant still returns the raw value
        let q = los_probability(Scenario::UMa, &geom(450.0, 25.0, 60.0), &FactoryHall::default());
        assert_eq!(p, q);
    }

    #[test]
    fn test_umi_value() {
        let p = los_probability(Scenario::UMi, &geom(36.0, 10.0, 1.5), &FactoryHall::default());
        let expected = 0.5 + (-1.0f64).exp() * 0.5;
        assert!((p - expected).abs() < 1e-12);
    }
}
