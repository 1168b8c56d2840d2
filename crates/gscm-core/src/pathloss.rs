//! Scenario path-loss models and outdoor-to-indoor penetration
//!
//! Distances are in metres, carrier frequency in GHz, losses in positive dB.
//!
//! | scenario | LOS                         | NLOS                        |
//! |----------|-----------------------------|-----------------------------|
//! | UMi      | two-slope, breakpoint d'BP  | max(LOS, PL'NLOS)           |
//! | UMa      | two-slope, breakpoint d'BP  | max(LOS, PL'NLOS)           |
//! | RMa      | two-slope, breakpoint dBP   | max(LOS, PL'NLOS)           |
//! | InH      | single slope                | max(LOS, PL'NLOS)           |
//! | InF      | single slope                | max over sub-scenario model |
//!
//! # Example
//!
//! ```
//! use gscm_core::pathloss::path_loss_db;
//! use gscm_core::scenario::Scenario;
//! use gscm_core::types::LinkGeometry;
//!
//! let geom = LinkGeometry::new(&[0.0, 0.0, 25.0], &[300.0, 0.0, 1.5], 3.5e9);
//! let los = path_loss_db(Scenario::UMa, true, &geom);
//! let nlos = path_loss_db(Scenario::UMa, false, &geom);
//! assert!(nlos >= los);
//! ```

use serde::{Deserialize, Serialize};

use crate::scenario::Scenario;
use crate::types::{LinkGeometry, SPEED_OF_LIGHT};

/// Effective environment height for UMi/UMa breakpoint distances
const ENVIRONMENT_HEIGHT_M: f64 = 1.0;
/// RMa average building height
const RMA_BUILDING_HEIGHT_M: f64 = 5.0;
/// RMa average street width
const RMA_STREET_WIDTH_M: f64 = 20.0;

/// RMa breakpoint distance dBP = 2π·hBS·hUT·fc/c
pub fn rma_breakpoint(fc_ghz: f64, h_bs: f64, h_ut: f64) -> f64 {
    2.0 * std::f64::consts::PI * h_bs * h_ut * fc_ghz * 1e9 / SPEED_OF_LIGHT
}

/// UMi/UMa breakpoint distance d'BP = 4·h'BS·h'UT·fc/c
fn effective_breakpoint(fc_ghz: f64, h_bs: f64, h_ut: f64) -> f64 {
    let h_bs = (h_bs - ENVIRONMENT_HEIGHT_M).max(0.0);
    let h_ut = (h_ut - ENVIRONMENT_HEIGHT_M).max(0.0);
    4.0 * h_bs * h_ut * fc_ghz * 1e9 / SPEED_OF_LIGHT
}

/// Path loss of the direct (outdoor) leg, without shadow fading
pub fn path_loss_db(scenario: Scenario, los: bool, geom: &LinkGeometry) -> f64 {
    let fc = geom.fc_ghz;
    let d3d = geom.d3d.max(1.0);
    let d2d = geom.d2d;
    let (h_bs, h_ut) = (geom.h_bs, geom.h_ut);

    match scenario {
        Scenario::UMi => {
            let d_bp = effective_breakpoint(fc, h_bs, h_ut);
            let pl_los = if d2d <= d_bp {
                32.4 + 21.0 * d3d.log10() + 20.0 * fc.log10()
            } else {
                32.4 + 40.0 * d3d.log10() + 20.0 * fc.log10()
                    - 9.5 * (d_bp.powi(2) + (h_bs - h_ut).powi(2)).log10()
            };
            if los {
                pl_los
            } else {
                let pl_nlos =
                    35.3 * d3d.log10() + 22.4 + 21.3 * fc.log10() - 0.3 * (h_ut - 1.5);
                pl_los.max(pl_nlos)
            }
        }
        Scenario::UMa => {
            let d_bp = effective_breakpoint(fc, h_bs, h_ut);
            let pl_los = if d2d <= d_bp {
                28.0 + 22.0 * d3d.log10() + 20.0 * fc.log10()
            } else {
                28.0 + 40.0 * d3d.log10() + 20.0 * fc.log10()
                    - 9.0 * (d_bp.powi(2) + (h_bs - h_ut).powi(2)).log10()
            };
            if los {
                pl_los
            } else {
                let pl_nlos =
                    13.54 + 39.08 * d3d.log10() + 20.0 * fc.log10() - 0.6 * (h_ut - 1.5);
                pl_los.max(pl_nlos)
            }
        }
        Scenario::RMa => {
            let pl_los = rma_los(fc, d2d, d3d, h_bs, h_ut);
            if los {
                pl_los
            } else {
                let h = RMA_BUILDING_HEIGHT_M;
                let w = RMA_STREET_WIDTH_M;
                let pl_nlos = 161.04 - 7.1 * w.log10() + 7.5 * h.log10()
                    - (24.37 - 3.7 * (h / h_bs).powi(2)) * h_bs.log10()
                    + (43.42 - 3.1 * h_bs.log10()) * (d3d.log10() - 3.0)
                    + 20.0 * fc.log10()
                    - (3.2 * (11.75 * h_ut).log10().powi(2) - 4.97);
                pl_los.max(pl_nlos)
            }
        }
        Scenario::InHMixed | Scenario::InHOpen => {
            let pl_los = 32.4 + 17.3 * d3d.log10() + 20.0 * fc.log10();
            if los {
                pl_los
            } else {
                pl_los.max(38.3 * d3d.log10() + 17.30 + 24.9 * fc.log10())
            }
        }
        Scenario::InFSL
        | Scenario::InFDL
        | Scenario::InFSH
        | Scenario::InFDH
        | Scenario::InFHH => {
            let pl_los = 31.84 + 21.50 * d3d.log10() + 19.00 * fc.log10();
            if los || scenario == Scenario::InFHH {
                return pl_los;
            }
            let pl_sl = 33.0 + 25.5 * d3d.log10() + 20.0 * fc.log10();
            match scenario {
                Scenario::InFDL => {
                    let pl_dl = 18.6 + 35.7 * d3d.log10() + 20.0 * fc.log10();
                    pl_los.max(pl_sl).max(pl_dl)
                }
                Scenario::InFSH => pl_los.max(32.4 + 23.0 * d3d.log10() + 20.0 * fc.log10()),
                Scenario::InFDH => pl_los.max(33.63 + 21.9 * d3d.log10() + 20.0 * fc.log10()),
                _ => pl_los.max(pl_sl),
            }
        }
    }
}

fn rma_los(fc: f64, d2d: f64, d3d: f64, h_bs: f64, h_ut: f64) -> f64 {
    let h = RMA_BUILDING_HEIGHT_M;
    let pl1 = |d: f64| {
        20.0 * (40.0 * std::f64::consts::PI * d * fc / 3.0).log10()
            + (0.03 * h.powf(1.72)).min(10.0) * d.log10()
            - (0.044 * h.powf(1.72)).min(14.77)
            + 0.002 * h.log10() * d
    };
    let d_bp = rma_breakpoint(fc, h_bs, h_ut);
    if d2d <= d_bp {
        pl1(d3d)
    } else {
        let d3d_bp = (d_bp.powi(2) + (h_bs - h_ut).powi(2)).sqrt();
        pl1(d3d_bp) + 40.0 * (d3d / d3d_bp).log10()
    }
}

/// Building penetration class for O2I links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingType {
    /// Standard multi-pane glass and concrete
    LowLoss,
    /// IRR glass and concrete
    HighLoss,
}

impl BuildingType {
    /// Fraction of high-loss buildings in UMi/UMa; RMa uses only low-loss
    pub const HIGH_LOSS_FRACTION: f64 = 0.2;

    /// Classify from a uniform draw in [0, 1)
    pub fn from_uniform(scenario: Scenario, u: f64) -> Self {
        match scenario {
            Scenario::UMi | Scenario::UMa if u < Self::HIGH_LOSS_FRACTION => BuildingType::HighLoss,
            _ => BuildingType::LowLoss,
        }
    }

    /// Standard deviation of the penetration loss in dB
    pub fn sigma_db(&self) -> f64 {
        match self {
            BuildingType::LowLoss => 4.4,
            BuildingType::HighLoss => 6.5,
        }
    }
}

/// Mean O2I penetration loss: through-wall loss plus 0.5 dB/m indoor loss
pub fn o2i_penetration_db(building: BuildingType, fc_ghz: f64, indoor_distance_m: f64) -> f64 {
    let l_glass = 2.0 + 0.2 * fc_ghz;
    let l_irr_glass = 23.0 + 0.3 * fc_ghz;
    let l_concrete = 5.0 + 4.0 * fc_ghz;
    let lin = |l: f64| 10f64.powf(-l / 10.0);

    let through_wall = match building {
        BuildingType::LowLoss => 5.0 - 10.0 * (0.3 * lin(l_glass) + 0.7 * lin(l_concrete)).log10(),
        BuildingType::HighLoss => {
            5.0 - 10.0 * (0.7 * lin(l_irr_glass) + 0.3 * lin(l_concrete)).log10()
        }
    };
    through_wall + 0.5 * indoor_distance_m.max(0.0)
}

/// Maximum indoor distance per scenario (d2D-in is min of two U(0, max) draws)
pub fn max_indoor_distance_m(scenario: Scenario) -> f64 {
    match scenario {
        Scenario::RMa => 10.0,
        _ => 25.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(d2d: f64, h_bs: f64, h_ut: f64, fc_ghz: f64) -> LinkGeometry {
        LinkGeometry {
            fc_ghz,
            d2d,
            d3d: (d2d * d2d + (h_bs - h_ut).powi(2)).sqrt(),
            h_bs,
            h_ut,
        }
    }

    #[test]
    fn test_umi_los_near() {
        let g = geom(50.0, 10.0, 1.5, 3.5);
        let pl = path_loss_db(Scenario::UMi, true, &g);
        let expected = 32.4 + 21.0 * g.d3d.log10() + 20.0 * 3.5f64.log10();
        assert!((pl - expected).abs() < 1e-9);
    }

    #[test]
    fn test_nlos_never_below_los() {
        for sc in Scenario::ALL {
            for d in [15.0, 80.0, 450.0, 2000.0] {
                let g = if sc.is_indoor() {
                    geom(d / 20.0, 3.0, 1.5, 3.5)
                } else {
                    geom(d, 25.0, 1.5, 3.5)
                };
                let los = path_loss_db(sc, true, &g);
                let nlos = path_loss_db(sc, false, &g);
                assert!(nlos >= los - 1e-9, "{sc} at {d} m");
            }
        }
    }

    #[test]
    fn test_path_loss_grows_with_distance() {
        for sc in [Scenario::UMi, Scenario::UMa, Scenario::RMa] {
            let near = path_loss_db(sc, true, &geom(50.0, 25.0, 1.5, 3.5));
            let far = path_loss_db(sc, true, &geom(3000.0, 25.0, 1.5, 3.5));
            assert!(far > near + 20.0, "{sc}");
        }
    }

    #[test]
    fn test_rma_continuous_at_breakpoint() {
        let d_bp = rma_breakpoint(3.5, 35.0, 1.5);
        let before = path_loss_db(Scenario::RMa, true, &geom(d_bp - 1e-6, 35.0, 1.5, 3.5));
        let after = path_loss_db(Scenario::RMa, true, &geom(d_bp + 1e-6, 35.0, 1.5, 3.5));
        assert!((before - after).abs() < 0.01);
    }

    #[test]
    fn test_o2i_penetration() {
        let low = o2i_penetration_db(BuildingType::LowLoss, 3.5, 0.0);
        let high = o2i_penetration_db(BuildingType::HighLoss, 3.5, 0.0);
        assert!(high > low);
        let deeper = o2i_penetration_db(BuildingType::LowLoss, 3.5, 10.0);
        assert!((deeper - low - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_building_type_mix() {
        assert_eq!(BuildingType::from_uniform(Scenario::UMa, 0.1), BuildingType::HighLoss);
        assert_eq!(BuildingType::from_uniform(Scenario::UMa, 0.5), BuildingType::LowLoss);
        assert_eq!(BuildingType::from_uniform(Scenario::RMa, 0.1), BuildingType::LowLoss);
    }
}
