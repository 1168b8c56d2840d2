//! Large-scale and cluster parameter tables
//!
//! One row per scenario family and propagation condition (13 rows):
//!
//! | family | rows            |
//! |--------|-----------------|
//! | UMi    | LOS, NLOS, O2I  |
//! | UMa    | LOS, NLOS, O2I  |
//! | RMa    | LOS, NLOS, O2I  |
//! | InH    | LOS, NLOS       |
//! | InF    | LOS, NLOS       |
//!
//! Frequency-dependent entries are evaluated at the link carrier, clamped to
//! the lowest valid table frequency of the scenario. Spreads are stored as
//! `lg` statistics: delay spread in `lg(DS / 1 s)`, angular spreads in
//! `lg(spread / 1°)`.

use crate::pathloss::rma_breakpoint;
use crate::scenario::{Condition, FactoryHall, Family, Scenario};
use crate::types::LinkGeometry;

/// Number of large-scale parameters
pub const NUM_LSP: usize = 7;

/// Index of each large-scale parameter in vectors and correlation matrices
pub mod lsp {
    pub const SF: usize = 0;
    pub const K: usize = 1;
    pub const DS: usize = 2;
    pub const ASD: usize = 3;
    pub const ASA: usize = 4;
    pub const ZSD: usize = 5;
    pub const ZSA: usize = 6;
}

/// Mean and standard deviation of a (log-)normal quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stat {
    pub mu: f64,
    pub sigma: f64,
}

impl Stat {
    pub const fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }
}

/// Statistics for one scenario/condition row, evaluated for one link
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParams {
    /// Shadow fading standard deviation in dB
    pub sf_sigma_db: f64,
    /// Ricean K-factor in dB (LOS only)
    pub k_factor_db: Option<Stat>,
    pub lg_ds: Stat,
    pub lg_asd: Stat,
    pub lg_asa: Stat,
    pub lg_zsd: Stat,
    pub lg_zsa: Stat,
    /// Symmetric cross-correlation matrix in [`lsp`] order
    pub cross_correlation: [[f64; NUM_LSP]; NUM_LSP],
    /// Delay scaling parameter r_τ
    pub r_tau: f64,
    /// Cross-polarisation ratio in dB
    pub xpr_db: Stat,
    pub num_clusters: usize,
    pub rays_per_cluster: usize,
    /// Cluster delay spread in ns, when defined
    pub c_ds_ns: Option<f64>,
    /// Cluster angular spreads in degrees
    pub c_asd: f64,
    pub c_asa: f64,
    pub c_zsa: f64,
    /// Per-cluster shadowing standard deviation in dB
    pub zeta_db: f64,
    /// Correlation distances in metres, in [`lsp`] order (`None` = not applicable)
    pub correlation_distance_m: [Option<f64>; NUM_LSP],
    /// Zenith-of-departure offset in degrees
    pub zod_offset_deg: f64,
}

/// 21 upper-triangle cross-correlations in table order:
/// ASD-DS, ASA-DS, ASA-SF, ASD-SF, DS-SF, ASD-ASA, ASD-K, ASA-K, DS-K, SF-K,
/// ZSD-SF, ZSA-SF, ZSD-K, ZSA-K, ZSD-DS, ZSA-DS, ZSD-ASD, ZSA-ASD, ZSD-ASA,
/// ZSA-ASA, ZSD-ZSA
fn cross_correlation(c: [f64; 21]) -> [[f64; NUM_LSP]; NUM_LSP] {
    use lsp::*;
    let pairs = [
        (ASD, DS),
        (ASA, DS),
        (ASA, SF),
        (ASD, SF),
        (DS, SF),
        (ASD, ASA),
        (ASD, K),
        (ASA, K),
        (DS, K),
        (SF, K),
        (ZSD, SF),
        (ZSA, SF),
        (ZSD, K),
        (ZSA, K),
        (ZSD, DS),
        (ZSA, DS),
        (ZSD, ASD),
        (ZSA, ASD),
        (ZSD, ASA),
        (ZSA, ASA),
        (ZSD, ZSA),
    ];
    let mut m = [[0.0; NUM_LSP]; NUM_LSP];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    for (&(a, b), &v) in pairs.iter().zip(c.iter()) {
        m[a][b] = v;
        m[b][a] = v;
    }
    m
}

const O2I_CROSS: [f64; 21] = [
    0.4, 0.4, 0.0, 0.2, -0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.6, -0.2, -0.2, 0.0,
    -0.4, 0.0, 0.5,
];

impl ScenarioParams {
    /// Look up the row for `scenario` / `condition`, evaluated for `geom`.
    ///
    /// `outdoor_los` selects the ZSD and ZoD-offset model of the outdoor leg
    /// for O2I links; it is ignored otherwise.
    pub fn lookup(
        scenario: Scenario,
        condition: Condition,
        outdoor_los: bool,
        geom: &LinkGeometry,
        hall: &FactoryHall,
    ) -> Self {
        let fc = geom.fc_ghz.max(scenario.min_table_frequency_ghz());
        let lf = (1.0 + fc).log10();
        let d2d = geom.d2d;
        let h_ut = geom.h_ut;
        let h_bs = geom.h_bs;
        let zsd_los = condition == Condition::Los || (condition == Condition::O2i && outdoor_los);

        match (scenario.family(), condition) {
            (Family::UMi, Condition::Los) => Self {
                sf_sigma_db: 4.0,
                k_factor_db: Some(Stat::new(9.0, 5.0)),
                lg_ds: Stat::new(-0.24 * lf - 7.14, 0.38),
                lg_asd: Stat::new(-0.05 * lf + 1.21, 0.41),
                lg_asa: Stat::new(-0.08 * lf + 1.73, 0.014 * lf + 0.28),
                lg_zsa: Stat::new(-0.1 * lf + 0.73, -0.04 * lf + 0.34),
                lg_zsd: umi_zsd(true, d2d, h_ut, h_bs),
                cross_correlation: cross_correlation([
                    0.5, 0.8, -0.4, -0.5, -0.4, 0.4, -0.2, -0.3, -0.7, 0.5, 0.0, 0.0, 0.0, 0.0,
                    0.0, 0.2, 0.5, 0.3, 0.0, 0.0, 0.0,
                ]),
                r_tau: 3.0,
                xpr_db: Stat::new(9.0, 3.0),
                num_clusters: 12,
                rays_per_cluster: 20,
                c_ds_ns: Some(5.0),
                c_asd: 3.0,
                c_asa: 17.0,
                c_zsa: 7.0,
                zeta_db: 3.0,
                correlation_distance_m: corr([10.0, 15.0, 7.0, 8.0, 8.0, 12.0, 12.0]),
                zod_offset_deg: 0.0,
            },
            (Family::UMi, Condition::Nlos) => Self {
                sf_sigma_db: 7.82,
                k_factor_db: None,
                lg_ds: Stat::new(-0.24 * lf - 6.83, 0.16 * lf + 0.28),
                lg_asd: Stat::new(-0.23 * lf + 1.53, 0.11 * lf + 0.33),
                lg_asa: Stat::new(-0.08 * lf + 1.81, 0.05 * lf + 0.3),
                lg_zsa: Stat::new(-0.04 * lf + 0.92, -0.07 * lf + 0.41),
                lg_zsd: umi_zsd(false, d2d, h_ut, h_bs),
                cross_correlation: cross_correlation([
                    0.0, 0.4, -0.4, 0.0, -0.7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.5,
                    0.0, 0.5, 0.5, 0.0, 0.2, 0.0,
                ]),
                r_tau: 2.1,
                xpr_db: Stat::new(8.0, 3.0),
                num_clusters: 19,
                rays_per_cluster: 20,
                c_ds_ns: Some(11.0),
                c_asd: 10.0,
                c_asa: 22.0,
                c_zsa: 7.0,
                zeta_db: 3.0,
                correlation_distance_m: nlos_corr([13.0, 10.0, 10.0, 9.0, 10.0, 10.0]),
                zod_offset_deg: umi_zod_offset(d2d),
            },
            (Family::UMi, Condition::O2i) => Self {
                lg_zsd: umi_zsd(zsd_los, d2d, h_ut, h_bs),
                zod_offset_deg: if outdoor_los { 0.0 } else { umi_zod_offset(d2d) },
                ..o2i_outdoor_row()
            },
            (Family::UMa, Condition::Los) => Self {
                sf_sigma_db: 4.0,
                k_factor_db: Some(Stat::new(9.0, 3.5)),
                lg_ds: Stat::new(-6.955 - 0.0963 * fc.log10(), 0.66),
                lg_asd: Stat::new(1.06 + 0.1114 * fc.log10(), 0.28),
                lg_asa: Stat::new(1.81, 0.20),
                lg_zsa: Stat::new(0.95, 0.16),
                lg_zsd: uma_zsd(true, d2d, h_ut),
                cross_correlation: cross_correlation([
                    0.4, 0.8, -0.5, -0.5, -0.4, 0.0, 0.0, -0.2, -0.4, 0.0, 0.0, -0.8, 0.0, 0.0,
                    -0.2, 0.0, 0.5, 0.0, -0.3, 0.4, 0.0,
                ]),
                r_tau: 2.5,
                xpr_db: Stat::new(8.0, 4.0),
                num_clusters: 12,
                rays_per_cluster: 20,
                c_ds_ns: Some(uma_cluster_ds(fc)),
                c_asd: 5.0,
                c_asa: 11.0,
                c_zsa: 7.0,
                zeta_db: 3.0,
                correlation_distance_m: corr([37.0, 12.0, 30.0, 18.0, 15.0, 15.0, 15.0]),
                zod_offset_deg: 0.0,
            },
            (Family::UMa, Condition::Nlos) => Self {
                sf_sigma_db: 6.0,
                k_factor_db: None,
                lg_ds: Stat::new(-6.28 - 0.204 * fc.log10(), 0.39),
                lg_asd: Stat::new(1.5 - 0.1144 * fc.log10(), 0.28),
                lg_asa: Stat::new(2.08 - 0.27 * fc.log10(), 0.11),
                lg_zsa: Stat::new(-0.3236 * fc.log10() + 1.512, 0.16),
                lg_zsd: uma_zsd(false, d2d, h_ut),
                cross_correlation: cross_correlation([
                    0.4, 0.6, 0.0, -0.6, -0.4, 0.4, 0.0, 0.0, 0.0, 0.0, 0.0, -0.4, 0.0, 0.0, -0.5,
                    0.0, 0.5, -0.1, 0.0, 0.0, 0.0,
                ]),
                r_tau: 2.3,
                xpr_db: Stat::new(7.0, 3.0),
                num_clusters: 20,
                rays_per_cluster: 20,
                c_ds_ns: Some(uma_cluster_ds(fc)),
                c_asd: 2.0,
                c_asa: 15.0,
                c_zsa: 7.0,
                zeta_db: 3.0,
                correlation_distance_m: nlos_corr([50.0, 40.0, 50.0, 50.0, 50.0, 50.0]),
                zod_offset_deg: uma_zod_offset(fc, d2d, h_ut),
            },
            (Family::UMa, Condition::O2i) => Self {
                lg_zsd: uma_zsd(zsd_los, d2d, h_ut),
                zod_offset_deg: if outdoor_los { 0.0 } else { uma_zod_offset(fc, d2d, h_ut) },
                ..o2i_outdoor_row()
            },
            (Family::RMa, Condition::Los) => Self {
                sf_sigma_db: if d2d < rma_breakpoint(geom.fc_ghz, h_bs, h_ut) { 4.0 } else { 6.0 },
                k_factor_db: Some(Stat::new(7.0, 4.0)),
                lg_ds: Stat::new(-7.49, 0.55),
                lg_asd: Stat::new(0.90, 0.38),
                lg_asa: Stat::new(1.52, 0.24),
                lg_zsa: Stat::new(0.47, 0.40),
                lg_zsd: rma_zsd(true, d2d, h_ut),
                cross_correlation: cross_correlation([
                    0.0, 0.0, 0.0, 0.0, -0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.01, -0.17, 0.0, -0.02,
                    -0.05, 0.27, 0.73, -0.14, -0.20, 0.24, -0.07,
                ]),
                r_tau: 3.8,
                xpr_db: Stat::new(12.0, 4.0),
                num_clusters: 11,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 2.0,
                c_asa: 3.0,
                c_zsa: 3.0,
                zeta_db: 3.0,
                correlation_distance_m: corr([37.0, 40.0, 50.0, 25.0, 35.0, 15.0, 15.0]),
                zod_offset_deg: 0.0,
            },
            (Family::RMa, Condition::Nlos) => Self {
                sf_sigma_db: 8.0,
                k_factor_db: None,
                lg_ds: Stat::new(-7.43, 0.48),
                lg_asd: Stat::new(0.95, 0.45),
                lg_asa: Stat::new(1.52, 0.13),
                lg_zsa: Stat::new(0.58, 0.37),
                lg_zsd: rma_zsd(false, d2d, h_ut),
                cross_correlation: cross_correlation([
                    -0.4, 0.0, 0.0, 0.6, -0.5, 0.0, 0.0, 0.0, 0.0, 0.0, -0.04, -0.25, 0.0, 0.0,
                    -0.10, -0.40, 0.42, -0.27, -0.18, 0.26, -0.27,
                ]),
                r_tau: 1.7,
                xpr_db: Stat::new(7.0, 3.0),
                num_clusters: 10,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 2.0,
                c_asa: 3.0,
                c_zsa: 3.0,
                zeta_db: 3.0,
                correlation_distance_m: nlos_corr([120.0, 36.0, 30.0, 40.0, 50.0, 50.0]),
                zod_offset_deg: rma_zod_offset(d2d),
            },
            (Family::RMa, Condition::O2i) => Self {
                sf_sigma_db: 8.0,
                k_factor_db: None,
                lg_ds: Stat::new(-7.47, 0.24),
                lg_asd: Stat::new(0.67, 0.18),
                lg_asa: Stat::new(1.66, 0.21),
                lg_zsa: Stat::new(0.93, 0.22),
                lg_zsd: rma_zsd(zsd_los, d2d, h_ut),
                cross_correlation: cross_correlation([
                    0.0, 0.0, 0.0, 0.0, 0.0, -0.7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                    0.0, 0.66, 0.47, -0.55, -0.22, 0.0,
                ]),
                r_tau: 1.7,
                xpr_db: Stat::new(7.0, 3.0),
                num_clusters: 10,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 2.0,
                c_asa: 3.0,
                c_zsa: 3.0,
                zeta_db: 3.0,
                correlation_distance_m: nlos_corr([120.0, 36.0, 30.0, 40.0, 50.0, 50.0]),
                zod_offset_deg: if outdoor_los { 0.0 } else { rma_zod_offset(d2d) },
            },
            (Family::InH, Condition::Los) => Self {
                sf_sigma_db: 3.0,
                k_factor_db: Some(Stat::new(7.0, 4.0)),
                lg_ds: Stat::new(-0.01 * lf - 7.692, 0.18),
                lg_asd: Stat::new(1.60, 0.18),
                lg_asa: Stat::new(-0.19 * lf + 1.781, 0.12 * lf + 0.119),
                lg_zsa: Stat::new(-0.26 * lf + 1.44, -0.04 * lf + 0.264),
                lg_zsd: Stat::new(-1.43 * lf + 2.228, 0.13 * lf + 0.30),
                cross_correlation: cross_correlation([
                    0.6, 0.8, -0.5, -0.4, -0.8, 0.4, 0.0, 0.0, -0.5, 0.5, 0.2, 0.3, 0.0, 0.1, 0.1,
                    0.2, 0.5, 0.0, 0.0, 0.5, 0.0,
                ]),
                r_tau: 3.6,
                xpr_db: Stat::new(11.0, 4.0),
                num_clusters: 15,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 5.0,
                c_asa: 8.0,
                c_zsa: 9.0,
                zeta_db: 6.0,
                correlation_distance_m: corr([10.0, 4.0, 8.0, 7.0, 5.0, 4.0, 4.0]),
                zod_offset_deg: 0.0,
            },
            // Indoor deployments have no O2I leg; treat a forced O2I as NLOS.
            (Family::InH, Condition::Nlos | Condition::O2i) => Self {
                sf_sigma_db: 8.03,
                k_factor_db: None,
                lg_ds: Stat::new(-0.28 * lf - 7.173, 0.10 * lf + 0.055),
                lg_asd: Stat::new(1.62, 0.25),
                lg_asa: Stat::new(-0.11 * lf + 1.863, 0.12 * lf + 0.059),
                lg_zsa: Stat::new(-0.15 * lf + 1.387, -0.09 * lf + 0.746),
                lg_zsd: Stat::new(1.08, 0.36),
                cross_correlation: cross_correlation([
                    0.4, 0.0, -0.4, 0.0, -0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.27,
                    -0.06, 0.35, 0.23, -0.08, 0.43, 0.42,
                ]),
                r_tau: 3.0,
                xpr_db: Stat::new(10.0, 4.0),
                num_clusters: 19,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 5.0,
                c_asa: 11.0,
                c_zsa: 9.0,
                zeta_db: 3.0,
                correlation_distance_m: nlos_corr([6.0, 5.0, 3.0, 3.0, 4.0, 4.0]),
                zod_offset_deg: 0.0,
            },
            (Family::InF, Condition::Los) => Self {
                sf_sigma_db: 4.3,
                k_factor_db: Some(Stat::new(7.0, 8.0)),
                lg_ds: Stat::new((26.0 * hall.volume_to_surface() + 14.0).log10() - 9.35, 0.15),
                lg_asd: Stat::new(1.56, 0.25),
                lg_asa: Stat::new(-0.18 * lf + 1.78, 0.12 * lf + 0.20),
                lg_zsa: Stat::new(-0.2 * lf + 1.50, 0.35),
                lg_zsd: Stat::new(1.35, 0.35),
                cross_correlation: cross_correlation([
                    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -0.5, 0.0, -0.7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                ]),
                r_tau: 2.7,
                xpr_db: Stat::new(12.0, 6.0),
                num_clusters: 25,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 5.0,
                c_asa: 8.0,
                c_zsa: 9.0,
                zeta_db: 4.0,
                correlation_distance_m: corr([10.0; NUM_LSP]),
                zod_offset_deg: 0.0,
            },
            (Family::InF, Condition::Nlos | Condition::O2i) => Self {
                sf_sigma_db: inf_nlos_sf(scenario),
                k_factor_db: None,
                lg_ds: Stat::new((30.0 * hall.volume_to_surface() + 32.0).log10() - 9.44, 0.19),
                lg_asd: Stat::new(1.57, 0.20),
                lg_asa: Stat::new(1.72, 0.30),
                lg_zsa: Stat::new(-0.13 * lf + 1.45, 0.45),
                lg_zsd: Stat::new(1.20, 0.55),
                cross_correlation: cross_correlation([0.0; 21]),
                r_tau: 3.0,
                xpr_db: Stat::new(11.0, 6.0),
                num_clusters: 25,
                rays_per_cluster: 20,
                c_ds_ns: None,
                c_asd: 5.0,
                c_asa: 8.0,
                c_zsa: 9.0,
                zeta_db: 4.0,
                correlation_distance_m: nlos_corr([10.0; 6]),
                zod_offset_deg: 0.0,
            },
        }
    }

    /// Row at a nominal geometry, for the entries that do not depend on it
    /// (cluster and ray counts, correlation distances)
    pub fn nominal(scenario: Scenario, condition: Condition, hall: &FactoryHall) -> Self {
        let geom = LinkGeometry {
            fc_ghz: 6.0,
            d2d: 100.0,
            d3d: 100.0,
            h_bs: 10.0,
            h_ut: 1.5,
        };
        Self::lookup(scenario, condition, false, &geom, hall)
    }

    /// Correlation distance of the per-cluster random variables (delays,
    /// shadowing, angle signs and offsets) and of the LOS state
    pub fn cluster_correlation_distance_m(scenario: Scenario, condition: Condition) -> f64 {
        match (scenario.family(), condition) {
            (Family::UMi, Condition::Los) => 12.0,
            (Family::UMi, _) => 15.0,
            (Family::UMa, Condition::Los) => 40.0,
            (Family::UMa, Condition::Nlos) => 50.0,
            (Family::RMa, Condition::Los) => 50.0,
            (Family::RMa, Condition::Nlos) => 60.0,
            (Family::UMa | Family::RMa, Condition::O2i) => 15.0,
            (Family::InH, _) => 10.0,
            (Family::InF, _) => 10.0,
        }
    }

    /// Correlation distance of the LOS/NLOS state field
    pub fn los_state_correlation_distance_m(scenario: Scenario, hall: &FactoryHall) -> f64 {
        match scenario.family() {
            Family::UMi | Family::UMa => 50.0,
            Family::RMa => 60.0,
            Family::InH => 10.0,
            Family::InF => (hall.clutter_size_m / 2.0).max(1.0),
        }
    }

    /// Correlation distance of the O2I building-type and indoor-distance fields
    pub const O2I_CORRELATION_DISTANCE_M: f64 = 50.0;

    /// Absolute time-of-arrival statistics `lg(Δτ / 1 s)` and correlation
    /// distance, defined for NLOS links only
    pub fn absolute_delay(scenario: Scenario) -> Option<(Stat, f64)> {
        match scenario {
            Scenario::UMi => Some((Stat::new(-7.5, 0.5), 15.0)),
            Scenario::UMa => Some((Stat::new(-7.4, 0.2), 50.0)),
            Scenario::RMa => None,
            Scenario::InHMixed | Scenario::InHOpen => Some((Stat::new(-8.6, 0.1), 10.0)),
            Scenario::InFSL => Some((Stat::new(-7.5, 0.4), 6.0)),
            Scenario::InFDL => Some((Stat::new(-7.3, 0.3), 6.0)),
            Scenario::InFSH => Some((Stat::new(-7.7, 0.4), 6.0)),
            Scenario::InFDH => Some((Stat::new(-7.5, 0.5), 6.0)),
            Scenario::InFHH => None,
        }
    }
}

fn corr(d: [f64; NUM_LSP]) -> [Option<f64>; NUM_LSP] {
    d.map(Some)
}

/// NLOS-style distances: [SF, DS, ASD, ASA, ZSD, ZSA], K not applicable
fn nlos_corr(d: [f64; 6]) -> [Option<f64>; NUM_LSP] {
    [Some(d[0]), None, Some(d[1]), Some(d[2]), Some(d[3]), Some(d[4]), Some(d[5])]
}

/// Shared UMi/UMa O2I row; ZSD and the ZoD offset follow the outdoor leg
fn o2i_outdoor_row() -> ScenarioParams {
    ScenarioParams {
        sf_sigma_db: 7.0,
        k_factor_db: None,
        lg_ds: Stat::new(-6.62, 0.32),
        lg_asd: Stat::new(1.25, 0.42),
        lg_asa: Stat::new(1.76, 0.16),
        lg_zsa: Stat::new(1.01, 0.43),
        lg_zsd: Stat::new(0.0, 0.0),
        cross_correlation: cross_correlation(O2I_CROSS),
        r_tau: 2.2,
        xpr_db: Stat::new(9.0, 5.0),
        num_clusters: 12,
        rays_per_cluster: 20,
        c_ds_ns: Some(11.0),
        c_asd: 5.0,
        c_asa: 8.0,
        c_zsa: 3.0,
        zeta_db: 4.0,
        correlation_distance_m: nlos_corr([7.0, 10.0, 11.0, 17.0, 25.0, 25.0]),
        zod_offset_deg: 0.0,
    }
}

fn umi_zsd(los: bool, d2d: f64, h_ut: f64, h_bs: f64) -> Stat {
    if los {
        Stat::new((-14.8 * d2d / 1000.0 + 0.01 * (h_ut - h_bs).abs() + 0.83).max(-0.21), 0.35)
    } else {
        Stat::new((-3.1 * d2d / 1000.0 + 0.01 * (h_ut - h_bs).max(0.0) + 0.2).max(-0.5), 0.35)
    }
}

fn uma_zsd(los: bool, d2d: f64, h_ut: f64) -> Stat {
    if los {
        Stat::new((-2.1 * d2d / 1000.0 - 0.01 * (h_ut - 1.5) + 0.75).max(-0.5), 0.40)
    } else {
        Stat::new((-2.1 * d2d / 1000.0 - 0.01 * (h_ut - 1.5) + 0.9).max(-0.5), 0.49)
    }
}

fn rma_zsd(los: bool, d2d: f64, h_ut: f64) -> Stat {
    if los {
        Stat::new((-0.17 * d2d / 1000.0 - 0.01 * (h_ut - 1.5) + 0.22).max(-1.0), 0.34)
    } else {
        Stat::new((-0.19 * d2d / 1000.0 - 0.01 * (h_ut - 1.5) + 0.28).max(-1.0), 0.30)
    }
}

fn uma_cluster_ds(fc: f64) -> f64 {
    (6.5622 - 3.4084 * fc.log10()).max(0.25)
}

fn umi_zod_offset(d2d: f64) -> f64 {
    -(10f64).powf(-1.5 * d2d.max(10.0).log10() + 3.3)
}

fn uma_zod_offset(fc: f64, d2d: f64, h_ut: f64) -> f64 {
    let a = 0.208 * fc.log10() - 0.782;
    let b = 25.0;
    let c = -0.13 * fc.log10() + 2.03;
    let e = 7.66 * fc.log10() - 5.96;
    e - 10f64.powf(a * d2d.max(b).log10() + c) - 0.07 * (h_ut - 1.5)
}

fn rma_zod_offset(d2d: f64) -> f64 {
    let d = d2d.max(1.0);
    ((35.0f64 - 3.5) / d).atan().to_degrees() - ((35.0f64 - 1.5) / d).atan().to_degrees()
}

fn inf_nlos_sf(scenario: Scenario) -> f64 {
    match scenario {
        Scenario::InFDL => 7.2,
        Scenario::InFSH => 5.9,
        Scenario::InFDH => 4.0,
        _ => 5.7,
    }
}

/// Normalisation constant C_φ for azimuth angles, by cluster count
pub fn azimuth_scaling(num_clusters: usize) -> f64 {
    const TABLE: [(usize, f64); 12] = [
        (4, 0.779),
        (5, 0.860),
        (8, 1.018),
        (10, 1.090),
        (11, 1.123),
        (12, 1.146),
        (14, 1.190),
        (15, 1.211),
        (16, 1.226),
        (19, 1.273),
        (20, 1.289),
        (25, 1.358),
    ];
    nearest_entry(&TABLE, num_clusters)
}

/// Normalisation constant C_θ for zenith angles, by cluster count
pub fn zenith_scaling(num_clusters: usize) -> f64 {
    const TABLE: [(usize, f64); 8] = [
        (8, 0.889),
        (10, 0.957),
        (11, 1.031),
        (12, 1.104),
        (15, 1.1088),
        (19, 1.184),
        (20, 1.178),
        (25, 1.282),
    ];
    nearest_entry(&TABLE, num_clusters)
}

/// Exact match, otherwise the closest tabulated cluster count
fn nearest_entry(table: &[(usize, f64)], n: usize) -> f64 {
    let mut best = table[0];
    for &entry in table {
        if entry.0.abs_diff(n) < best.0.abs_diff(n) {
            best = entry;
        }
    }
    best.1
}

/// Ray offset angles α_m within a cluster (unit cluster spread)
pub const RAY_OFFSETS: [f64; 20] = [
    0.0447, -0.0447, 0.1413, -0.1413, 0.2492, -0.2492, 0.3715, -0.3715, 0.5129, -0.5129, 0.6797,
    -0.6797, 0.8844, -0.8844, 1.1481, -1.1481, 1.5195, -1.5195, 2.1551, -2.1551,
];
