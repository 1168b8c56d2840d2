//! Large-scale parameter generation
//!
//! ```text
//! table row ──► z ~ N(0, I₇) ──► x = √C · z ──► SF, K, DS, ASD, ASA, ZSD, ZSA
//!                (fields or          (cross-        (dB / log-normal,
//!                 independent)        correlation)    spreads clamped)
//! ```

use crate::consistency::Randomness;
use crate::matrix::{sqrt_psd, Matrix};
use crate::params::{lsp, ScenarioParams, NUM_LSP};
use crate::scenario::Condition;
use crate::types::GscmResult;

/// Largest azimuth spread in degrees
pub const MAX_AZIMUTH_SPREAD_DEG: f64 = 104.0;

/// Largest zenith spread in degrees
pub const MAX_ZENITH_SPREAD_DEG: f64 = 52.0;

/// The seven large-scale parameters of one link, in physical units
#[derive(Debug, Clone, PartialEq)]
pub struct LargeScaleParams {
    pub condition: Condition,
    /// Shadow fading in dB
    pub sf_db: f64,
    /// Ricean K-factor in dB, LOS links only
    pub k_factor_db: Option<f64>,
    /// RMS delay spread in seconds
    pub ds_s: f64,
    pub asd_deg: f64,
    pub asa_deg: f64,
    pub zsd_deg: f64,
    pub zsa_deg: f64,
}

/// Maps table statistics and unit draws to correlated LSPs
#[derive(Debug, Clone, Copy)]
pub struct LargeScaleParameterGenerator {
    fast_fading: bool,
}

impl Default for LargeScaleParameterGenerator {
    fn default() -> Self {
        Self { fast_fading: true }
    }
}

impl LargeScaleParameterGenerator {
    /// With `fast_fading` off only shadow fading is drawn; the other
    /// parameters stay at their median values.
    pub fn new(fast_fading: bool) -> Self {
        Self { fast_fading }
    }

    pub fn fast_fading(&self) -> bool {
        self.fast_fading
    }

    /// Draw the LSPs of one link
    pub fn generate(
        &self,
        params: &ScenarioParams,
        condition: Condition,
        draws: &mut Randomness<'_>,
    ) -> GscmResult<LargeScaleParams> {
        let z = draws.lsp_normals(condition, self.fast_fading)?;
        let x = self.correlate(params, &z);
        Ok(self.to_physical(params, condition, &x))
    }

    /// Apply the cross-correlation square root to unit draws
    pub fn correlate(&self, params: &ScenarioParams, z: &[f64; NUM_LSP]) -> [f64; NUM_LSP] {
        if !self.fast_fading {
            let mut x = [0.0; NUM_LSP];
            x[lsp::SF] = z[lsp::SF];
            return x;
        }
        let root = sqrt_psd(&Matrix::from_rows(&params.cross_correlation));
        let v = root.mul_vec(z);
        let mut x = [0.0; NUM_LSP];
        x.copy_from_slice(&v);
        x
    }

    /// Scale correlated unit variables to physical units and clamp the spreads
    pub fn to_physical(&self, params: &ScenarioParams, condition: Condition, x: &[f64; NUM_LSP]) -> LargeScaleParams {
        let lognormal = |stat: crate::params::Stat, v: f64| 10f64.powf(stat.mu + stat.sigma * v);

        let k_factor_db = match (condition, params.k_factor_db) {
            (Condition::Los, Some(k)) => Some(k.mu + k.sigma * x[lsp::K]),
            _ => None,
        };

        LargeScaleParams {
            condition,
            sf_db: params.sf_sigma_db * x[lsp::SF],
            k_factor_db,
            ds_s: lognormal(params.lg_ds, x[lsp::DS]),
            asd_deg: lognormal(params.lg_asd, x[lsp::ASD]).min(MAX_AZIMUTH_SPREAD_DEG),
            asa_deg: lognormal(params.lg_asa, x[lsp::ASA]).min(MAX_AZIMUTH_SPREAD_DEG),
            zsd_deg: lognormal(params.lg_zsd, x[lsp::ZSD]).min(MAX_ZENITH_SPREAD_DEG),
            zsa_deg: lognormal(params.lg_zsa, x[lsp::ZSA]).min(MAX_ZENITH_SPREAD_DEG),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{FactoryHall, Scenario};
    use crate::types::LinkGeometry;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn row(scenario: Scenario, condition: Condition) -> ScenarioParams {
        let geom = LinkGeometry {
            fc_ghz: 3.5,
            d2d: 120.0,
            d3d: 121.0,
            h_bs: 25.0,
            h_ut: 1.5,
        };
        ScenarioParams::lookup(scenario, condition, condition == Condition::Los, &geom, &FactoryHall::default())
    }

    #[test]
    fn test_spreads_clamped() {
        let gen = LargeScaleParameterGenerator::new(true);
        let params = row(Scenario::UMa, Condition::Nlos);
        let x = [0.0, 0.0, 0.0, 9.0, 9.0, 9.0, 9.0];
        let out = gen.to_physical(&params, Condition::Nlos, &x);
        assert_eq!(out.asd_deg, MAX_AZIMUTH_SPREAD_DEG);
        assert_eq!(out.asa_deg, MAX_AZIMUTH_SPREAD_DEG);
        assert_eq!(out.zsd_deg, MAX_ZENITH_SPREAD_DEG);
        assert_eq!(out.zsa_deg, MAX_ZENITH_SPREAD_DEG);
    }

    #[test]
    fn test_spreads_bounded_over_random_draws() {
        let gen = LargeScaleParameterGenerator::default();
        let mut rng = StdRng::seed_from_u64(21);
        for sc in Scenario::ALL {
            for cond in [Condition::Los, Condition::Nlos, Condition::O2i] {
                let params = row(sc, cond);
                for _ in 0..50 {
                    let mut link_rng = StdRng::seed_from_u64(rng.gen());
                    let mut draws = Randomness::independent(&mut link_rng);
                    let out = gen.generate(&params, cond, &mut draws).unwrap();
                    assert!(out.asa_deg <= 104.0 && out.asd_deg <= 104.0);
                    assert!(out.zsa_deg <= 52.0 && out.zsd_deg <= 52.0);
                    assert!(out.ds_s > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_k_factor_only_for_los() {
        let gen = LargeScaleParameterGenerator::default();
        let mut rng = StdRng::seed_from_u64(0);
        let los = gen
            .generate(&row(Scenario::UMi, Condition::Los), Condition::Los, &mut Randomness::independent(&mut rng))
            .unwrap();
        assert!(los.k_factor_db.is_some());
        let nlos = gen
            .generate(&row(Scenario::UMi, Condition::Nlos), Condition::Nlos, &mut Randomness::independent(&mut rng))
            .unwrap();
        assert!(nlos.k_factor_db.is_none());
    }

    #[test]
    fn test_shadow_fading_only_without_fast_fading() {
        let gen = LargeScaleParameterGenerator::new(false);
        let params = row(Scenario::UMa, Condition::Los);
        let z = [1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let x = gen.correlate(&params, &z);
        assert_eq!(x, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let out = gen.to_physical(&params, Condition::Los, &x);
        assert!((out.sf_db - 4.0).abs() < 1e-12);
        assert!((out.ds_s - 10f64.powf(params.lg_ds.mu)).abs() < 1e-18);
    }

    #[test]
    fn test_correlation_applied() {
        // DS and ASA are strongly positively correlated in UMa LOS
        let gen = LargeScaleParameterGenerator::default();
        let params = row(Scenario::UMa, Condition::Los);
        let mut dot = 0.0;
        let mut rng = StdRng::seed_from_u64(8);
        let n = 4000;
        for _ in 0..n {
            let mut draws = Randomness::independent(&mut rng);
            let z = draws.lsp_normals(Condition::Los, true).unwrap();
            let x = gen.correlate(&params, &z);
            dot += x[lsp::DS] * x[lsp::ASA];
        }
        let corr = dot / n as f64;
        assert!((corr - 0.8).abs() < 0.1, "corr = {corr}");
    }

    #[test]
    fn test_same_seed_same_lsps() {
        let gen = LargeScaleParameterGenerator::default();
        let params = row(Scenario::RMa, Condition::Nlos);
        let mut a = StdRng::seed_from_u64(77);
        let mut b = StdRng::seed_from_u64(77);
        let la = gen.generate(&params, Condition::Nlos, &mut Randomness::independent(&mut a)).unwrap();
        let lb = gen.generate(&params, Condition::Nlos, &mut Randomness::independent(&mut b)).unwrap();
        assert_eq!(la, lb);
    }
}
