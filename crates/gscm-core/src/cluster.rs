//! Cluster and ray parameter generation
//!
//! Turns the large-scale parameters of one link into its multipath
//! structure:
//!
//! 1. cluster delays (exponential, sorted, starting at 0, LOS-scaled)
//! 2. cluster powers (exponential decay with per-cluster shadowing, Ricean
//!    re-weighting for LOS, weak-cluster removal)
//! 3. cluster AoA / AoD / ZoA / ZoD and the per-ray angles
//! 4. ray coupling, cross-polarisation ratios and initial phases
//!
//! Delays, shadowing, angle signs and angle offsets are keyed draws and
//! follow the spatial-consistency switch of [`Randomness`]. Coupling, XPR
//! and phases always come from the link generator.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::consistency::{AngleKind, ClusterQuantity, FieldKey, Randomness};
use crate::lsp::LargeScaleParams;
use crate::params::{azimuth_scaling, zenith_scaling, ScenarioParams, RAY_OFFSETS};
use crate::scenario::{Condition, FactoryHall, Family, Scenario};
use crate::types::{wrap_azimuth, wrap_zenith, GscmResult, LosAngles, SPEED_OF_LIGHT};

/// Clusters weaker than the strongest by more than this are dropped
pub const CLUSTER_POWER_FLOOR_DB: f64 = 25.0;

/// Everything the cluster generator needs to know about one link
#[derive(Debug, Clone, Copy)]
pub struct ClusterContext<'a> {
    pub scenario: Scenario,
    pub params: &'a ScenarioParams,
    pub lsp: &'a LargeScaleParams,
    /// Geometric LOS directions after wrap-around
    pub los_angles: LosAngles,
    pub hall: &'a FactoryHall,
}

/// Small-scale parameters of one link, in downlink orientation
#[derive(Debug, Clone, PartialEq)]
pub struct SmallScaleParams {
    /// Retained clusters
    pub num_clusters: usize,
    pub rays_per_cluster: usize,
    /// Cluster delays in seconds, ascending
    pub delays_s: Vec<f64>,
    /// Cluster powers, summing to 1
    pub powers: Vec<f64>,
    pub aoa_deg: Vec<f64>,
    pub aod_deg: Vec<f64>,
    pub zoa_deg: Vec<f64>,
    pub zod_deg: Vec<f64>,
    /// Per-ray angles, `[cluster][ray]`
    pub ray_aoa_deg: Vec<Vec<f64>>,
    pub ray_aod_deg: Vec<Vec<f64>>,
    pub ray_zoa_deg: Vec<Vec<f64>>,
    pub ray_zod_deg: Vec<Vec<f64>>,
    /// Per cluster, the AoA-ray index coupled with AoD, ZoA and ZoD ray `m`
    pub ray_coupling: Vec<[Vec<usize>; 3]>,
    /// Cross-polarisation ratio in dB, `[cluster][AoA ray]`
    pub xpr_db: Vec<Vec<f64>>,
    /// Initial phases θθ, θφ, φθ, φφ in degrees, `[cluster][AoA ray]`
    pub initial_phases_deg: Vec<Vec<[f64; 4]>>,
    /// Absolute excess delay added to every cluster, in seconds
    pub absolute_delay_s: f64,
    /// Ricean K-factor the powers were weighted with, LOS links only
    pub k_factor_db: Option<f64>,
}

/// Generates [`SmallScaleParams`] from large-scale parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterParameterGenerator {
    absolute_delay: bool,
}

impl ClusterParameterGenerator {
    /// `absolute_delay` adds the NLOS absolute time of arrival to all delays
    pub fn new(absolute_delay: bool) -> Self {
        Self { absolute_delay }
    }

    pub fn generate(&self, ctx: &ClusterContext<'_>, draws: &mut Randomness<'_>) -> GscmResult<SmallScaleParams> {
        let condition = ctx.lsp.condition;
        let params = ctx.params;
        let k_factor_db = ctx.lsp.k_factor_db.filter(|_| condition == Condition::Los);

        let raw_delays = cluster_delays(params, ctx.lsp, condition, draws)?;
        let powers = cluster_powers(params, ctx.lsp, condition, k_factor_db, &raw_delays, draws)?;

        // Drop weak clusters, then renormalise what is left
        let p_max = powers.iter().cloned().fold(0.0, f64::max);
        let floor = p_max * 10f64.powf(-CLUSTER_POWER_FLOOR_DB / 10.0);
        let kept: Vec<usize> = (0..powers.len()).filter(|&n| powers[n] >= floor).collect();
        let total: f64 = kept.iter().map(|&n| powers[n]).sum();
        let powers: Vec<f64> = kept.iter().map(|&n| powers[n] / total).collect();

        let delay_scale = match k_factor_db {
            Some(k) => 0.7705 - 0.0433 * k + 0.0002 * k.powi(2) + 0.000017 * k.powi(3),
            None => 1.0,
        };
        let mut delays_s: Vec<f64> = kept.iter().map(|&n| raw_delays[n] / delay_scale).collect();

        let n = powers.len();
        let lsp = ctx.lsp;
        let los = ctx.los_angles;
        let zoa_centre = if condition == Condition::O2i { 90.0 } else { los.zoa };

        let mut angles = |kind: AngleKind, spread: f64, centre: f64| {
            cluster_angles(kind, &powers, spread, centre, params, condition, k_factor_db, draws)
        };
        let aoa = angles(AngleKind::Aoa, lsp.asa_deg, los.aoa)?;
        let aod = angles(AngleKind::Aod, lsp.asd_deg, los.aod)?;
        let zoa = angles(AngleKind::Zoa, lsp.zsa_deg, zoa_centre)?;
        let zod = angles(AngleKind::Zod, lsp.zsd_deg, los.zod + params.zod_offset_deg)?;

        let m = params.rays_per_cluster.min(RAY_OFFSETS.len());
        let offsets = &RAY_OFFSETS[..m];
        let c_zsd = 0.375 * 10f64.powf(params.lg_zsd.mu);
        let rays = |centres: &[f64], spread: f64, wrap: fn(f64) -> f64| -> Vec<Vec<f64>> {
            centres
                .iter()
                .map(|&c| offsets.iter().map(|&a| wrap(c + spread * a)).collect())
                .collect()
        };
        let ray_aoa_deg = rays(&aoa, params.c_asa, wrap_azimuth);
        let ray_aod_deg = rays(&aod, params.c_asd, wrap_azimuth);
        let ray_zoa_deg = rays(&zoa, params.c_zsa, wrap_zenith);
        let ray_zod_deg = rays(&zod, c_zsd, wrap_zenith);

        let rng = draws.rng();
        let ray_coupling: Vec<[Vec<usize>; 3]> = (0..n)
            .map(|_| {
                let mut perm = || {
                    let mut p: Vec<usize> = (0..m).collect();
                    p.shuffle(&mut *rng);
                    p
                };
                [perm(), perm(), perm()]
            })
            .collect();

        let xpr = params.xpr_db;
        let xpr_db: Vec<Vec<f64>> = (0..n)
            .map(|_| {
                (0..m)
                    .map(|_| xpr.mu + xpr.sigma * rng.sample::<f64, _>(StandardNormal))
                    .collect()
            })
            .collect();

        let initial_phases_deg: Vec<Vec<[f64; 4]>> = (0..n)
            .map(|_| {
                (0..m)
                    .map(|_| [0u8; 4].map(|_| rng.gen_range(-180.0..180.0)))
                    .collect()
            })
            .collect();

        let absolute_delay_s = if self.absolute_delay && condition == Condition::Nlos {
            absolute_delay(ctx.scenario, ctx.hall, draws)?
        } else {
            0.0
        };
        if absolute_delay_s > 0.0 {
            for d in delays_s.iter_mut() {
                *d += absolute_delay_s;
            }
        }

        Ok(SmallScaleParams {
            num_clusters: n,
            rays_per_cluster: m,
            delays_s,
            powers,
            aoa_deg: aoa,
            aod_deg: aod,
            zoa_deg: zoa,
            zod_deg: zod,
            ray_aoa_deg,
            ray_aod_deg,
            ray_zoa_deg,
            ray_zod_deg,
            ray_coupling,
            xpr_db,
            initial_phases_deg,
            absolute_delay_s,
            k_factor_db,
        })
    }
}

/// Sorted delays starting at 0, before the LOS scaling
fn cluster_delays(
    params: &ScenarioParams,
    lsp: &LargeScaleParams,
    condition: Condition,
    draws: &mut Randomness<'_>,
) -> GscmResult<Vec<f64>> {
    let mut delays = Vec::with_capacity(params.num_clusters);
    for n in 0..params.num_clusters {
        let u = draws.cluster(condition, ClusterQuantity::Delay, n)?.max(f64::MIN_POSITIVE);
        delays.push(-params.r_tau * lsp.ds_s * u.ln());
    }
    delays.sort_by(f64::total_cmp);
    let first = delays.first().copied().unwrap_or(0.0);
    for d in delays.iter_mut() {
        *d -= first;
    }
    Ok(delays)
}

/// Normalised cluster powers, Ricean re-weighted for LOS
fn cluster_powers(
    params: &ScenarioParams,
    lsp: &LargeScaleParams,
    condition: Condition,
    k_factor_db: Option<f64>,
    delays: &[f64],
    draws: &mut Randomness<'_>,
) -> GscmResult<Vec<f64>> {
    let r_tau = params.r_tau;
    let mut powers = Vec::with_capacity(delays.len());
    for (n, &tau) in delays.iter().enumerate() {
        let z = params.zeta_db * draws.cluster(condition, ClusterQuantity::Shadowing, n)?;
        powers.push((-tau * (r_tau - 1.0) / (r_tau * lsp.ds_s)).exp() * 10f64.powf(-z / 10.0));
    }
    let total: f64 = powers.iter().sum();
    for p in powers.iter_mut() {
        *p /= total;
    }

    if let Some(k_db) = k_factor_db {
        let k = 10f64.powf(k_db / 10.0);
        for p in powers.iter_mut() {
            *p /= k + 1.0;
        }
        if let Some(first) = powers.first_mut() {
            *first += k / (k + 1.0);
        }
    }
    Ok(powers)
}

/// Cluster angles for one dimension, centred on `centre`
#[allow(clippy::too_many_arguments)]
fn cluster_angles(
    kind: AngleKind,
    powers: &[f64],
    spread_deg: f64,
    centre: f64,
    params: &ScenarioParams,
    condition: Condition,
    k_factor_db: Option<f64>,
    draws: &mut Randomness<'_>,
) -> GscmResult<Vec<f64>> {
    let p_max = powers.iter().cloned().fold(0.0, f64::max);
    let azimuth = matches!(kind, AngleKind::Aoa | AngleKind::Aod);

    let (scale, base) = if azimuth {
        let los_scale = k_factor_db
            .map(|k| 1.1035 - 0.028 * k - 0.002 * k.powi(2) + 0.0001 * k.powi(3))
            .unwrap_or(1.0);
        (azimuth_scaling(params.num_clusters) * los_scale, 2.0 * spread_deg / 1.4)
    } else {
        let los_scale = k_factor_db
            .map(|k| 1.3086 + 0.0339 * k - 0.0077 * k.powi(2) + 0.0002 * k.powi(3))
            .unwrap_or(1.0);
        (zenith_scaling(params.num_clusters) * los_scale, spread_deg)
    };

    let mut angles = Vec::with_capacity(powers.len());
    for (n, &p) in powers.iter().enumerate() {
        let ratio = (p / p_max).min(1.0);
        let primed = if azimuth {
            base * (-ratio.ln()).max(0.0).sqrt() / scale
        } else {
            -base * ratio.ln() / scale
        };
        let sign = if draws.cluster(condition, ClusterQuantity::Sign(kind), n)? < 0.5 {
            -1.0
        } else {
            1.0
        };
        let offset = spread_deg / 7.0 * draws.cluster(condition, ClusterQuantity::Offset(kind), n)?;
        angles.push(sign * primed + offset);
    }

    // LOS puts the first cluster exactly on the geometric direction
    let shift = match (k_factor_db, angles.first()) {
        (Some(_), Some(&first)) => first,
        _ => 0.0,
    };
    let wrap: fn(f64) -> f64 = if azimuth { wrap_azimuth } else { wrap_zenith };
    Ok(angles.into_iter().map(|a| wrap(a - shift + centre)).collect())
}

/// NLOS absolute time of arrival, bounded by twice the hall size indoors
fn absolute_delay(scenario: Scenario, hall: &FactoryHall, draws: &mut Randomness<'_>) -> GscmResult<f64> {
    let Some((stat, _)) = ScenarioParams::absolute_delay(scenario) else {
        return Ok(0.0);
    };
    let site = draws.site();
    let x = draws.normal(FieldKey::AbsoluteDelay { site }, 0)?;
    let delay = 10f64.powf(stat.mu + stat.sigma * x);
    Ok(match scenario.family() {
        Family::InF => delay.min(2.0 * hall.max_dimension() / SPEED_OF_LIGHT),
        _ => delay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::SpatialConsistencyState;
    use crate::lsp::LargeScaleParameterGenerator;
    use crate::types::LinkGeometry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup(scenario: Scenario, condition: Condition, seed: u64) -> (ScenarioParams, LargeScaleParams) {
        let bs = [0.0, 0.0, 10.0];
        let ue = [100.0, 50.0, 1.5];
        let geom = LinkGeometry::new(&bs, &ue, 3.5e9);
        let hall = FactoryHall::default();
        let params = ScenarioParams::lookup(scenario, condition, condition == Condition::Los, &geom, &hall);
        let mut rng = StdRng::seed_from_u64(seed);
        let lsp = LargeScaleParameterGenerator::default()
            .generate(&params, condition, &mut Randomness::independent(&mut rng))
            .unwrap();
        (params, lsp)
    }

    fn generate(scenario: Scenario, condition: Condition, seed: u64) -> SmallScaleParams {
        let (params, lsp) = setup(scenario, condition, seed);
        let hall = FactoryHall::default();
        let ctx = ClusterContext {
            scenario,
            params: &params,
            lsp: &lsp,
            los_angles: LosAngles::between(&[0.0, 0.0, 10.0], &[100.0, 50.0, 1.5]),
            hall: &hall,
        };
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        ClusterParameterGenerator::new(true)
            .generate(&ctx, &mut Randomness::independent(&mut rng))
            .unwrap()
    }

    #[test]
    fn test_powers_normalised_and_above_floor() {
        for sc in Scenario::ALL {
            for cond in [Condition::Los, Condition::Nlos, Condition::O2i] {
                for seed in 0..10 {
                    let ssp = generate(sc, cond, seed);
                    let sum: f64 = ssp.powers.iter().sum();
                    assert!((sum - 1.0).abs() < 1e-9, "{sc} {cond:?}");
                    let max_db = 10.0 * ssp.powers.iter().cloned().fold(0.0, f64::max).log10();
                    for &p in &ssp.powers {
                        assert!(10.0 * p.log10() >= max_db - CLUSTER_POWER_FLOOR_DB - 1e-9);
                    }
                }
            }
        }
    }

    #[test]
    fn test_delays_sorted_from_zero() {
        // UMa, BS at (0, 0, 10), UE at (100, 50, 1.5), LOS
        let ssp = generate(Scenario::UMa, Condition::Los, 0);
        assert_eq!(ssp.delays_s[0], 0.0);
        assert!(ssp.delays_s.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ssp.absolute_delay_s, 0.0);
    }

    #[test]
    fn test_los_first_cluster_on_geometry() {
        let ssp = generate(Scenario::UMi, Condition::Los, 3);
        let los = LosAngles::between(&[0.0, 0.0, 10.0], &[100.0, 50.0, 1.5]);
        assert!((ssp.aod_deg[0] - wrap_azimuth(los.aod)).abs() < 1e-9);
        assert!((ssp.aoa_deg[0] - wrap_azimuth(los.aoa)).abs() < 1e-9);
        assert!((ssp.zoa_deg[0] - los.zoa).abs() < 1e-9);
        assert!((ssp.zod_deg[0] - los.zod).abs() < 1e-9);
        // The Ricean term dominates the first cluster
        assert!(ssp.powers[0] > 0.5 || ssp.k_factor_db.unwrap() < 3.0);
    }

    #[test]
    fn test_angle_ranges() {
        for seed in 0..20 {
            let ssp = generate(Scenario::UMa, Condition::Nlos, seed);
            for n in 0..ssp.num_clusters {
                assert!((-180.0..180.0).contains(&ssp.aoa_deg[n]));
                assert!((0.0..=180.0).contains(&ssp.zod_deg[n]));
                for m in 0..ssp.rays_per_cluster {
                    assert!((-180.0..180.0).contains(&ssp.ray_aod_deg[n][m]));
                    assert!((0.0..=180.0).contains(&ssp.ray_zoa_deg[n][m]));
                }
            }
        }
    }

    #[test]
    fn test_ray_structure() {
        let ssp = generate(Scenario::UMi, Condition::Nlos, 5);
        assert_eq!(ssp.rays_per_cluster, 20);
        assert_eq!(ssp.ray_coupling.len(), ssp.num_clusters);
        for perms in &ssp.ray_coupling {
            for p in perms {
                let mut sorted = p.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, (0..20).collect::<Vec<_>>());
            }
        }
        assert_eq!(ssp.xpr_db.len(), ssp.num_clusters);
        for phases in ssp.initial_phases_deg.iter().flatten() {
            for &ph in phases {
                assert!((-180.0..180.0).contains(&ph));
            }
        }
    }

    #[test]
    fn test_absolute_delay_nlos_only() {
        let ssp = generate(Scenario::UMi, Condition::Nlos, 2);
        assert!(ssp.absolute_delay_s > 0.0);
        assert_eq!(ssp.delays_s[0], ssp.absolute_delay_s);
        let rma = generate(Scenario::RMa, Condition::Nlos, 2);
        assert_eq!(rma.absolute_delay_s, 0.0);
    }

    #[test]
    fn test_inf_absolute_delay_bounded() {
        let hall = FactoryHall::default();
        let bound = 2.0 * hall.max_dimension() / SPEED_OF_LIGHT;
        for seed in 0..20 {
            let ssp = generate(Scenario::InFDH, Condition::Nlos, seed);
            assert!(ssp.absolute_delay_s <= bound);
        }
    }

    #[test]
    fn test_o2i_zoa_centred_on_horizon() {
        let mut mean = 0.0;
        let mut weight = 0.0;
        for seed in 0..30 {
            let ssp = generate(Scenario::UMa, Condition::O2i, seed);
            for (z, p) in ssp.zoa_deg.iter().zip(&ssp.powers) {
                mean += z * p;
                weight += p;
            }
        }
        assert!((mean / weight - 90.0).abs() < 10.0);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(generate(Scenario::InHOpen, Condition::Nlos, 42), generate(Scenario::InHOpen, Condition::Nlos, 42));
    }

    #[test]
    fn test_consistent_draws_follow_position() {
        let (params, lsp) = setup(Scenario::UMi, Condition::Nlos, 1);
        let hall = FactoryHall::default();
        let mut state =
            SpatialConsistencyState::new(Scenario::UMi, hall, 3, [-200.0, -200.0], [200.0, 200.0]).unwrap();
        let ctx = ClusterContext {
            scenario: Scenario::UMi,
            params: &params,
            lsp: &lsp,
            los_angles: LosAngles::between(&[0.0, 0.0, 10.0], &[100.0, 50.0, 1.5]),
            hall: &hall,
        };
        let gen = ClusterParameterGenerator::new(false);
        let mut rng_a = StdRng::seed_from_u64(1);
        let a = gen
            .generate(&ctx, &mut Randomness::consistent(&mut rng_a, &mut state, 0, 0, [100.0, 50.0]))
            .unwrap();
        let mut rng_b = StdRng::seed_from_u64(2);
        let b = gen
            .generate(&ctx, &mut Randomness::consistent(&mut rng_b, &mut state, 0, 0, [101.0, 51.0]))
            .unwrap();
        assert_eq!(a.delays_s, b.delays_s);
        assert_eq!(a.powers, b.powers);
        assert_eq!(a.aoa_deg, b.aoa_deg);
        // Unkeyed draws come from the link generators
        assert_ne!(a.xpr_db, b.xpr_db);
    }
}
