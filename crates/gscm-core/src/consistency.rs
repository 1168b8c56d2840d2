//! Spatial-consistency state and the randomness switch
//!
//! [`SpatialConsistencyState`] owns every correlated field of one scenario
//! configuration. Fields are built lazily on first use and never change
//! afterwards. Each field group is seeded from the scenario seed and a stable
//! hash of its [`FieldKey`], so the order in which links trigger the builds
//! has no influence on sampled values.
//!
//! [`Randomness`] is what the parameter generators draw from. Without a
//! state it hands out independent draws from a per-link generator; with a
//! state every keyed draw reads the matching field at the UE position.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::HashMap;

use crate::autocorrelation::{gaussian_to_uniform, AutoCorrelationField};
use crate::params::{ScenarioParams, NUM_LSP};
use crate::scenario::{Condition, FactoryHall, Scenario};
use crate::spatial_grid::{SpatialGrid, GRID_RESOLUTION_M};
use crate::types::{GscmResult, Point2};

/// Angle of arrival or departure, azimuth or zenith
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleKind {
    Aoa,
    Aod,
    Zoa,
    Zod,
}

impl AngleKind {
    pub const ALL: [AngleKind; 4] = [AngleKind::Aoa, AngleKind::Aod, AngleKind::Zoa, AngleKind::Zod];

    fn code(&self) -> u64 {
        match self {
            AngleKind::Aoa => 0,
            AngleKind::Aod => 1,
            AngleKind::Zoa => 2,
            AngleKind::Zod => 3,
        }
    }
}

/// Per-cluster random variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterQuantity {
    /// U(0, 1) behind the exponential delay draw
    Delay,
    /// N(0, 1) behind the per-cluster shadowing
    Shadowing,
    /// U(0, 1) deciding the sign X of an angle
    Sign(AngleKind),
    /// N(0, 1) behind the angle offset Y
    Offset(AngleKind),
}

impl ClusterQuantity {
    fn code(&self) -> u64 {
        match self {
            ClusterQuantity::Delay => 0,
            ClusterQuantity::Shadowing => 1,
            ClusterQuantity::Sign(a) => 2 + a.code(),
            ClusterQuantity::Offset(a) => 6 + a.code(),
        }
    }
}

/// Identity of one group of correlated fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// O2I building type, one field
    BuildingType,
    /// O2I indoor distance, two fields (the minimum of both draws is used)
    IndoorDistance,
    /// LOS/NLOS state towards one site
    LosState { site: u32 },
    /// The seven LSPs of one site, condition and floor
    Lsp { site: u32, condition: Condition, floor: u32 },
    /// One field per table cluster for one quantity
    Cluster {
        site: u32,
        condition: Condition,
        quantity: ClusterQuantity,
    },
    /// Absolute time-of-arrival jitter towards one site
    AbsoluteDelay { site: u32 },
}

impl FieldKey {
    /// Stable 64-bit identity mixed into the scenario seed
    pub fn stable_hash(&self) -> u64 {
        let words: [u64; 4] = match *self {
            FieldKey::BuildingType => [1, 0, 0, 0],
            FieldKey::IndoorDistance => [2, 0, 0, 0],
            FieldKey::LosState { site } => [3, site as u64, 0, 0],
            FieldKey::Lsp { site, condition, floor } => {
                [4, site as u64, condition.index() as u64, floor as u64]
            }
            FieldKey::Cluster {
                site,
                condition,
                quantity,
            } => [5, site as u64, condition.index() as u64, quantity.code()],
            FieldKey::AbsoluteDelay { site } => [6, site as u64, 0, 0],
        };
        words.iter().fold(0xcbf2_9ce4_8422_2325, |acc, &w| splitmix64(acc ^ w))
    }
}

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Lazily built correlated fields of one scenario configuration
#[derive(Debug)]
pub struct SpatialConsistencyState {
    scenario: Scenario,
    hall: FactoryHall,
    seed: u64,
    grid: SpatialGrid,
    fields: HashMap<FieldKey, Vec<AutoCorrelationField>>,
}

impl SpatialConsistencyState {
    /// Rasterize `[min, max]` for `scenario`, sized for its longest correlation distance
    pub fn new(scenario: Scenario, hall: FactoryHall, seed: u64, min: Point2, max: Point2) -> GscmResult<Self> {
        let dmax = max_correlation_distance(scenario, &hall);
        let grid = SpatialGrid::rasterize(min, max, GRID_RESOLUTION_M, dmax)?;
        tracing::debug!(
            scenario = %scenario,
            rows = grid.rows(),
            cols = grid.cols(),
            max_correlation_distance = dmax,
            "spatial consistency grid"
        );
        Ok(Self {
            scenario,
            hall,
            seed,
            grid,
            fields: HashMap::new(),
        })
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Number of field groups built so far
    pub fn built_groups(&self) -> usize {
        self.fields.len()
    }

    pub fn is_built(&self, key: &FieldKey) -> bool {
        self.fields.contains_key(key)
    }

    /// Correlation distances of the fields in a group
    pub fn distances(&self, key: &FieldKey) -> Vec<Option<f64>> {
        match *key {
            FieldKey::BuildingType => vec![Some(ScenarioParams::O2I_CORRELATION_DISTANCE_M)],
            FieldKey::IndoorDistance => vec![Some(ScenarioParams::O2I_CORRELATION_DISTANCE_M); 2],
            FieldKey::LosState { .. } => vec![Some(ScenarioParams::los_state_correlation_distance_m(
                self.scenario,
                &self.hall,
            ))],
            FieldKey::Lsp { condition, .. } => {
                ScenarioParams::nominal(self.scenario, condition, &self.hall)
                    .correlation_distance_m
                    .to_vec()
            }
            FieldKey::Cluster { condition, .. } => {
                let n = ScenarioParams::nominal(self.scenario, condition, &self.hall).num_clusters;
                vec![Some(ScenarioParams::cluster_correlation_distance_m(self.scenario, condition)); n]
            }
            FieldKey::AbsoluteDelay { .. } => {
                vec![ScenarioParams::absolute_delay(self.scenario).map(|(_, d)| d)]
            }
        }
    }

    /// Fields of a group, building them on first use
    pub fn fields(&mut self, key: FieldKey) -> GscmResult<&[AutoCorrelationField]> {
        if !self.fields.contains_key(&key) {
            let distances = self.distances(&key);
            let mut rng = StdRng::seed_from_u64(self.seed ^ key.stable_hash());
            let built = AutoCorrelationField::build(&mut rng, &self.grid, &distances)?;
            tracing::debug!(?key, count = built.len(), "built correlated field group");
            self.fields.insert(key, built);
        }
        Ok(self.fields.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// N(0, 1) value of field `index` in group `key` at `pos`.
    ///
    /// An index past the end of the group reads as 0.
    pub fn sample_normal(&mut self, key: FieldKey, index: usize, pos: &Point2) -> GscmResult<f64> {
        // Reject before building anything
        self.grid.to_pixel(pos)?;
        match self.fields(key)?.get(index) {
            Some(field) => field.sample_normal(pos),
            None => Ok(0.0),
        }
    }

    /// U(0, 1) value of field `index` in group `key` at `pos`
    pub fn sample_uniform(&mut self, key: FieldKey, index: usize, pos: &Point2) -> GscmResult<f64> {
        self.sample_normal(key, index, pos).map(gaussian_to_uniform)
    }
}

/// Longest correlation distance of any field the scenario can use
pub fn max_correlation_distance(scenario: Scenario, hall: &FactoryHall) -> f64 {
    let mut dmax = ScenarioParams::los_state_correlation_distance_m(scenario, hall);
    if scenario.supports_o2i() {
        dmax = dmax.max(ScenarioParams::O2I_CORRELATION_DISTANCE_M);
    }
    if let Some((_, d)) = ScenarioParams::absolute_delay(scenario) {
        dmax = dmax.max(d);
    }
    let conditions: &[Condition] = if scenario.supports_o2i() {
        &[Condition::Los, Condition::Nlos, Condition::O2i]
    } else {
        &[Condition::Los, Condition::Nlos]
    };
    for &condition in conditions {
        let row = ScenarioParams::nominal(scenario, condition, hall);
        for d in row.correlation_distance_m.iter().flatten() {
            dmax = dmax.max(*d);
        }
        dmax = dmax.max(ScenarioParams::cluster_correlation_distance_m(scenario, condition));
    }
    dmax
}

/// Source of the random variables of one link.
///
/// Keyed draws come from the spatial-consistency fields when a state is
/// attached, otherwise from the link generator. Unkeyed draws (ray
/// coupling, XPR, initial phases) always come from the link generator.
pub struct Randomness<'a> {
    rng: &'a mut StdRng,
    state: Option<&'a mut SpatialConsistencyState>,
    site: u32,
    floor: u32,
    position: Point2,
}

impl<'a> Randomness<'a> {
    /// Independent draws only
    pub fn independent(rng: &'a mut StdRng) -> Self {
        Self {
            rng,
            state: None,
            site: 0,
            floor: 0,
            position: [0.0, 0.0],
        }
    }

    /// Keyed draws from `state` for the link between `site` and a UE at `position`
    pub fn consistent(
        rng: &'a mut StdRng,
        state: &'a mut SpatialConsistencyState,
        site: u32,
        floor: u32,
        position: Point2,
    ) -> Self {
        Self {
            rng,
            state: Some(state),
            site,
            floor,
            position,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.state.is_some()
    }

    pub fn site(&self) -> u32 {
        self.site
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// Link generator for unkeyed draws
    pub fn rng(&mut self) -> &mut StdRng {
        &mut *self.rng
    }

    /// Standard normal draw for field `index` of group `key`
    pub fn normal(&mut self, key: FieldKey, index: usize) -> GscmResult<f64> {
        match self.state.as_deref_mut() {
            Some(state) => state.sample_normal(key, index, &self.position),
            None => Ok(self.rng.sample(StandardNormal)),
        }
    }

    /// U(0, 1) draw for field `index` of group `key`
    pub fn uniform(&mut self, key: FieldKey, index: usize) -> GscmResult<f64> {
        match self.state.as_deref_mut() {
            Some(state) => state.sample_uniform(key, index, &self.position),
            None => Ok(self.rng.gen::<f64>()),
        }
    }

    /// The seven LSP normals, in LSP order; only SF is drawn when `all` is false
    pub fn lsp_normals(&mut self, condition: Condition, all: bool) -> GscmResult<[f64; NUM_LSP]> {
        let key = FieldKey::Lsp {
            site: self.site,
            condition,
            floor: self.floor,
        };
        let count = if all { NUM_LSP } else { 1 };
        let mut z = [0.0; NUM_LSP];
        for (i, slot) in z.iter_mut().enumerate().take(count) {
            *slot = self.normal(key, i)?;
        }
        Ok(z)
    }

    /// Draw for cluster `n` of `quantity`, uniform for delays and signs, normal otherwise
    pub fn cluster(&mut self, condition: Condition, quantity: ClusterQuantity, n: usize) -> GscmResult<f64> {
        let key = FieldKey::Cluster {
            site: self.site,
            condition,
            quantity,
        };
        match quantity {
            ClusterQuantity::Delay | ClusterQuantity::Sign(_) => self.uniform(key, n),
            ClusterQuantity::Shadowing | ClusterQuantity::Offset(_) => self.normal(key, n),
        }
    }
}
