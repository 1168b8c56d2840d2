//! # Geometry-Based Stochastic Channel Core
//!
//! Numerical core of a 3GPP TR 38.901 style channel-link generator. Given
//! node geometry, carrier frequency and a deployment scenario it produces
//! large-scale parameters and per-cluster fast-fading parameters, either
//! from independent draws or from spatially correlated random fields so
//! that nearby links observe consistent channels.
//!
//! ## Overview
//!
//! - **Spatial grid**: rasterize the deployment area at 5 m resolution
//! - **Correlated fields**: exponential-kernel filtered white noise, sampled per position
//! - **Wrap-around**: toroidal site images for 3/7/19-site hexagonal layouts
//! - **Large-scale parameters**: shadow fading, K-factor, delay and angular spreads
//! - **Cluster parameters**: delays, powers, angles, ray coupling, XPR, phases
//!
//! ## Pipeline
//!
//! ```text
//! SpatialGrid → AutoCorrelationField → SpatialConsistencyState ─┐
//!                                                               ▼
//! geometry → ScenarioParams → LargeScaleParameterGenerator → ClusterParameterGenerator
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use gscm_core::{
//!     ClusterContext, ClusterParameterGenerator, Condition, FactoryHall, LargeScaleParameterGenerator,
//!     LinkGeometry, LosAngles, Randomness, Scenario, ScenarioParams,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let bs = [0.0, 0.0, 25.0];
//! let ue = [100.0, 50.0, 1.5];
//! let hall = FactoryHall::default();
//! let geom = LinkGeometry::new(&bs, &ue, 3.5e9);
//! let params = ScenarioParams::lookup(Scenario::UMa, Condition::Los, true, &geom, &hall);
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut draws = Randomness::independent(&mut rng);
//! let lsp = LargeScaleParameterGenerator::default().generate(&params, Condition::Los, &mut draws).unwrap();
//!
//! let ctx = ClusterContext {
//!     scenario: Scenario::UMa,
//!     params: &params,
//!     lsp: &lsp,
//!     los_angles: LosAngles::between(&bs, &ue),
//!     hall: &hall,
//! };
//! let ssp = ClusterParameterGenerator::new(false).generate(&ctx, &mut draws).unwrap();
//! assert_eq!(ssp.delays_s[0], 0.0);
//! ```

pub mod autocorrelation;
pub mod cluster;
pub mod config;
pub mod consistency;
pub mod los;
pub mod lsp;
pub mod matrix;
pub mod observe;
pub mod params;
pub mod pathloss;
pub mod scenario;
pub mod spatial_grid;
pub mod types;
pub mod wrap_around;

pub use autocorrelation::AutoCorrelationField;
pub use cluster::{ClusterContext, ClusterParameterGenerator, SmallScaleParams, CLUSTER_POWER_FLOOR_DB};
pub use config::{ConfigError, Extents, GscmConfig, RegistryConfig, ScenarioConfig};
pub use consistency::{AngleKind, ClusterQuantity, FieldKey, Randomness, SpatialConsistencyState};
pub use los::los_probability;
pub use lsp::{LargeScaleParameterGenerator, LargeScaleParams, MAX_AZIMUTH_SPREAD_DEG, MAX_ZENITH_SPREAD_DEG};
pub use params::{ScenarioParams, Stat, NUM_LSP};
pub use pathloss::{path_loss_db, BuildingType};
pub use scenario::{Condition, FactoryHall, Family, Scenario};
pub use spatial_grid::{SpatialGrid, GRID_RESOLUTION_M};
pub use types::{
    distance_2d, distance_3d, Complex, GscmError, GscmResult, LinkGeometry, LosAngles, Point2, Position,
    SPEED_OF_LIGHT,
};
