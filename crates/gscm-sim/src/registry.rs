//! Link registry
//!
//! Maps transmitter/receiver pairs to cached channels. BS–UE channels are
//! generated once in downlink orientation and shared with the opposite
//! direction when carrier and antenna counts agree; a swap flag on the
//! shared channel tracks which direction was asked for last.
//!
//! ```text
//!            ┌──────────── request (tx → rx) ────────────┐
//!            ▼                                           │
//!   cached for this direction? ── yes ──► orient ──► ChannelId
//!            │ no                                        ▲
//!            ▼                                           │
//!   cached for the reverse, same carrier ── yes ─────────┤
//!   and transposed antennas (BS–UE only)?                │
//!            │ no                                        │
//!            ▼                                           │
//!   ScenarioCache (rebuilt on new site positions)        │
//!            ▼                                           │
//!   LOS state → LSPs → clusters → path filters ──────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use gscm_core::consistency::{FieldKey, Randomness, SpatialConsistencyState};
use gscm_core::pathloss::{max_indoor_distance_m, o2i_penetration_db, BuildingType};
use gscm_core::wrap_around::{self, nearest_image};
use gscm_core::{
    los_probability, ClusterContext, ClusterParameterGenerator, Condition, Extents, GscmConfig, GscmError,
    GscmResult, LargeScaleParameterGenerator, LinkGeometry, LosAngles, Point2, Position, RegistryConfig,
    Scenario, ScenarioConfig, ScenarioParams,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::{debug, trace, warn};

use crate::executor::{ChannelExecutor, SincPathFilter};
use crate::large_scale::LargeScaleLoss;
use crate::layout::{hex_sites, infer_extents};
use crate::link::{ChannelDescriptor, ChannelId, ChannelLink, Direction, LinkKey, LinkRequest, PhysicalLinkId};
use crate::node::{Node, NodeRole};

/// Snapshot of the scenario the cached fields were built for
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioInfo {
    pub scenario: Scenario,
    pub inter_site_distance_m: Option<f64>,
    pub wrapping: bool,
    pub spatial_consistency: bool,
    pub num_bs: usize,
    pub num_ue: usize,
    pub max_bs_id: Option<u32>,
    pub max_link_id: Option<u32>,
    /// One position per site, ordered by site id
    pub site_positions: Vec<(u32, Position)>,
}

impl ScenarioInfo {
    fn collect(config: &ScenarioConfig, nodes: &HashMap<u32, Node>) -> Self {
        let mut info = Self {
            scenario: config.scenario,
            inter_site_distance_m: config.inter_site_distance_m,
            wrapping: config.wrap_around,
            spatial_consistency: config.spatial_consistency,
            num_bs: 0,
            num_ue: 0,
            max_bs_id: None,
            max_link_id: None,
            site_positions: site_positions(nodes),
        };
        info.refresh_counts(nodes);
        info
    }

    fn refresh_counts(&mut self, nodes: &HashMap<u32, Node>) {
        self.num_bs = nodes.values().filter(|n| n.is_bs()).count();
        self.num_ue = nodes.len() - self.num_bs;
        self.max_bs_id = nodes.values().filter(|n| n.is_bs()).map(|n| n.id).max();
        self.max_link_id = nodes.keys().copied().max();
    }
}

/// Site of every BS.
///
/// An explicit `site` wins; otherwise sectors at the same position share
/// the site named by their lowest id.
fn site_assignments(nodes: &HashMap<u32, Node>) -> HashMap<u32, u32> {
    let mut bs: Vec<&Node> = nodes.values().filter(|n| n.is_bs()).collect();
    bs.sort_by_key(|n| n.id);
    let mut by_position: HashMap<[u64; 3], u32> = HashMap::new();
    bs.into_iter()
        .map(|n| {
            let site = match n.site {
                Some(site) => site,
                None => *by_position.entry(n.position.map(f64::to_bits)).or_insert(n.id),
            };
            (n.id, site)
        })
        .collect()
}

/// BS positions per site; the lowest sector id represents a site
fn site_positions(nodes: &HashMap<u32, Node>) -> Vec<(u32, Position)> {
    let mut sites: BTreeMap<u32, (u32, Position)> = BTreeMap::new();
    for (id, site) in site_assignments(nodes) {
        let position = nodes[&id].position;
        let entry = sites.entry(site).or_insert((id, position));
        if id < entry.0 {
            *entry = (id, position);
        }
    }
    sites.into_iter().map(|(site, (_, pos))| (site, pos)).collect()
}

/// Per-scenario state shared by every link
#[derive(Debug)]
pub struct ScenarioCache {
    info: ScenarioInfo,
    /// Wrap-around images, `[0, 0]` first
    offsets: Vec<Point2>,
    extents: Option<Extents>,
    consistency: Option<SpatialConsistencyState>,
}

impl ScenarioCache {
    pub fn build(config: &ScenarioConfig, nodes: &HashMap<u32, Node>) -> GscmResult<Self> {
        let info = ScenarioInfo::collect(config, nodes);
        if info.num_bs == 0 {
            warn!(scenario = %config.scenario, "scenario has no base stations");
        }
        if info.num_ue == 0 {
            warn!(scenario = %config.scenario, "scenario has no user terminals");
        }

        let offsets = match (config.wrap_around, config.inter_site_distance_m) {
            (true, Some(isd)) => wrap_around::offsets(isd, config.num_sites, config.num_sectors)?,
            (true, None) => {
                return Err(GscmError::Config("wrap-around requires an inter-site distance".to_string()))
            }
            (false, _) => vec![[0.0, 0.0]],
        };

        let extents = match (config.extents, config.inter_site_distance_m) {
            (Some(ext), _) => Some(ext),
            (None, Some(isd)) => {
                let mut sites: Vec<Point2> = info.site_positions.iter().map(|(_, p)| [p[0], p[1]]).collect();
                if sites.is_empty() {
                    sites = hex_sites(isd, config.num_sites)?;
                }
                Some(infer_extents(&sites, isd)?)
            }
            (None, None) => None,
        };

        let consistency = if config.spatial_consistency {
            let ext = extents.ok_or_else(|| {
                GscmError::EmptyExtents("spatial consistency needs scenario extents".to_string())
            })?;
            Some(SpatialConsistencyState::new(
                config.scenario,
                config.factory_hall,
                config.seed,
                ext.min,
                ext.max,
            )?)
        } else {
            None
        };

        debug!(
            scenario = %config.scenario,
            sites = info.site_positions.len(),
            images = offsets.len(),
            spatial_consistency = consistency.is_some(),
            "scenario cache built"
        );
        Ok(Self {
            info,
            offsets,
            extents,
            consistency,
        })
    }

    pub fn info(&self) -> &ScenarioInfo {
        &self.info
    }

    pub fn offsets(&self) -> &[Point2] {
        &self.offsets
    }

    pub fn extents(&self) -> Option<Extents> {
        self.extents
    }

    pub fn consistency(&self) -> Option<&SpatialConsistencyState> {
        self.consistency.as_ref()
    }
}

/// Owner of every realized channel of a simulation
pub struct LinkRegistry {
    scenario: ScenarioConfig,
    options: RegistryConfig,
    nodes: HashMap<u32, Node>,
    links: Vec<ChannelLink>,
    index: HashMap<LinkKey, ChannelId>,
    cache: Option<ScenarioCache>,
    executor: Box<dyn ChannelExecutor>,
}

impl fmt::Debug for LinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkRegistry")
            .field("scenario", &self.scenario.scenario)
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl LinkRegistry {
    /// Registry for a validated configuration, with sinc path filters
    pub fn new(config: &GscmConfig) -> GscmResult<Self> {
        config.validate()?;
        let options = config.registry.clone();
        let executor = SincPathFilter::new(options.filter_sample_rate_hz, options.filter_half_length);
        Ok(Self {
            scenario: config.scenario.clone(),
            options,
            nodes: HashMap::new(),
            links: Vec::new(),
            index: HashMap::new(),
            cache: None,
            executor: Box::new(executor),
        })
    }

    /// Replace the path-filter builder
    pub fn with_executor(mut self, executor: impl ChannelExecutor + 'static) -> Self {
        self.executor = Box::new(executor);
        self
    }

    /// Replace the node snapshot
    pub fn attach_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) {
        self.nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        debug!(nodes = self.nodes.len(), "nodes attached");
    }

    /// Insert or replace one node
    pub fn update_node(&mut self, node: Node) {
        self.nodes.insert(node.id, node);
    }

    pub fn node(&self, id: u32) -> GscmResult<&Node> {
        self.nodes.get(&id).ok_or(GscmError::UnknownNode(id))
    }

    /// Rebuild the scenario cache from the current nodes.
    ///
    /// Realized channels are kept; correlated fields are discarded.
    pub fn reconfigure(&mut self) -> GscmResult<()> {
        let cache = ScenarioCache::build(&self.scenario, &self.nodes)?;
        self.cache = Some(cache);
        Ok(())
    }

    /// Switch to a new scenario configuration, dropping every channel
    pub fn set_scenario(&mut self, scenario: ScenarioConfig) -> GscmResult<()> {
        let config = GscmConfig {
            scenario,
            registry: self.options.clone(),
            ..Default::default()
        };
        config.validate()?;
        let cache = ScenarioCache::build(&config.scenario, &self.nodes)?;
        self.scenario = config.scenario;
        self.links.clear();
        self.index.clear();
        self.cache = Some(cache);
        Ok(())
    }

    pub fn scenario_config(&self) -> &ScenarioConfig {
        &self.scenario
    }

    pub fn options(&self) -> &RegistryConfig {
        &self.options
    }

    pub fn scenario_info(&self) -> Option<&ScenarioInfo> {
        self.cache.as_ref().map(|c| &c.info)
    }

    pub fn cache(&self) -> Option<&ScenarioCache> {
        self.cache.as_ref()
    }

    /// Number of distinct channel objects
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, id: ChannelId) -> Option<&ChannelLink> {
        self.links.get(id.0)
    }

    /// Channel currently serving `key`, if any
    pub fn lookup(&self, key: &LinkKey) -> Option<ChannelId> {
        self.index.get(key).copied()
    }

    /// Channel for `request`, reusing or generating as needed.
    ///
    /// On error nothing cached is changed.
    pub fn resolve(&mut self, request: &LinkRequest) -> GscmResult<ChannelId> {
        let tx = self.node(request.transmitter)?.clone();
        let rx = self.node(request.receiver)?.clone();
        let key = request.key();
        let (physical, direction) = PhysicalLinkId::resolve(&tx, &rx);

        if let Some(id) = self.lookup(&key) {
            self.orient(id, direction);
            trace!(source = key.source, dest = key.dest, channel = id.0, "cached channel");
            return Ok(id);
        }

        if !physical.is_same_role() {
            if let Some(id) = self.lookup(&key.reversed()) {
                if self.links[id.0].matches_transposed(request) {
                    self.index.insert(key, id);
                    self.orient(id, direction);
                    debug!(source = key.source, dest = key.dest, channel = id.0, "reciprocal channel reused");
                    return Ok(id);
                }
                debug!(
                    source = key.source,
                    dest = key.dest,
                    "reverse channel differs in carrier or antennas; generating a new one"
                );
            }
        }

        self.ensure_cache()?;
        let link = self.generate(&tx, &rx, physical, direction, request)?;
        let id = ChannelId(self.links.len());
        debug!(
            source = key.source,
            dest = key.dest,
            channel = id.0,
            condition = ?link.condition,
            clusters = link.small_scale.as_ref().map_or(0, |s| s.num_clusters),
            "channel realized"
        );
        self.links.push(link);
        self.index.insert(key, id);
        self.orient(id, direction);
        Ok(id)
    }

    /// Resolve `request` and present the channel in its orientation
    pub fn descriptor(&mut self, request: &LinkRequest) -> GscmResult<ChannelDescriptor> {
        let id = self.resolve(request)?;
        let tx = self.node(request.transmitter)?.position;
        let rx = self.node(request.receiver)?.position;
        let link = &mut self.links[id.0];
        let loss_db = link.large_scale.execute(&tx, &rx, request.center_frequency_hz);
        Ok(ChannelDescriptor::from_link(id, link, loss_db))
    }

    fn orient(&mut self, id: ChannelId, direction: Direction) {
        let link = &mut self.links[id.0];
        if link.is_swapped() != (direction == Direction::Uplink) {
            link.swap_direction();
        }
    }

    /// Build the scenario cache, or rebuild it when the site positions moved
    fn ensure_cache(&mut self) -> GscmResult<()> {
        let sites = site_positions(&self.nodes);
        let stale = match &self.cache {
            Some(cache) => cache.info.site_positions != sites,
            None => true,
        };
        if stale {
            if self.cache.is_some() {
                debug!(sites = sites.len(), "site positions changed; discarding correlated fields");
            }
            return self.reconfigure();
        }
        if let Some(cache) = self.cache.as_mut() {
            cache.info.refresh_counts(&self.nodes);
        }
        Ok(())
    }

    /// Realize a channel in downlink orientation
    fn generate(
        &mut self,
        tx: &Node,
        rx: &Node,
        physical: PhysicalLinkId,
        direction: Direction,
        request: &LinkRequest,
    ) -> GscmResult<ChannelLink> {
        let Self {
            scenario: config,
            options,
            nodes,
            cache,
            executor,
            ..
        } = self;
        let cache = cache
            .as_mut()
            .ok_or_else(|| GscmError::Config("scenario cache not built".to_string()))?;

        let (bs, ue) = match direction {
            Direction::Downlink => (tx, rx),
            Direction::Uplink => (rx, tx),
        };
        let (num_tx, num_rx) = match direction {
            Direction::Downlink => (request.num_tx, request.num_rx),
            Direction::Uplink => (request.num_rx, request.num_tx),
        };

        // Validate before a single draw so a rejected request builds no fields
        let bounded = config.spatial_consistency || config.inter_site_distance_m.is_some();
        if let (true, Some(ext)) = (bounded, cache.extents) {
            for node in [bs, ue].into_iter().filter(|n| n.role == NodeRole::Ue) {
                let [x, y] = node.xy();
                if x < ext.min[0] || x > ext.max[0] || y < ext.min[1] || y > ext.max[1] {
                    return Err(GscmError::OutOfBoundary { x, y });
                }
            }
        }

        let scenario = config.scenario;
        let hall = config.factory_hall;
        let offsets = if bs.is_bs() { cache.offsets.clone() } else { vec![[0.0, 0.0]] };
        let (bs_image, _) = nearest_image(&bs.position, &ue.position, &offsets);
        let geom = LinkGeometry::new(&bs_image, &ue.position, request.center_frequency_hz);
        let ue_xy = ue.xy();
        let site = site_assignments(nodes).get(&bs.id).copied().unwrap_or(bs.id);

        // Correlated fields describe BS–UE links only; interferer links draw independently
        let mut rng = StdRng::seed_from_u64(link_seed(config.seed, bs.id, ue.id, direction));
        let mut draws = match cache.consistency.as_mut() {
            Some(state) if !physical.is_same_role() => {
                Randomness::consistent(&mut rng, state, site, ue.floor, ue_xy)
            }
            _ => Randomness::independent(&mut rng),
        };

        let los = match options.los_override {
            Some(forced) => forced,
            None => {
                let p = los_probability(scenario, &geom, &hall);
                draws.uniform(FieldKey::LosState { site }, 0)? < p
            }
        };
        let o2i = ue.role == NodeRole::Ue && ue.indoor && scenario.supports_o2i();
        let condition = match (o2i, los) {
            (true, _) => Condition::O2i,
            (false, true) => Condition::Los,
            (false, false) => Condition::Nlos,
        };
        let params = ScenarioParams::lookup(scenario, condition, los, &geom, &hall);

        let penetration_db = if o2i {
            let building = BuildingType::from_uniform(scenario, draws.uniform(FieldKey::BuildingType, 0)?);
            let depth = match ue.indoor_depth_m {
                Some(d) => d,
                None => {
                    let u = draws
                        .uniform(FieldKey::IndoorDistance, 0)?
                        .min(draws.uniform(FieldKey::IndoorDistance, 1)?);
                    max_indoor_distance_m(scenario) * u
                }
            };
            let spread = building.sigma_db() * draws.rng().sample::<f64, _>(StandardNormal);
            o2i_penetration_db(building, geom.fc_ghz, depth) + spread
        } else {
            0.0
        };

        let lsp = LargeScaleParameterGenerator::new(options.fast_fading).generate(&params, condition, &mut draws)?;

        let wants_small_scale = options.fast_fading && (!physical.is_same_role() || options.interferer_small_scale);
        let small_scale = if wants_small_scale {
            let ctx = ClusterContext {
                scenario,
                params: &params,
                lsp: &lsp,
                los_angles: LosAngles::between(&bs_image, &ue.position),
                hall: &hall,
            };
            Some(ClusterParameterGenerator::new(config.absolute_delay).generate(&ctx, &mut draws)?)
        } else {
            None
        };

        let grid_subscripts = cache
            .consistency
            .as_ref()
            .filter(|_| !physical.is_same_role())
            .and_then(|s| s.grid().to_pixel(&ue_xy).ok());
        let path_filters = small_scale
            .as_ref()
            .map(|s| executor.path_filters(&s.delays_s))
            .unwrap_or_default();
        let large_scale = LargeScaleLoss::new(scenario, los, lsp.sf_db, penetration_db, offsets);

        Ok(ChannelLink {
            physical,
            center_frequency_hz: request.center_frequency_hz,
            num_tx,
            num_rx,
            condition,
            large_scale_params: lsp,
            large_scale,
            small_scale,
            path_filters,
            grid_subscripts,
        })
    }
}

/// Seed of the generator behind one channel
fn link_seed(seed: u64, bs: u32, ue: u32, direction: Direction) -> u64 {
    [bs as u64, ue as u64, direction.index()]
        .iter()
        .fold(seed ^ 0x6a09_e667_f3bc_c909, |acc, &w| mix64(acc ^ w))
}

#[inline]
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
