//! Link identities, requests and cached channels
//!
//! ```text
//! LinkRequest (tx → rx) ──► LinkKey ──► PhysicalLinkId ──► ChannelLink
//!                           directed     (bs, ue) for        cached in
//!                                        BS–UE, directed     downlink
//!                                        for same-role       orientation
//! ```

use gscm_core::{Complex, Condition, LargeScaleParams, SmallScaleParams};
use serde::{Deserialize, Serialize};

use crate::executor::ArrayFieldResponse;
use crate::large_scale::LargeScaleLoss;
use crate::node::{ArrayDescription, Node, NodeRole};

/// Ordered (source, destination) pair of node ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub source: u32,
    pub dest: u32,
}

impl LinkKey {
    pub fn new(source: u32, dest: u32) -> Self {
        Self { source, dest }
    }

    pub fn reversed(&self) -> Self {
        Self {
            source: self.dest,
            dest: self.source,
        }
    }
}

/// Transmission direction relative to the BS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// BS to UE, or the source-to-destination order of a same-role link
    Downlink,
    /// UE to BS
    Uplink,
}

impl Direction {
    pub fn index(&self) -> u64 {
        match self {
            Direction::Downlink => 0,
            Direction::Uplink => 1,
        }
    }
}

/// Canonical identity of a propagation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalLinkId {
    /// BS–UE link, identical for both directions
    Access { bs: u32, ue: u32 },
    /// BS–BS or UE–UE interferer link, one per direction
    SameRole { source: u32, dest: u32 },
}

impl PhysicalLinkId {
    /// Identity and direction of a transmission from `tx` to `rx`
    pub fn resolve(tx: &Node, rx: &Node) -> (Self, Direction) {
        match (tx.role, rx.role) {
            (NodeRole::Bs, NodeRole::Ue) => (PhysicalLinkId::Access { bs: tx.id, ue: rx.id }, Direction::Downlink),
            (NodeRole::Ue, NodeRole::Bs) => (PhysicalLinkId::Access { bs: rx.id, ue: tx.id }, Direction::Uplink),
            _ => (
                PhysicalLinkId::SameRole {
                    source: tx.id,
                    dest: rx.id,
                },
                Direction::Downlink,
            ),
        }
    }

    pub fn is_same_role(&self) -> bool {
        matches!(self, PhysicalLinkId::SameRole { .. })
    }

    /// Ends in downlink orientation
    pub fn ends(&self) -> (u32, u32) {
        match *self {
            PhysicalLinkId::Access { bs, ue } => (bs, ue),
            PhysicalLinkId::SameRole { source, dest } => (source, dest),
        }
    }
}

/// One packet transmission the simulator needs a channel for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub transmitter: u32,
    pub receiver: u32,
    pub center_frequency_hz: f64,
    pub num_tx: usize,
    pub num_rx: usize,
    pub start_time_s: f64,
    pub duration_s: f64,
}

impl LinkRequest {
    pub fn new(transmitter: u32, receiver: u32, center_frequency_hz: f64, num_tx: usize, num_rx: usize) -> Self {
        Self {
            transmitter,
            receiver,
            center_frequency_hz,
            num_tx,
            num_rx,
            start_time_s: 0.0,
            duration_s: 0.0,
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.transmitter, self.receiver)
    }

    /// The same transmission in the opposite direction
    pub fn reversed(&self) -> Self {
        Self {
            transmitter: self.receiver,
            receiver: self.transmitter,
            num_tx: self.num_rx,
            num_rx: self.num_tx,
            ..self.clone()
        }
    }
}

/// Slot of a channel in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub usize);

/// A realized channel, stored in downlink orientation
#[derive(Debug, Clone)]
pub struct ChannelLink {
    pub physical: PhysicalLinkId,
    pub center_frequency_hz: f64,
    /// Antennas at the BS end (downlink transmitter)
    pub num_tx: usize,
    /// Antennas at the UE end
    pub num_rx: usize,
    pub condition: Condition,
    pub large_scale_params: LargeScaleParams,
    pub large_scale: LargeScaleLoss,
    pub small_scale: Option<SmallScaleParams>,
    /// One filter per cluster, delay taps at the executor sample rate
    pub path_filters: Vec<Vec<f64>>,
    /// Grid pixel of the UE end when spatial consistency is on
    pub grid_subscripts: Option<(usize, usize)>,
}

impl ChannelLink {
    pub fn swap_direction(&mut self) {
        self.large_scale.swap_direction();
    }

    pub fn is_swapped(&self) -> bool {
        self.large_scale.is_swapped()
    }

    /// Whether this channel can serve `request` in the opposite direction
    pub fn matches_transposed(&self, request: &LinkRequest) -> bool {
        self.center_frequency_hz == request.center_frequency_hz
            && self.num_tx == request.num_rx
            && self.num_rx == request.num_tx
    }

    /// Antenna counts `(num_tx, num_rx)` in the current orientation
    pub fn oriented_antennas(&self) -> (usize, usize) {
        if self.is_swapped() {
            (self.num_rx, self.num_tx)
        } else {
            (self.num_tx, self.num_rx)
        }
    }
}

/// Channel handed to the executor, in the orientation of the request
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDescriptor {
    pub id: ChannelId,
    pub center_frequency_hz: f64,
    pub num_tx: usize,
    pub num_rx: usize,
    pub condition: Condition,
    pub swapped: bool,
    pub large_scale_params: LargeScaleParams,
    /// Large-scale loss at the node positions of the request
    pub loss_db: f64,
    pub cluster_delays_s: Vec<f64>,
    pub cluster_powers: Vec<f64>,
    pub aoa_deg: Vec<f64>,
    pub aod_deg: Vec<f64>,
    pub zoa_deg: Vec<f64>,
    pub zod_deg: Vec<f64>,
    /// Per cluster, the AoA-ray index coupled with AoD, ZoA and ZoD ray `m`
    pub ray_coupling: Vec<[Vec<usize>; 3]>,
    /// `[cluster][AoA ray]`, like the initial phases
    pub xpr_db: Vec<Vec<f64>>,
    pub initial_phases_deg: Vec<Vec<[f64; 4]>>,
    pub path_filters: Vec<Vec<f64>>,
}

impl ChannelDescriptor {
    pub(crate) fn from_link(id: ChannelId, link: &ChannelLink, loss_db: f64) -> Self {
        let swapped = link.is_swapped();
        let (num_tx, num_rx) = link.oriented_antennas();
        let mut descriptor = Self {
            id,
            center_frequency_hz: link.center_frequency_hz,
            num_tx,
            num_rx,
            condition: link.condition,
            swapped,
            large_scale_params: link.large_scale_params.clone(),
            loss_db,
            cluster_delays_s: Vec::new(),
            cluster_powers: Vec::new(),
            aoa_deg: Vec::new(),
            aod_deg: Vec::new(),
            zoa_deg: Vec::new(),
            zod_deg: Vec::new(),
            ray_coupling: Vec::new(),
            xpr_db: Vec::new(),
            initial_phases_deg: Vec::new(),
            path_filters: link.path_filters.clone(),
        };

        if let Some(ssp) = &link.small_scale {
            descriptor.cluster_delays_s = ssp.delays_s.clone();
            descriptor.cluster_powers = ssp.powers.clone();
            if swapped {
                // Arrival and departure trade places; rays are re-indexed by the
                // former AoD ray and the cross-polar phases swap
                descriptor.aoa_deg = ssp.aod_deg.clone();
                descriptor.aod_deg = ssp.aoa_deg.clone();
                descriptor.zoa_deg = ssp.zod_deg.clone();
                descriptor.zod_deg = ssp.zoa_deg.clone();
                descriptor.ray_coupling = ssp.ray_coupling.iter().map(reversed_coupling).collect();
                descriptor.xpr_db = ssp
                    .xpr_db
                    .iter()
                    .zip(&ssp.ray_coupling)
                    .map(|(xpr, [aoa_of_aod, _, _])| aoa_of_aod.iter().map(|&a| xpr[a]).collect())
                    .collect();
                descriptor.initial_phases_deg = ssp
                    .initial_phases_deg
                    .iter()
                    .zip(&ssp.ray_coupling)
                    .map(|(rays, [aoa_of_aod, _, _])| {
                        aoa_of_aod
                            .iter()
                            .map(|&a| {
                                let [tt, tp, pt, pp] = rays[a];
                                [tt, pt, tp, pp]
                            })
                            .collect()
                    })
                    .collect();
            } else {
                descriptor.aoa_deg = ssp.aoa_deg.clone();
                descriptor.aod_deg = ssp.aod_deg.clone();
                descriptor.zoa_deg = ssp.zoa_deg.clone();
                descriptor.zod_deg = ssp.zod_deg.clone();
                descriptor.ray_coupling = ssp.ray_coupling.clone();
                descriptor.xpr_db = ssp.xpr_db.clone();
                descriptor.initial_phases_deg = ssp.initial_phases_deg.clone();
            }
        }
        descriptor
    }

    pub fn num_clusters(&self) -> usize {
        self.cluster_powers.len()
    }

    pub fn has_small_scale(&self) -> bool {
        !self.cluster_powers.is_empty()
    }

    /// Narrowband gain of each cluster centre direction:
    /// `√Pₙ · F_tx(AoDₙ, ZoDₙ) · F_rx(AoAₙ, ZoAₙ)`
    pub fn cluster_gains(
        &self,
        response: &dyn ArrayFieldResponse,
        tx_array: &ArrayDescription,
        rx_array: &ArrayDescription,
    ) -> Vec<Complex> {
        (0..self.num_clusters())
            .map(|n| {
                let tx = response.field(tx_array, self.aod_deg[n], self.zod_deg[n]);
                let rx = response.field(rx_array, self.aoa_deg[n], self.zoa_deg[n]);
                tx * rx * self.cluster_powers[n].sqrt()
            })
            .collect()
    }
}

/// Ray coupling of one cluster seen from the other end.
///
/// `perms` maps AoD, ZoA and ZoD rays to the AoA ray they belong to. After
/// the swap the former AoD rays index the rays, so the new AoD coupling is the
/// inverse permutation and the new zenith couplings go through the former AoA ray.
fn reversed_coupling(perms: &[Vec<usize>; 3]) -> [Vec<usize>; 3] {
    let [aoa_of_aod, aoa_of_zoa, aoa_of_zod] = perms;
    let mut aod_of_aoa = vec![0; aoa_of_aod.len()];
    for (m, &a) in aoa_of_aod.iter().enumerate() {
        aod_of_aoa[a] = m;
    }
    let through = |p: &Vec<usize>| -> Vec<usize> { p.iter().map(|&a| aod_of_aoa[a]).collect() };
    [aod_of_aoa.clone(), through(aoa_of_zod), through(aoa_of_zoa)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_link_ignores_direction() {
        let bs = Node::bs(1, [0.0, 0.0, 25.0]);
        let ue = Node::ue(9, [50.0, 0.0, 1.5]);
        let (down, d) = PhysicalLinkId::resolve(&bs, &ue);
        let (up, u) = PhysicalLinkId::resolve(&ue, &bs);
        assert_eq!(down, up);
        assert_eq!(down.ends(), (1, 9));
        assert_eq!((d, u), (Direction::Downlink, Direction::Uplink));
    }

    #[test]
    fn test_same_role_link_is_directed() {
        let a = Node::bs(1, [0.0; 3]);
        let b = Node::bs(2, [10.0, 0.0, 0.0]);
        let (ab, _) = PhysicalLinkId::resolve(&a, &b);
        let (ba, _) = PhysicalLinkId::resolve(&b, &a);
        assert_ne!(ab, ba);
        assert!(ab.is_same_role());
    }

    #[test]
    fn test_reversed_coupling() {
        let perms = [vec![2, 0, 3, 1], vec![1, 3, 0, 2], vec![0, 2, 1, 3]];
        let rev = reversed_coupling(&perms);
        // Former AoA ray 2 pairs with former AoD ray 0
        assert_eq!(rev[0], vec![1, 3, 0, 2]);
        // Former ZoD ray 1 sits on AoA ray 2, i.e. former AoD ray 0
        assert_eq!(rev[1][1], 0);
        assert_eq!(reversed_coupling(&rev), perms);
    }

    #[test]
    fn test_request_reversed() {
        let req = LinkRequest::new(1, 2, 3.5e9, 4, 2);
        let rev = req.reversed();
        assert_eq!(rev.key(), req.key().reversed());
        assert_eq!((rev.num_tx, rev.num_rx), (2, 4));
        assert_eq!(rev.reversed(), req);
    }
}
