//! # Channel-Link Registry for Network Simulation
//!
//! Simulator-facing side of the channel engine. A network simulator hands
//! over its node snapshot and asks, per packet, for the channel between a
//! transmitter and a receiver; the registry returns a cached realization or
//! generates one with `gscm-core`.
//!
//! ## Features
//!
//! - One channel per physical BS–UE link, shared by uplink and downlink
//!   when carrier and antenna counts agree
//! - Independent channels for BS–BS and UE–UE interferer links
//! - Spatially consistent fields rebuilt when the site positions change
//! - Wrap-around of the BS end for regular hexagonal layouts
//!
//! ## Example
//!
//! ```rust,no_run
//! use gscm_core::GscmConfig;
//! use gscm_sim::{LinkRegistry, LinkRequest, Node};
//!
//! let mut registry = LinkRegistry::new(&GscmConfig::default()).unwrap();
//! registry.attach_nodes([
//!     Node::bs(0, [0.0, 0.0, 25.0]).with_antennas(4),
//!     Node::ue(1, [120.0, 40.0, 1.5]),
//! ]);
//!
//! let down = registry.descriptor(&LinkRequest::new(0, 1, 3.5e9, 4, 1)).unwrap();
//! let up = registry.descriptor(&LinkRequest::new(1, 0, 3.5e9, 1, 4)).unwrap();
//! assert_eq!(down.id, up.id);
//! println!("loss {:.1} dB over {} clusters", down.loss_db, down.num_clusters());
//! ```

pub mod executor;
pub mod large_scale;
pub mod layout;
pub mod link;
pub mod node;
pub mod registry;

pub use executor::{ArrayFieldResponse, ChannelExecutor, IsotropicArray, SincPathFilter};
pub use large_scale::LargeScaleLoss;
pub use layout::{hex_sites, infer_extents};
pub use link::{ChannelDescriptor, ChannelId, ChannelLink, Direction, LinkKey, LinkRequest, PhysicalLinkId};
pub use node::{ArrayDescription, Node, NodeRole};
pub use registry::{LinkRegistry, ScenarioCache, ScenarioInfo};
