//! Node records
//!
//! Snapshots of the base stations and user terminals supplied by the
//! topology owner. The registry reads them; it never moves or edits a node
//! on its own.

use gscm_core::{Point2, Position};
use serde::{Deserialize, Serialize};

/// Role of a node in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Base station (one sector of a site)
    Bs,
    /// User terminal
    Ue,
}

/// Antenna array and its mapping onto transceiver units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDescription {
    /// Elements per column
    pub rows: usize,
    /// Elements per row
    pub cols: usize,
    /// Element spacing in wavelengths
    pub spacing: f64,
    /// Cross-polarised elements
    pub dual_polarized: bool,
    /// Mechanical boresight azimuth in degrees
    pub bearing_deg: f64,
    /// Mechanical downtilt in degrees
    pub downtilt_deg: f64,
    /// Elements combined into one transceiver unit
    pub virtualization: usize,
}

impl Default for ArrayDescription {
    fn default() -> Self {
        Self {
            rows: 1,
            cols: 1,
            spacing: 0.5,
            dual_polarized: false,
            bearing_deg: 0.0,
            downtilt_deg: 0.0,
            virtualization: 1,
        }
    }
}

impl ArrayDescription {
    /// Physical antenna elements, counting both polarisations
    pub fn num_elements(&self) -> usize {
        let pol = if self.dual_polarized { 2 } else { 1 };
        self.rows * self.cols * pol
    }
}

/// A base station or user terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub role: NodeRole,
    /// Antenna position in metres
    pub position: Position,
    pub num_antennas: usize,
    pub array: ArrayDescription,
    /// Floor index of an indoor terminal
    pub floor: u32,
    /// Terminal sits inside a building
    pub indoor: bool,
    /// Horizontal distance behind the outer wall, drawn when absent
    pub indoor_depth_m: Option<f64>,
    /// Site shared by co-located sectors; BSs without one are grouped by position
    pub site: Option<u32>,
}

impl Node {
    /// Outdoor base station with a single antenna
    pub fn bs(id: u32, position: Position) -> Self {
        Self {
            id,
            role: NodeRole::Bs,
            position,
            num_antennas: 1,
            array: ArrayDescription::default(),
            floor: 0,
            indoor: false,
            indoor_depth_m: None,
            site: None,
        }
    }

    /// Outdoor user terminal with a single antenna
    pub fn ue(id: u32, position: Position) -> Self {
        Self {
            role: NodeRole::Ue,
            ..Self::bs(id, position)
        }
    }

    pub fn with_antennas(mut self, num_antennas: usize) -> Self {
        self.num_antennas = num_antennas;
        self
    }

    pub fn with_site(mut self, site: u32) -> Self {
        self.site = Some(site);
        self
    }

    pub fn indoors(mut self, floor: u32, depth_m: Option<f64>) -> Self {
        self.indoor = true;
        self.floor = floor;
        self.indoor_depth_m = depth_m;
        self
    }

    pub fn is_bs(&self) -> bool {
        self.role == NodeRole::Bs
    }

    /// Ground-plane position
    pub fn xy(&self) -> Point2 {
        [self.position[0], self.position[1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let ue = Node::ue(7, [1.0, 2.0, 1.5]).with_antennas(2).indoors(3, Some(4.0));
        assert_eq!(ue.role, NodeRole::Ue);
        assert!(!ue.is_bs());
        assert_eq!(ue.num_antennas, 2);
        assert!(ue.indoor);
        assert_eq!(ue.floor, 3);
        assert_eq!(ue.xy(), [1.0, 2.0]);
    }

    #[test]
    fn test_array_elements() {
        let array = ArrayDescription {
            rows: 4,
            cols: 8,
            dual_polarized: true,
            ..Default::default()
        };
        assert_eq!(array.num_elements(), 64);
    }
}
