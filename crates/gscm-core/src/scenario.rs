//! Deployment scenarios and propagation conditions
//!
//! Every scenario-dependent branch in the crate matches on [`Scenario`], so
//! adding a variant is a compile error everywhere a table row is missing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::GscmError;

/// Deployment scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Urban micro, street canyon
    #[serde(rename = "UMi")]
    UMi,
    /// Urban macro
    #[serde(rename = "UMa")]
    UMa,
    /// Rural macro
    #[serde(rename = "RMa")]
    RMa,
    /// Indoor hotspot, mixed office
    #[serde(rename = "InH-Mixed")]
    InHMixed,
    /// Indoor hotspot, open office
    #[serde(rename = "InH-Open")]
    InHOpen,
    /// Indoor factory, sparse clutter, low BS
    #[serde(rename = "InF-SL")]
    InFSL,
    /// Indoor factory, dense clutter, low BS
    #[serde(rename = "InF-DL")]
    InFDL,
    /// Indoor factory, sparse clutter, high BS
    #[serde(rename = "InF-SH")]
    InFSH,
    /// Indoor factory, dense clutter, high BS
    #[serde(rename = "InF-DH")]
    InFDH,
    /// Indoor factory, high TX and high RX
    #[serde(rename = "InF-HH")]
    InFHH,
}

/// Scenario family sharing one row set of the LSP table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    UMi,
    UMa,
    RMa,
    InH,
    InF,
}

impl Scenario {
    /// All supported scenarios
    pub const ALL: [Scenario; 10] = [
        Scenario::UMi,
        Scenario::UMa,
        Scenario::RMa,
        Scenario::InHMixed,
        Scenario::InHOpen,
        Scenario::InFSL,
        Scenario::InFDL,
        Scenario::InFSH,
        Scenario::InFDH,
        Scenario::InFHH,
    ];

    /// Canonical scenario name
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::UMi => "UMi",
            Scenario::UMa => "UMa",
            Scenario::RMa => "RMa",
            Scenario::InHMixed => "InH-Mixed",
            Scenario::InHOpen => "InH-Open",
            Scenario::InFSL => "InF-SL",
            Scenario::InFDL => "InF-DL",
            Scenario::InFSH => "InF-SH",
            Scenario::InFDH => "InF-DH",
            Scenario::InFHH => "InF-HH",
        }
    }

    /// Parameter-table family
    pub fn family(&self) -> Family {
        match self {
            Scenario::UMi => Family::UMi,
            Scenario::UMa => Family::UMa,
            Scenario::RMa => Family::RMa,
            Scenario::InHMixed | Scenario::InHOpen => Family::InH,
            Scenario::InFSL
            | Scenario::InFDL
            | Scenario::InFSH
            | Scenario::InFDH
            | Scenario::InFHH => Family::InF,
        }
    }

    /// Whether UEs may be located inside buildings (outdoor-to-indoor links)
    pub fn supports_o2i(&self) -> bool {
        matches!(self.family(), Family::UMi | Family::UMa | Family::RMa)
    }

    /// Whether the scenario is an indoor deployment
    pub fn is_indoor(&self) -> bool {
        matches!(self.family(), Family::InH | Family::InF)
    }

    /// Lowest carrier frequency (GHz) at which the tables are evaluated.
    ///
    /// Carriers below this value use the value at the limit.
    pub fn min_table_frequency_ghz(&self) -> f64 {
        match self.family() {
            Family::UMi => 2.0,
            Family::UMa | Family::InH => 6.0,
            Family::RMa | Family::InF => 0.0,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = GscmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .iter()
            .find(|sc| sc.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| GscmError::InvalidScenario(s.to_string()))
    }
}

/// Propagation condition of one link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Los,
    Nlos,
    /// Outdoor-to-indoor (the outdoor leg may itself be LOS or NLOS)
    O2i,
}

impl Condition {
    /// Dense index used for field keys
    pub fn index(&self) -> u8 {
        match self {
            Condition::Los => 0,
            Condition::Nlos => 1,
            Condition::O2i => 2,
        }
    }
}

/// Indoor-factory hall and clutter description
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryHall {
    /// Hall length in metres
    pub length_m: f64,
    /// Hall width in metres
    pub width_m: f64,
    /// Ceiling height in metres
    pub height_m: f64,
    /// Clutter density r (0..1)
    pub clutter_density: f64,
    /// Clutter height h_c in metres
    pub clutter_height_m: f64,
    /// Typical clutter size d_clutter in metres
    pub clutter_size_m: f64,
}

impl Default for FactoryHall {
    fn default() -> Self {
        Self {
            length_m: 120.0,
            width_m: 60.0,
            height_m: 10.0,
            clutter_density: 0.4,
            clutter_height_m: 6.0,
            clutter_size_m: 10.0,
        }
    }
}

impl FactoryHall {
    /// Hall volume over total surface area (walls, floor and ceiling), V/S
    pub fn volume_to_surface(&self) -> f64 {
        let (l, w, h) = (self.length_m, self.width_m, self.height_m);
        let volume = l * w * h;
        let surface = 2.0 * (l * w + l * h + w * h);
        volume / surface
    }

    /// Largest hall dimension, used to bound excess delays
    pub fn max_dimension(&self) -> f64 {
        self.length_m.max(self.width_m).max(self.height_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        for sc in Scenario::ALL {
            assert_eq!(sc.name().parse::<Scenario>().unwrap(), sc);
        }
        assert_eq!("uma".parse::<Scenario>().unwrap(), Scenario::UMa);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Dense-Urban".parse::<Scenario>().unwrap_err();
        assert_eq!(err, GscmError::InvalidScenario("Dense-Urban".into()));
    }

    #[test]
    fn test_families() {
        assert_eq!(Scenario::InHOpen.family(), Family::InH);
        assert_eq!(Scenario::InFDH.family(), Family::InF);
        assert!(Scenario::UMa.supports_o2i());
        assert!(!Scenario::InFSL.supports_o2i());
    }

    #[test]
    fn test_serde_names() {
        let yaml = serde_yaml::to_string(&Scenario::InHMixed).unwrap();
        assert_eq!(yaml.trim(), "InH-Mixed");
        let sc: Scenario = serde_yaml::from_str("InF-SH").unwrap();
        assert_eq!(sc, Scenario::InFSH);
    }

    #[test]
    fn test_volume_to_surface() {
        let hall = FactoryHall {
            length_m: 10.0,
            width_m: 10.0,
            height_m: 10.0,
            ..Default::default()
        };
        assert!((hall.volume_to_surface() - 1000.0 / 600.0).abs() < 1e-12);
    }
}
