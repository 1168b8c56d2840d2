//! Large-scale loss of one channel
//!
//! Path loss, shadow fading and building penetration between the two ends
//! of a link, evaluated for the current node positions. The BS end is
//! replaced by its nearest wrap-around image before the distance enters
//! the path-loss model.

use gscm_core::pathloss::path_loss_db;
use gscm_core::wrap_around::nearest_image;
use gscm_core::{LinkGeometry, Point2, Position, Scenario};

/// Inputs and result of the last evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
struct Evaluation {
    tx: Position,
    rx: Position,
    frequency_hz: f64,
    loss_db: f64,
}

/// Loss in dB between the ends of a link
#[derive(Debug, Clone, PartialEq)]
pub struct LargeScaleLoss {
    scenario: Scenario,
    /// Outdoor path in line of sight
    los: bool,
    shadow_fading_db: f64,
    /// Building penetration of an O2I link, 0 otherwise
    penetration_db: f64,
    /// Wrap-around images of the BS end, `[0, 0]` first
    offsets: Vec<Point2>,
    swapped: bool,
    last: Option<Evaluation>,
}

impl LargeScaleLoss {
    pub fn new(scenario: Scenario, los: bool, shadow_fading_db: f64, penetration_db: f64, offsets: Vec<Point2>) -> Self {
        let offsets = if offsets.is_empty() { vec![[0.0, 0.0]] } else { offsets };
        Self {
            scenario,
            los,
            shadow_fading_db,
            penetration_db,
            offsets,
            swapped: false,
            last: None,
        }
    }

    /// Loss in dB for a transmission from `tx` to `rx`.
    ///
    /// In the downlink orientation `tx` is the BS; once swapped `rx` is.
    /// Repeated calls with unchanged inputs return the cached value.
    pub fn execute(&mut self, tx: &Position, rx: &Position, frequency_hz: f64) -> f64 {
        if let Some(last) = self.last {
            if last.tx == *tx && last.rx == *rx && last.frequency_hz == frequency_hz {
                return last.loss_db;
            }
        }

        let (bs, ue) = if self.swapped { (rx, tx) } else { (tx, rx) };
        let (bs_image, _) = nearest_image(bs, ue, &self.offsets);
        let geom = LinkGeometry::new(&bs_image, ue, frequency_hz);
        let loss_db = path_loss_db(self.scenario, self.los, &geom) + self.shadow_fading_db + self.penetration_db;

        self.last = Some(Evaluation {
            tx: *tx,
            rx: *rx,
            frequency_hz,
            loss_db,
        });
        loss_db
    }

    /// Flip between downlink and uplink orientation
    pub fn swap_direction(&mut self) {
        self.swapped = !self.swapped;
        // Cached endpoints are in the old orientation
        self.last = None;
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    pub fn is_los(&self) -> bool {
        self.los
    }

    pub fn shadow_fading_db(&self) -> f64 {
        self.shadow_fading_db
    }

    pub fn penetration_db(&self) -> f64 {
        self.penetration_db
    }

    /// Result of the last evaluation
    pub fn last_loss_db(&self) -> Option<f64> {
        self.last.map(|e| e.loss_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gscm_core::wrap_around::offsets;

    const BS: Position = [0.0, 0.0, 25.0];
    const UE: Position = [120.0, 40.0, 1.5];

    #[test]
    fn test_loss_includes_shadowing_and_penetration() {
        let mut plain = LargeScaleLoss::new(Scenario::UMa, true, 0.0, 0.0, vec![]);
        let mut faded = LargeScaleLoss::new(Scenario::UMa, true, 3.0, 12.0, vec![]);
        let a = plain.execute(&BS, &UE, 3.5e9);
        let b = faded.execute(&BS, &UE, 3.5e9);
        assert!((b - a - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_reciprocal_after_swap() {
        let mut loss = LargeScaleLoss::new(Scenario::UMi, false, 1.0, 0.0, vec![]);
        let down = loss.execute(&BS, &UE, 2e9);
        loss.swap_direction();
        assert!(loss.is_swapped());
        let up = loss.execute(&UE, &BS, 2e9);
        assert!((down - up).abs() < 1e-12);
        loss.swap_direction();
        assert!(!loss.is_swapped());
    }

    #[test]
    fn test_mobility_cache() {
        let mut loss = LargeScaleLoss::new(Scenario::UMa, false, 0.0, 0.0, vec![]);
        assert_eq!(loss.last_loss_db(), None);
        let first = loss.execute(&BS, &UE, 3.5e9);
        assert_eq!(loss.last_loss_db(), Some(first));
        let moved = loss.execute(&BS, &[300.0, 40.0, 1.5], 3.5e9);
        assert!(moved > first);
        assert_eq!(loss.last_loss_db(), Some(moved));
    }

    #[test]
    fn test_wrap_around_shortens_distance() {
        let isd = 500.0;
        let far_ue = [1200.0, 0.0, 1.5];
        let wrapped_offsets = offsets(isd, 7, 3).unwrap();
        let mut plain = LargeScaleLoss::new(Scenario::UMa, false, 0.0, 0.0, vec![]);
        let mut wrapped = LargeScaleLoss::new(Scenario::UMa, false, 0.0, 0.0, wrapped_offsets);
        assert!(wrapped.execute(&BS, &far_ue, 3.5e9) < plain.execute(&BS, &far_ue, 3.5e9));
    }
}
