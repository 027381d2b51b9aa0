//! Heat partitioning.
//!
//! Computes how many heats an event needs and how many lanes each heat uses.
//! Athletes are spread into near-equal groups; the earliest heats take the
//! remainder, so the last (strongest) heat is never larger than the first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{HeatLayout, Result, SeedingConfig, SeedingError};
use crate::metrics::METRICS;
use crate::obs;

/// One heat of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatSlot {
    /// 1-based, in scheduled run order.
    pub number: u32,
    /// Lane capacity, including a reserved lane 1 when skipped.
    pub lanes: u32,
    /// Athletes this heat receives.
    pub athletes: usize,
}

/// Heat topology for one event/round.
///
/// # Invariants
///
/// The `athletes` counts sum to the competitor count, and no heat holds more
/// athletes than its usable lanes (`lanes`, minus one when lane 1 is skipped).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatPlan {
    pub heats: Vec<HeatSlot>,
    pub skip_lane1: bool,
    /// True when no heat count within the search bound fit the venue and the
    /// best-effort fallback was used.
    pub fallback: bool,
}

impl HeatPlan {
    pub fn heat_count(&self) -> usize {
        self.heats.len()
    }

    pub fn total_athletes(&self) -> usize {
        self.heats.iter().map(|h| h.athletes).sum()
    }

    pub fn lanes_per_heat(&self) -> Vec<u32> {
        self.heats.iter().map(|h| h.lanes).collect()
    }

    pub fn heat(&self, number: u32) -> Option<&HeatSlot> {
        self.heats.iter().find(|h| h.number == number)
    }

    /// Lanes available for athletes in a heat of `lanes` capacity.
    pub fn usable_lanes(&self, lanes: u32) -> u32 {
        lanes.saturating_sub(u32::from(self.skip_lane1))
    }

    /// First lane athletes may occupy.
    pub fn first_lane(&self) -> u32 {
        if self.skip_lane1 {
            2
        } else {
            1
        }
    }
}

/// Split `athlete_count` into `heat_count` contiguous groups, heat order.
///
/// `base = n / heats`; the first `n % heats` heats get `base + 1`.
pub fn distribute(athlete_count: usize, heat_count: usize) -> Vec<usize> {
    if heat_count == 0 {
        return Vec::new();
    }
    let base = athlete_count / heat_count;
    let extra = athlete_count % heat_count;
    (0..heat_count)
        .map(|i| if i < extra { base + 1 } else { base })
        .collect()
}

fn slots(sizes: &[usize], lanes: impl Fn(usize, usize) -> u32) -> Vec<HeatSlot> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &athletes)| HeatSlot {
            number: i as u32 + 1,
            lanes: lanes(i, athletes),
            athletes,
        })
        .collect()
}

/// Check each group fits the usable lanes of its heat.
fn check_capacity(sizes: &[usize], capacities: &[u32], reserved: u32) -> Result<()> {
    for (i, (&athletes, &lanes)) in sizes.iter().zip(capacities).enumerate() {
        let usable = lanes.saturating_sub(reserved);
        if athletes > usable as usize {
            return Err(SeedingError::CapacityExceeded {
                heat: i as u32 + 1,
                athletes,
                capacity: usable,
            });
        }
    }
    Ok(())
}

/// Plan heats for `athlete_count` athletes.
///
/// Without `custom_lanes`, finds the minimum heat count whose average group
/// fits the usable lanes; each heat then reports its own group size as lane
/// count (plus the reserved lane 1). If nothing up to `ceil(n / 2)` heats
/// fits, falls back to `ceil(n / usable)` heats of `max_lanes`.
///
/// With `custom_lanes`, the caller's capacities are kept as given and only
/// validated against the near-equal distribution.
pub fn plan(
    athlete_count: usize,
    max_lanes: u32,
    skip_lane1: bool,
    custom_lanes: Option<&[u32]>,
) -> Result<HeatPlan> {
    if let Some(custom) = custom_lanes {
        return plan_custom(athlete_count, custom, skip_lane1);
    }

    let reserved = u32::from(skip_lane1);
    let empty = HeatPlan {
        heats: Vec::new(),
        skip_lane1,
        fallback: false,
    };
    if athlete_count == 0 {
        return Ok(empty);
    }

    let usable = max_lanes.saturating_sub(reserved).max(1) as usize;
    if athlete_count <= usable {
        debug!(athlete_count, usable, "single heat");
        return Ok(HeatPlan {
            heats: slots(&[athlete_count], |_, n| n as u32 + reserved),
            ..empty
        });
    }

    for heats in 1..=athlete_count.div_ceil(2) {
        let per_heat = athlete_count.div_ceil(heats);
        if per_heat <= usable {
            debug!(athlete_count, usable, heats, per_heat, "minimum heat count found");
            let sizes = distribute(athlete_count, heats);
            return Ok(HeatPlan {
                heats: slots(&sizes, |_, n| n as u32 + reserved),
                ..empty
            });
        }
    }

    let heats = athlete_count.div_ceil(usable);
    let lanes = max_lanes.max(usable as u32 + reserved);
    obs::emit_partition_fallback(athlete_count, max_lanes, heats);
    METRICS.inc_fallback_plans();
    let sizes = distribute(athlete_count, heats);
    Ok(HeatPlan {
        heats: slots(&sizes, |_, _| lanes),
        skip_lane1,
        fallback: true,
    })
}

fn plan_custom(athlete_count: usize, custom: &[u32], skip_lane1: bool) -> Result<HeatPlan> {
    if custom.is_empty() {
        return Err(SeedingError::invalid_config(
            "custom_lanes_per_heat",
            "must list at least one heat",
        ));
    }
    if athlete_count == 0 {
        return Ok(HeatPlan {
            skip_lane1,
            ..HeatPlan::default()
        });
    }
    let sizes = distribute(athlete_count, custom.len());
    check_capacity(&sizes, custom, u32::from(skip_lane1))?;
    debug!(athlete_count, heats = custom.len(), "custom lane layout validated");
    Ok(HeatPlan {
        heats: slots(&sizes, |i, _| custom[i]),
        skip_lane1,
        fallback: false,
    })
}

/// Plan a caller-fixed number of heats, all with `lanes` capacity.
pub fn plan_fixed(
    athlete_count: usize,
    heats: u32,
    lanes: u32,
    skip_lane1: bool,
) -> Result<HeatPlan> {
    if heats == 0 {
        return Err(SeedingError::invalid_config(
            "number_of_heats",
            "must be positive",
        ));
    }
    if athlete_count == 0 {
        return Ok(HeatPlan {
            skip_lane1,
            ..HeatPlan::default()
        });
    }
    let capacities = vec![lanes; heats as usize];
    let sizes = distribute(athlete_count, capacities.len());
    check_capacity(&sizes, &capacities, u32::from(skip_lane1))?;
    Ok(HeatPlan {
        heats: slots(&sizes, |_, _| lanes),
        skip_lane1,
        fallback: false,
    })
}

/// Plan heats according to a resolved configuration's layout.
pub fn plan_for(athlete_count: usize, config: &SeedingConfig) -> Result<HeatPlan> {
    match config.layout() {
        HeatLayout::Auto => plan(athlete_count, config.max_lanes(), config.skip_lane1(), None),
        HeatLayout::Fixed { heats, lanes } => {
            plan_fixed(athlete_count, *heats, *lanes, config.skip_lane1())
        }
        HeatLayout::Custom { lanes } => plan(
            athlete_count,
            config.max_lanes(),
            config.skip_lane1(),
            Some(lanes),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(plan: &HeatPlan) -> Vec<usize> {
        plan.heats.iter().map(|h| h.athletes).collect()
    }

    #[test]
    fn test_distribute_front_loads_remainder() {
        assert_eq!(distribute(17, 3), vec![6, 6, 5]);
        assert_eq!(distribute(16, 2), vec![8, 8]);
        assert_eq!(distribute(2, 3), vec![1, 1, 0]);
        assert!(distribute(5, 0).is_empty());
    }

    #[test]
    fn test_seventeen_athletes_eight_lanes_skip_lane1() {
        let plan = plan(17, 8, true, None).unwrap();
        assert_eq!(plan.heat_count(), 3);
        assert_eq!(sizes(&plan), vec![6, 6, 5]);
        assert_eq!(plan.lanes_per_heat(), vec![7, 7, 6]);
        assert!(!plan.fallback);
    }

    #[test]
    fn test_single_heat_when_everyone_fits() {
        let plan = plan(5, 8, false, None).unwrap();
        assert_eq!(plan.heat_count(), 1);
        assert_eq!(plan.lanes_per_heat(), vec![5]);

        let plan = super::plan(7, 8, true, None).unwrap();
        assert_eq!(plan.lanes_per_heat(), vec![8]);
    }

    #[test]
    fn test_minimum_heat_count() {
        // 9 athletes, 8 lanes: 2 heats of 5 and 4
        let plan = plan(9, 8, false, None).unwrap();
        assert_eq!(sizes(&plan), vec![5, 4]);
        // 24 athletes, 8 lanes: exactly 3 full heats
        let plan = super::plan(24, 8, false, None).unwrap();
        assert_eq!(sizes(&plan), vec![8, 8, 8]);
    }

    #[test]
    fn test_empty_field_has_no_heats() {
        let plan = plan(0, 8, true, None).unwrap();
        assert_eq!(plan.heat_count(), 0);
        assert_eq!(plan.total_athletes(), 0);

        let plan = super::plan(0, 8, false, Some(&[8, 8])).unwrap();
        assert_eq!(plan.heat_count(), 0);
    }

    #[test]
    fn test_fallback_for_single_usable_lane() {
        let plan = plan(3, 2, true, None).unwrap();
        assert!(plan.fallback);
        assert_eq!(plan.heat_count(), 3);
        assert_eq!(sizes(&plan), vec![1, 1, 1]);
        assert_eq!(plan.lanes_per_heat(), vec![2, 2, 2]);
    }

    #[test]
    fn test_custom_lanes_kept_when_they_fit() {
        let plan = plan(13, 8, false, Some(&[8, 6])).unwrap();
        assert_eq!(plan.lanes_per_heat(), vec![8, 6]);
        assert_eq!(sizes(&plan), vec![7, 6]);
    }

    #[test]
    fn test_custom_lanes_rejected_when_too_small() {
        let err = plan(14, 8, true, Some(&[8, 6])).unwrap_err();
        assert!(matches!(
            err,
            SeedingError::CapacityExceeded {
                heat: 2,
                athletes: 7,
                capacity: 5
            }
        ));
    }

    #[test]
    fn test_fixed_layout_validates_capacity() {
        let plan = plan_fixed(10, 2, 6, false).unwrap();
        assert_eq!(sizes(&plan), vec![5, 5]);
        assert_eq!(plan.lanes_per_heat(), vec![6, 6]);

        assert!(plan_fixed(13, 2, 6, false).is_err());
        assert!(plan_fixed(3, 0, 6, false).is_err());
    }
}
