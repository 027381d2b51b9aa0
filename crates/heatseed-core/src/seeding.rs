//! Heat and lane seeding.
//!
//! Takes a best-first ranking and a [`HeatPlan`] and emits one
//! [`LaneAssignment`] per lane of every heat, empty lanes included.
//!
//! Heat 1 receives the weakest group and the last heat the strongest.
//! Within a heat, `zigzag` puts the group's best athlete in the centre lane
//! and alternates right/left outward; `straight` fills lanes in rank order.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{ManualPlacement, Result, SeedingConfig, SeedingError, SeedingMethod};
use crate::partition::HeatPlan;

/// One lane of one heat. `competitor_id` is `None` for an empty lane.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LaneAssignment {
    pub heat: u32,
    pub lane: u32,
    pub competitor_id: Option<String>,
}

impl LaneAssignment {
    pub fn is_empty(&self) -> bool {
        self.competitor_id.is_none()
    }
}

/// Lane placement strategy with the inputs it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    Zigzag,
    Straight,
    /// Shuffled lanes per heat; reproducible when `seed` is set.
    Random { seed: Option<u64> },
    /// Caller-chosen placements; only validated.
    Manual { placements: &'a [ManualPlacement] },
}

impl<'a> Placement<'a> {
    pub fn from_config(config: &'a SeedingConfig) -> Self {
        match config.method() {
            SeedingMethod::Zigzag => Self::Zigzag,
            SeedingMethod::Straight => Self::Straight,
            SeedingMethod::Random => Self::Random {
                seed: config.random_seed(),
            },
            SeedingMethod::Manual => Self::Manual {
                placements: config.manual_assignments(),
            },
        }
    }
}

/// Zigzag lane positions (1-based within `available` lanes) for `count`
/// athletes ordered strongest-first.
///
/// Athlete 0 takes `ceil(available / 2)`; odd `i` goes `ceil(i / 2)` right of
/// centre, even `i` goes `i / 2` left. Stays within `1..=available` while
/// `count <= available`.
pub fn zigzag_positions(count: usize, available: u32) -> Vec<u32> {
    let center = i64::from(available.div_ceil(2));
    (0..count as i64)
        .map(|i| {
            let offset = if i % 2 == 1 { (i + 1) / 2 } else { -(i / 2) };
            (center + offset) as u32
        })
        .collect()
}

/// Straight positions: `1, 2, .., count`.
pub fn straight_positions(count: usize) -> Vec<u32> {
    (1..=count as u32).collect()
}

/// Best-first ranking split into per-heat groups, indexed like `plan.heats`.
/// The last heat takes the head of the ranking.
fn group_by_heat<'r>(ranked: &'r [&'r str], plan: &HeatPlan) -> Vec<&'r [&'r str]> {
    let mut groups: Vec<&[&str]> = vec![&[]; plan.heats.len()];
    let mut cursor = 0;
    for (idx, heat) in plan.heats.iter().enumerate().rev() {
        groups[idx] = &ranked[cursor..cursor + heat.athletes];
        cursor += heat.athletes;
    }
    groups
}

/// Seed `ranked` (best-first competitor ids) into `plan`.
pub fn seed(
    ranked: &[&str],
    plan: &HeatPlan,
    placement: Placement<'_>,
) -> Result<Vec<LaneAssignment>> {
    if plan.total_athletes() != ranked.len() {
        return Err(SeedingError::invalid_config(
            "heat_plan",
            format!(
                "plan holds {} athletes but {} were ranked",
                plan.total_athletes(),
                ranked.len()
            ),
        ));
    }

    if let Placement::Manual { placements } = placement {
        return seed_manual(ranked, plan, placements);
    }

    let mut rng = match placement {
        Placement::Random { seed: Some(seed) } => Some(StdRng::seed_from_u64(seed)),
        Placement::Random { seed: None } => Some(StdRng::from_entropy()),
        _ => None,
    };

    let first_lane = plan.first_lane();
    let mut lanes = Vec::with_capacity(plan.heats.iter().map(|h| h.lanes as usize).sum());

    for (heat, group) in plan.heats.iter().zip(group_by_heat(ranked, plan)) {
        let usable = plan.usable_lanes(heat.lanes);
        if group.len() > usable as usize {
            return Err(SeedingError::CapacityExceeded {
                heat: heat.number,
                athletes: group.len(),
                capacity: usable,
            });
        }

        let positions = match (&placement, rng.as_mut()) {
            (Placement::Zigzag, _) => zigzag_positions(group.len(), usable),
            (Placement::Random { .. }, Some(rng)) => {
                let mut open: Vec<u32> = (1..=usable).collect();
                open.shuffle(rng);
                open.truncate(group.len());
                open
            }
            _ => straight_positions(group.len()),
        };

        let mut grid: Vec<Option<String>> = vec![None; heat.lanes as usize];
        for (id, position) in group.iter().zip(positions) {
            let lane = position + first_lane - 1;
            grid[lane as usize - 1] = Some((*id).to_string());
        }
        debug!(
            heat = heat.number,
            lanes = heat.lanes,
            athletes = group.len(),
            "heat seeded"
        );

        lanes.extend(
            grid.into_iter()
                .enumerate()
                .map(|(i, competitor_id)| LaneAssignment {
                    heat: heat.number,
                    lane: i as u32 + 1,
                    competitor_id,
                }),
        );
    }

    Ok(lanes)
}

fn seed_manual(
    ranked: &[&str],
    plan: &HeatPlan,
    placements: &[ManualPlacement],
) -> Result<Vec<LaneAssignment>> {
    let known: HashSet<&str> = ranked.iter().copied().collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut by_lane: HashMap<(u32, u32), &str> = HashMap::new();

    for p in placements {
        let id = p.competitor_id.as_str();
        if !known.contains(id) {
            return Err(SeedingError::InvalidManualAssignment(format!(
                "unknown competitor {id}"
            )));
        }
        if !placed.insert(id) {
            return Err(SeedingError::InvalidManualAssignment(format!(
                "competitor {id} placed more than once"
            )));
        }
        let heat = plan.heat(p.heat).ok_or_else(|| {
            SeedingError::InvalidManualAssignment(format!(
                "heat {} does not exist (plan has {})",
                p.heat,
                plan.heat_count()
            ))
        })?;
        if p.lane < plan.first_lane() || p.lane > heat.lanes {
            return Err(SeedingError::InvalidManualAssignment(format!(
                "lane {} outside {}..={} in heat {}",
                p.lane,
                plan.first_lane(),
                heat.lanes,
                heat.number
            )));
        }
        if let Some(other) = by_lane.insert((p.heat, p.lane), id) {
            return Err(SeedingError::InvalidManualAssignment(format!(
                "heat {} lane {} given to both {other} and {id}",
                p.heat, p.lane
            )));
        }
    }

    let missing = ranked.iter().filter(|id| !placed.contains(**id)).count();
    if missing > 0 {
        return Err(SeedingError::InvalidManualAssignment(format!(
            "{missing} competitor(s) have no placement"
        )));
    }

    Ok(plan
        .heats
        .iter()
        .flat_map(|heat| {
            let by_lane = &by_lane;
            (1..=heat.lanes).map(move |lane| LaneAssignment {
                heat: heat.number,
                lane,
                competitor_id: by_lane.get(&(heat.number, lane)).map(|id| id.to_string()),
            })
        })
        .collect())
}

/// Athletes per heat as actually placed, in heat order.
pub fn occupancy(plan: &HeatPlan, lanes: &[LaneAssignment]) -> Vec<usize> {
    plan.heats
        .iter()
        .map(|heat| {
            lanes
                .iter()
                .filter(|l| l.heat == heat.number && !l.is_empty())
                .count()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("r{i}")).collect()
    }

    fn refs(ids: &[String]) -> Vec<&str> {
        ids.iter().map(String::as_str).collect()
    }

    fn heat_lanes(lanes: &[LaneAssignment], heat: u32) -> Vec<Option<&str>> {
        lanes
            .iter()
            .filter(|l| l.heat == heat)
            .map(|l| l.competitor_id.as_deref())
            .collect()
    }

    #[test]
    fn test_zigzag_five_into_six_lanes() {
        assert_eq!(zigzag_positions(5, 6), vec![3, 4, 2, 5, 1]);
    }

    #[test]
    fn test_zigzag_fills_odd_width() {
        assert_eq!(zigzag_positions(7, 7), vec![4, 5, 3, 6, 2, 7, 1]);
        assert_eq!(zigzag_positions(8, 8), vec![4, 5, 3, 6, 2, 7, 1, 8]);
    }

    #[test]
    fn test_zigzag_heat_with_empty_lane() {
        let plan = partition::plan_fixed(5, 1, 6, false).unwrap();
        let ids = ids(5);
        let lanes = seed(&refs(&ids), &plan, Placement::Zigzag).unwrap();
        assert_eq!(lanes.len(), 6);
        assert_eq!(
            heat_lanes(&lanes, 1),
            vec![
                Some("r5"),
                Some("r3"),
                Some("r1"),
                Some("r2"),
                Some("r4"),
                None
            ]
        );
    }

    #[test]
    fn test_best_group_runs_last() {
        let plan = partition::plan(17, 8, true, None).unwrap();
        let ids = ids(17);
        let lanes = seed(&refs(&ids), &plan, Placement::Zigzag).unwrap();

        // heat 3 holds the 5 best, heat 1 the 6 weakest
        let heat3: Vec<&str> = heat_lanes(&lanes, 3).into_iter().flatten().collect();
        assert_eq!(heat3.len(), 5);
        assert!(heat3.contains(&"r1"));
        let heat1: Vec<&str> = heat_lanes(&lanes, 1).into_iter().flatten().collect();
        assert!(heat1.contains(&"r17"));

        // lane 1 is reserved and empty in every heat
        assert!(lanes.iter().filter(|l| l.lane == 1).all(|l| l.is_empty()));
        // best of heat 3 sits in the centre of lanes 2..=6
        let centre = lanes
            .iter()
            .find(|l| l.heat == 3 && l.competitor_id.as_deref() == Some("r1"))
            .unwrap();
        assert_eq!(centre.lane, 1 + 3);
    }

    #[test]
    fn test_straight_fill_skips_lane1() {
        let plan = partition::plan_fixed(3, 1, 5, true).unwrap();
        let ids = ids(3);
        let lanes = seed(&refs(&ids), &plan, Placement::Straight).unwrap();
        assert_eq!(
            heat_lanes(&lanes, 1),
            vec![None, Some("r1"), Some("r2"), Some("r3"), None]
        );
    }

    #[test]
    fn test_random_is_reproducible_and_keeps_membership() {
        let plan = partition::plan(12, 8, false, None).unwrap();
        let ids = ids(12);
        let a = seed(&refs(&ids), &plan, Placement::Random { seed: Some(7) }).unwrap();
        let b = seed(&refs(&ids), &plan, Placement::Random { seed: Some(7) }).unwrap();
        assert_eq!(a, b);

        let zig = seed(&refs(&ids), &plan, Placement::Zigzag).unwrap();
        for heat in 1..=2 {
            let mut x: Vec<&str> = heat_lanes(&a, heat).into_iter().flatten().collect();
            let mut y: Vec<&str> = heat_lanes(&zig, heat).into_iter().flatten().collect();
            x.sort();
            y.sort();
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_manual_placements_validated() {
        let plan = partition::plan_fixed(2, 1, 4, false).unwrap();
        let ids = ids(2);
        let ok = vec![
            ManualPlacement {
                competitor_id: "r1".into(),
                heat: 1,
                lane: 4,
            },
            ManualPlacement {
                competitor_id: "r2".into(),
                heat: 1,
                lane: 1,
            },
        ];
        let lanes = seed(&refs(&ids), &plan, Placement::Manual { placements: &ok }).unwrap();
        assert_eq!(
            heat_lanes(&lanes, 1),
            vec![Some("r2"), None, None, Some("r1")]
        );

        let clash = vec![
            ManualPlacement {
                competitor_id: "r1".into(),
                heat: 1,
                lane: 2,
            },
            ManualPlacement {
                competitor_id: "r2".into(),
                heat: 1,
                lane: 2,
            },
        ];
        assert!(matches!(
            seed(&refs(&ids), &plan, Placement::Manual { placements: &clash }),
            Err(SeedingError::InvalidManualAssignment(_))
        ));

        let partial = vec![ok[0].clone()];
        assert!(seed(&refs(&ids), &plan, Placement::Manual { placements: &partial }).is_err());

        let bad_heat = vec![
            ok[0].clone(),
            ManualPlacement {
                competitor_id: "r2".into(),
                heat: 2,
                lane: 1,
            },
        ];
        assert!(seed(&refs(&ids), &plan, Placement::Manual { placements: &bad_heat }).is_err());
    }

    #[test]
    fn test_plan_and_ranking_must_agree() {
        let plan = partition::plan(4, 8, false, None).unwrap();
        let ids = ids(3);
        assert!(seed(&refs(&ids), &plan, Placement::Zigzag).is_err());
    }

    #[test]
    fn test_occupancy_counts_filled_lanes() {
        let plan = partition::plan(9, 8, false, None).unwrap();
        let ids = ids(9);
        let lanes = seed(&refs(&ids), &plan, Placement::Straight).unwrap();
        assert_eq!(occupancy(&plan, &lanes), vec![5, 4]);
    }
}
