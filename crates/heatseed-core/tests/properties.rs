//! Property tests for the parser, ranking, partition, seeding and bib allocation.

use std::collections::HashSet;

use heatseed_core::bib::numeric_bib;
use heatseed_core::{
    allocate_and_apply, allocate_bibs, generate_seeding, performance, ranking, BibCandidate,
    BibStore, CompetitionLocks, CompetitorEntry, EventClassification, Mark, MemoryRegistry,
    Registration, RegistrationStatus, SeedingDraft, SeedingOutcome, SortKey, Traversal,
};
use proptest::prelude::*;

fn classification() -> impl Strategy<Value = EventClassification> {
    prop_oneof![
        Just(EventClassification::TimeBased),
        Just(EventClassification::DistanceBased),
    ]
}

fn performance_key() -> impl Strategy<Value = SortKey> {
    prop_oneof![Just(SortKey::Pb), Just(SortKey::Sb), Just(SortKey::SeedTime)]
}

/// Entries `r1..rN` with strictly increasing seed times, so `r1` is best.
fn sprinters(n: usize) -> Vec<CompetitorEntry> {
    (1..=n)
        .map(|i| {
            CompetitorEntry::new(format!("r{i}"), "Runner", format!("N{i:03}"))
                .with_seed_mark(format!("{}.{:02}", 10 + i / 100, i % 100))
        })
        .collect()
}

fn rank_index(id: &str) -> usize {
    id.trim_start_matches('r').parse().unwrap_or(usize::MAX)
}

fn layout() -> impl Strategy<Value = (usize, u32, bool)> {
    (0usize..70, 1u32..11, any::<bool>()).prop_filter("skip needs two lanes", |(_, lanes, skip)| {
        !*skip || *lanes >= 2
    })
}

fn run(n: usize, max_lanes: u32, skip_lane1: bool, method: &str) -> SeedingOutcome {
    let draft = SeedingDraft {
        max_lanes,
        skip_lane1,
        seeding_method: method.to_string(),
        random_seed: Some(7),
        ..Default::default()
    };
    generate_seeding(
        &sprinters(n),
        EventClassification::TimeBased,
        &draft.resolve().unwrap(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn minutes_match_total_seconds(m in 1u32..60, s in 0u32..60, cs in 0u32..100) {
        let classic = format!("{m}:{s:02}.{cs:02}");
        let total = format!("{}.{cs:02}", m * 60 + s);
        let a = performance::parse(&classic, EventClassification::TimeBased);
        let b = performance::parse(&total, EventClassification::TimeBased);
        prop_assert!(a.has_mark);
        prop_assert_eq!(a.value.to_bits(), b.value.to_bits());

        let comma = total.replace('.', ",");
        prop_assert_eq!(performance::parse(&comma, EventClassification::TimeBased), b);
    }

    #[test]
    fn unmarked_never_outranks_marked(
        marks in prop::collection::vec(prop::option::of(1u32..200_000), 0..25),
        key in performance_key(),
        class in classification(),
    ) {
        let entries: Vec<CompetitorEntry> = marks
            .iter()
            .enumerate()
            .map(|(i, mark)| {
                let entry = CompetitorEntry::new(format!("c{i}"), "First", "Last");
                match mark {
                    Some(v) => {
                        let raw = format!("{}.{:03}", v / 1000, v % 1000);
                        entry
                            .with_seed_mark(raw.clone())
                            .with_personal_best(Mark::new(raw.clone()))
                            .with_season_best(Mark::new(raw))
                    }
                    None => entry,
                }
            })
            .collect();

        let ranked = ranking::rank(&entries, key, class, Traversal::BestFirst);
        let marked: Vec<bool> = ranked.iter().map(|e| e.seed_mark.is_some()).collect();
        if let Some(first_unmarked) = marked.iter().position(|m| !m) {
            prop_assert!(marked[first_unmarked..].iter().all(|m| !m));
        }
    }

    #[test]
    fn every_athlete_placed_once_within_capacity((n, max_lanes, skip) in layout()) {
        for method in ["zigzag", "straight", "random"] {
            let outcome = run(n, max_lanes, skip, method);
            let plan = &outcome.plan;

            let placed: Vec<&str> = outcome
                .lanes
                .iter()
                .filter_map(|l| l.competitor_id.as_deref())
                .collect();
            prop_assert_eq!(placed.len(), n);
            prop_assert_eq!(placed.iter().collect::<HashSet<_>>().len(), n);
            prop_assert_eq!(plan.total_athletes(), n);

            for heat in &plan.heats {
                let in_heat: Vec<_> = outcome.heat_lanes(heat.number).collect();
                prop_assert_eq!(in_heat.len(), heat.lanes as usize);
                let occupied = in_heat.iter().filter(|l| !l.is_empty()).count();
                prop_assert_eq!(occupied, heat.athletes);
                prop_assert!(occupied <= plan.usable_lanes(heat.lanes) as usize);
                if skip {
                    prop_assert!(in_heat.iter().all(|l| l.lane != 1 || l.is_empty()));
                }
            }

            let slots: HashSet<(u32, u32)> =
                outcome.lanes.iter().map(|l| (l.heat, l.lane)).collect();
            prop_assert_eq!(slots.len(), outcome.lanes.len());
        }
    }

    #[test]
    fn strongest_runs_in_last_heat((n, max_lanes, skip) in layout()) {
        let outcome = run(n, max_lanes, skip, "zigzag");
        let heats = outcome.plan.heat_count() as u32;
        if heats > 1 {
            prop_assert_eq!(outcome.position_of("r1").map(|p| p.0), Some(heats));
        }
    }

    #[test]
    fn group_leader_takes_centre_lane((n, max_lanes, skip) in layout()) {
        let outcome = run(n, max_lanes, skip, "zigzag");
        let plan = &outcome.plan;
        for heat in &plan.heats {
            let leader = outcome
                .heat_lanes(heat.number)
                .filter_map(|l| l.competitor_id.as_deref().map(|id| (rank_index(id), l.lane)))
                .min();
            if let Some((_, lane)) = leader {
                let centre = plan.usable_lanes(heat.lanes).div_ceil(2);
                prop_assert_eq!(lane, plan.first_lane() + centre - 1);
            }
        }
    }

    #[test]
    fn bib_allocation_is_stable_and_fresh(
        existing in prop::collection::vec(1u32..500, 0..20),
        text_bibs in prop::collection::vec("[A-Z][0-9]{1,3}", 0..3),
        count in 0usize..15,
        start in 1u32..300,
    ) {
        let candidates: Vec<BibCandidate> = (0..count)
            .map(|i| BibCandidate::new(format!("n{i}"), "First", format!("Last{i:02}")))
            .collect();
        let mut bibs: Vec<String> = existing.iter().map(u32::to_string).collect();
        bibs.extend(text_bibs);

        let a = allocate_bibs(&candidates, bibs.iter().map(String::as_str), start).unwrap();
        let b = allocate_bibs(&candidates, bibs.iter().map(String::as_str), start).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), count);

        let taken: HashSet<u32> = existing.iter().copied().collect();
        let floor = existing.iter().max().map_or(start, |m| (m + 1).max(start));
        let mut fresh = HashSet::new();
        for assignment in &a.assignments {
            let n = numeric_bib(&assignment.bib).unwrap();
            prop_assert!(n >= floor);
            prop_assert!(!taken.contains(&n));
            prop_assert!(fresh.insert(n));
        }
    }

    #[test]
    fn rerun_after_apply_reuses_nothing(first in 1usize..8, second in 0usize..8) {
        let registry = MemoryRegistry::new();
        let locks = CompetitionLocks::new();
        let add = |prefix: &str, count: usize| {
            for i in 0..count {
                registry
                    .insert(Registration {
                        competition_id: "meet".to_string(),
                        event: "100m".to_string(),
                        status: RegistrationStatus::Confirmed,
                        entry: CompetitorEntry::new(
                            format!("{prefix}{i}"),
                            "First",
                            format!("{prefix}{i}"),
                        ),
                    })
                    .unwrap();
            }
        };

        add("a", first);
        allocate_and_apply(&registry, &locks, "meet", 1).unwrap();
        let before: HashSet<String> = registry.existing_bibs("meet").unwrap().into_iter().collect();

        add("b", second);
        let result = allocate_and_apply(&registry, &locks, "meet", 1).unwrap();
        prop_assert_eq!(result.len(), second);
        for assignment in &result.assignments {
            prop_assert!(!before.contains(&assignment.bib));
        }
    }
}
