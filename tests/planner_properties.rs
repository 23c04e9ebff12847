mod common;

use std::collections::HashMap;

use proptest::prelude::*;

use common::components;
use ecs_stage_scheduler::{compute_stages, ComponentID, SystemMetadata};

const COMPONENTS: usize = 12;

#[derive(Clone, Debug)]
struct Spec {
    reads: Vec<usize>,
    writes: Vec<usize>,
    priority: i32,
    eligible: bool,
}

fn spec_strategy() -> impl Strategy<Value = Spec> {
    (
        proptest::collection::vec(0..COMPONENTS, 0..4),
        proptest::collection::vec(0..COMPONENTS, 0..3),
        -5i32..5,
        proptest::bool::weighted(0.85),
    )
        .prop_map(|(reads, writes, priority, eligible)| Spec { reads, writes, priority, eligible })
}

fn build(specs: &[Spec], ids: &[ComponentID]) -> Vec<SystemMetadata> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let reads: Vec<ComponentID> = spec.reads.iter().map(|&c| ids[c]).collect();
            let writes: Vec<ComponentID> = spec.writes.iter().map(|&c| ids[c]).collect();
            SystemMetadata::new(format!("system_{index:02}"))
                .reads(&reads)
                .writes(&writes)
                .priority(spec.priority)
                .parallel_eligible(spec.eligible)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn co_staged_systems_never_conflict(specs in proptest::collection::vec(spec_strategy(), 0..24)) {
        let ids = components("properties_hazard", COMPONENTS);
        let systems = build(&specs, &ids);
        let by_id: HashMap<_, _> = systems.iter().map(|s| (s.id.clone(), s)).collect();

        for stage in compute_stages(&systems) {
            for (i, a) in stage.systems.iter().enumerate() {
                for b in &stage.systems[i + 1..] {
                    let (a, b) = (by_id[a], by_id[b]);
                    prop_assert!(!a.access.write.intersects(&b.access.read));
                    prop_assert!(!a.access.write.intersects(&b.access.write));
                    prop_assert!(!b.access.write.intersects(&a.access.read));
                }
            }
        }
    }

    #[test]
    fn every_system_is_planned_exactly_once(specs in proptest::collection::vec(spec_strategy(), 0..24)) {
        let ids = components("properties_once", COMPONENTS);
        let systems = build(&specs, &ids);

        let mut seen: HashMap<String, usize> = HashMap::new();
        for stage in compute_stages(&systems) {
            for id in stage.systems {
                *seen.entry(id.as_str().to_owned()).or_default() += 1;
            }
        }

        prop_assert_eq!(seen.len(), systems.len());
        prop_assert!(seen.values().all(|&count| count == 1));
    }

    #[test]
    fn plan_ignores_input_order(
        specs in proptest::collection::vec(spec_strategy(), 1..24),
        rotation in 0usize..24,
    ) {
        let ids = components("properties_order", COMPONENTS);
        let systems = build(&specs, &ids);
        let mut rotated = systems.clone();
        rotated.rotate_left(rotation % systems.len());
        rotated.reverse();

        prop_assert_eq!(compute_stages(&systems), compute_stages(&rotated));
    }

    #[test]
    fn ineligible_systems_are_alone(specs in proptest::collection::vec(spec_strategy(), 0..24)) {
        let ids = components("properties_exclusive", COMPONENTS);
        let systems = build(&specs, &ids);
        let eligible: HashMap<_, _> = systems.iter().map(|s| (s.id.clone(), s.parallel_eligible)).collect();

        for stage in compute_stages(&systems) {
            if stage.systems.iter().any(|id| !eligible[id]) {
                prop_assert_eq!(stage.len(), 1);
            }
        }
    }

    #[test]
    fn conflicting_pairs_run_in_priority_order(specs in proptest::collection::vec(spec_strategy(), 0..24)) {
        let ids = components("properties_priority", COMPONENTS);
        let systems = build(&specs, &ids);
        let stages = compute_stages(&systems);
        let stage_of: HashMap<_, _> = stages
            .iter()
            .enumerate()
            .flat_map(|(index, stage)| stage.systems.iter().map(move |id| (id.clone(), index)))
            .collect();

        for a in &systems {
            for b in &systems {
                let a_first = (a.priority, &a.id) < (b.priority, &b.id);
                if a_first && a.conflicts_with(b) {
                    prop_assert!(stage_of[&a.id] < stage_of[&b.id]);
                }
            }
        }
    }
}
