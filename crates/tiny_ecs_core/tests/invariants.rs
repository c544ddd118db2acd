//! Randomized operation sequences checked against a brute-force model of the
//! manager's indexes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::any::Any;
use std::collections::HashSet;
use tiny_ecs_core::ecs::{Component, ComponentId, Entity, EntityManager, EventBus};

#[derive(Debug, Default)]
struct Position {
    x: f32,
}

#[derive(Debug, Default)]
struct Velocity {
    dx: f32,
}

#[derive(Debug, Default)]
struct Health {
    value: i32,
}

tiny_ecs_core::poolable_by_default!(Position, Velocity, Health);
tiny_ecs_core::define_component!(Position, 1, "Position");
tiny_ecs_core::define_component!(Velocity, 2, "Velocity");
tiny_ecs_core::define_component!(Health, 3, "Health");

const ALL: [ComponentId; 3] = [Position::ID, Velocity::ID, Health::ID];
const TAGS: [&str; 3] = ["red", "blue", "boss"];
const SETS: [&[ComponentId]; 5] = [
    &[Position::ID],
    &[Position::ID, Velocity::ID],
    &[Velocity::ID, Health::ID],
    &[Health::ID, Position::ID, Velocity::ID],
    &[Health::ID],
];

fn add(m: &mut EntityManager, e: Entity, id: ComponentId) {
    let result = if id == Position::ID {
        m.add_component_with::<Position, _>(e, |p: &mut Position| p.x = 1.0)
    } else if id == Velocity::ID {
        m.add_component_with::<Velocity, _>(e, |v: &mut Velocity| v.dx = 2.0)
    } else {
        m.add_component_with::<Health, _>(e, |h: &mut Health| h.value = 3)
    };
    result.unwrap();
}

fn check(m: &EntityManager) {
    let live: HashSet<Entity> = m.entities().iter().copied().collect();
    assert_eq!(live.len(), m.count(), "live list has duplicates");

    for set in SETS {
        let key = tiny_ecs_core::ecs::GroupKey::from_components(set);
        let group = m.group(&key);
        let members: HashSet<Entity> = group.iter().copied().collect();
        assert_eq!(members.len(), group.len(), "group {key} has duplicates");

        let expected: HashSet<Entity> = m
            .entities()
            .iter()
            .copied()
            .filter(|&e| set.iter().all(|&c| m.has_component(e, c)))
            .collect();
        assert_eq!(members, expected, "group {key} out of date");
    }

    for tag in TAGS {
        let tagged: HashSet<Entity> = m.tagged(tag).iter().copied().collect();
        assert_eq!(tagged.len(), m.tagged(tag).len());
        let expected: HashSet<Entity> = m
            .entities()
            .iter()
            .copied()
            .filter(|&e| m.has_tag(e, tag))
            .collect();
        assert_eq!(tagged, expected, "tag {tag} out of date");
    }

    let stats = m.pool_stats();
    assert_eq!(stats.entity.used, m.count());
    for id in ALL {
        let owners = m
            .entities()
            .iter()
            .filter(|&&e| m.has_component(e, id))
            .count();
        let name = tiny_ecs_core::ecs::name_of(id);
        let used = stats.component(&name).map_or(0, |s| s.used);
        assert_eq!(used, owners, "{name} pool disagrees with owners");
    }
}

/// Re-entrant listeners a run can install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listener {
    /// Attaching Health strips Velocity.
    Poison,
    /// Removing a boss removes one red minion too.
    Bosses,
    /// Losing Position kills blue entities; losing Velocity drops Health.
    Detach,
}

fn run(seed: u64, listeners: &[Listener]) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = EntityManager::new().with_messenger(EventBus::new());
    for set in SETS {
        m.index_group(set);
    }

    let bus = m.messenger_mut().unwrap();
    if listeners.contains(&Listener::Poison) {
        bus.listen_to(
            EntityManager::COMPONENT_ADDED,
            |m: &mut EntityManager, e: Option<Entity>, payload: &dyn Any| {
                if payload.downcast_ref::<ComponentId>() == Some(&Health::ID) {
                    m.remove_component::<Velocity>(e.unwrap()).unwrap();
                }
            },
        );
    }
    if listeners.contains(&Listener::Bosses) {
        bus.listen_to(
            EntityManager::ENTITY_REMOVE,
            |m: &mut EntityManager, e: Option<Entity>, _: &dyn Any| {
                let e = e.unwrap();
                if !m.has_tag(e, "boss") {
                    return;
                }
                let minion = m
                    .tagged("red")
                    .iter()
                    .copied()
                    .find(|&r| r != e && !m.has_tag(r, "boss"));
                if let Some(minion) = minion {
                    m.remove_entity(minion).unwrap();
                }
            },
        );
    }
    if listeners.contains(&Listener::Detach) {
        bus.listen_to(
            EntityManager::COMPONENT_REMOVE,
            |m: &mut EntityManager, e: Option<Entity>, payload: &dyn Any| {
                let e = e.unwrap();
                match payload.downcast_ref::<ComponentId>().copied() {
                    Some(id) if id == Position::ID && m.has_tag(e, "blue") => {
                        m.remove_entity(e).unwrap();
                    }
                    Some(id) if id == Velocity::ID => {
                        m.remove_component::<Health>(e).unwrap();
                    }
                    _ => {}
                }
            },
        );
    }

    let mut dead = Vec::new();
    for _ in 0..600 {
        let live: Vec<Entity> = m.entities().to_vec();
        let pick = |rng: &mut StdRng| live.get(rng.gen_range(0..live.len().max(1))).copied();

        match rng.gen_range(0..10) {
            0..=2 => {
                m.create_entity();
            }
            3 | 4 => {
                if let Some(e) = pick(&mut rng) {
                    add(&mut m, e, ALL[rng.gen_range(0..ALL.len())]);
                }
            }
            5 => {
                if let Some(e) = pick(&mut rng) {
                    m.remove_component_by_id(e, ALL[rng.gen_range(0..ALL.len())]).unwrap();
                }
            }
            6 => {
                if let Some(e) = pick(&mut rng) {
                    m.add_tag(e, TAGS[rng.gen_range(0..TAGS.len())]).unwrap();
                }
            }
            7 => {
                if let Some(e) = pick(&mut rng) {
                    if rng.gen_bool(0.5) {
                        m.remove_tag(e, TAGS[rng.gen_range(0..TAGS.len())]).unwrap();
                    } else {
                        m.remove_all_components(e).unwrap();
                    }
                }
            }
            8 => {
                if let Some(e) = pick(&mut rng) {
                    m.remove_entity(e).unwrap();
                    dead.push(e);
                }
            }
            _ => {
                if rng.gen_bool(0.2) {
                    m.remove_entities_by_tag(TAGS[rng.gen_range(0..TAGS.len())]).unwrap();
                }
            }
        }
        check(&m);
    }

    for e in dead {
        assert!(!m.is_alive(e));
        assert!(m.components_of(e).is_empty());
    }

    m.remove_all_entities().unwrap();
    check(&m);
    assert_eq!(m.count(), 0);
    assert_eq!(m.pool_stats().entity.used, 0);
}

#[test]
fn random_operations_keep_indexes_consistent() {
    for seed in 0..8 {
        run(seed, &[]);
    }
}

#[test]
fn random_operations_with_reentrant_listeners() {
    for seed in 100..108 {
        run(seed, &[Listener::Poison, Listener::Bosses]);
    }
}

#[test]
fn random_operations_with_detach_listeners() {
    for seed in 200..208 {
        run(seed, &[Listener::Detach]);
    }
}

#[test]
fn random_operations_with_every_listener() {
    for seed in 300..308 {
        run(seed, &[Listener::Poison, Listener::Bosses, Listener::Detach]);
    }
}
