use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shapetrack::{
    Candidate, Contour, IdentityPolicy, Point, TrackRegistry, TrackState, TrackerConfig,
};

fn at(x: i32, y: i32) -> Candidate {
    Candidate {
        position: Point::new(x, y),
        contour: Contour::from_xy(&[(x - 5, y - 5), (x - 5, y + 5), (x + 5, y + 5), (x + 5, y - 5)]),
        distance: 0.05,
        area: 100.0,
        perimeter: 40.0,
    }
}

fn persistence(reg: &TrackRegistry, x: i32, y: i32) -> Option<i32> {
    reg.get(Point::new(x, y)).map(|o| o.persistence)
}

#[test]
fn rematch_then_loss_evicts_after_two_misses() {
    let mut reg = TrackRegistry::new(TrackerConfig::default()).unwrap();
    let p = (40, 30);

    reg.process_candidates(&[at(p.0, p.1)]);
    reg.update();
    assert_eq!(persistence(&reg, p.0, p.1), Some(2));

    reg.process_candidates(&[at(p.0, p.1)]);
    reg.update();
    assert_eq!(persistence(&reg, p.0, p.1), Some(3));

    reg.process_candidates(&[]);
    reg.update();
    assert_eq!(persistence(&reg, p.0, p.1), Some(1));

    reg.process_candidates(&[]);
    let live = reg.update();
    assert!(live.is_empty());
    assert_eq!(persistence(&reg, p.0, p.1), None);
}

#[test]
fn update_returns_survivors_in_position_order() {
    let mut reg = TrackRegistry::new(TrackerConfig::default()).unwrap();
    reg.process_candidates(&[at(50, 5), at(10, 90), at(10, 20)]);
    let live: Vec<Point> = reg.update().iter().map(|o| o.position).collect();
    assert_eq!(
        live,
        vec![Point::new(10, 20), Point::new(10, 90), Point::new(50, 5)]
    );
    assert_eq!(reg.positions(), live);
}

#[test]
fn one_pixel_shift_starts_a_new_identity() {
    let mut reg = TrackRegistry::new(TrackerConfig::default()).unwrap();
    reg.process_candidates(&[at(20, 20)]);
    reg.update();
    reg.process_candidates(&[at(20, 20)]);
    reg.update();
    reg.process_candidates(&[at(21, 20)]);
    reg.update();

    assert_eq!(reg.len(), 2);
    assert_eq!(persistence(&reg, 20, 20), Some(1));
    assert_eq!(persistence(&reg, 21, 20), Some(2));
    assert_eq!(reg.get(Point::new(21, 20)).unwrap().id, 1);
}

#[test]
fn nearest_policy_follows_small_motion() {
    let config = TrackerConfig {
        identity: IdentityPolicy::NearestWithin { radius: 3.0 },
        ..TrackerConfig::default()
    };
    let mut reg = TrackRegistry::new(config).unwrap();
    reg.process_candidates(&[at(20, 20)]);
    reg.update();

    for step in 1..=4 {
        reg.process_candidates(&[at(20 + step, 20 + step)]);
        reg.update();
    }
    assert_eq!(reg.len(), 1);
    let obj = reg.iter().next().unwrap();
    assert_eq!(obj.position, Point::new(24, 24));
    assert_eq!(obj.id, 0);
    assert_eq!(obj.hits, 5);
    assert_eq!(obj.state, TrackState::Confirmed);
}

#[test]
fn nearest_policy_ignores_objects_outside_radius() {
    let config = TrackerConfig {
        identity: IdentityPolicy::NearestWithin { radius: 2.0 },
        ..TrackerConfig::default()
    };
    let mut reg = TrackRegistry::new(config).unwrap();
    reg.process_candidates(&[at(0, 0)]);
    reg.update();
    reg.process_candidates(&[at(2, 1)]);
    reg.update();
    assert_eq!(persistence(&reg, 0, 0), None);
    let obj = reg.get(Point::new(2, 1)).unwrap();
    assert_eq!(obj.id, 1);
    assert_eq!(obj.hits, 1);
}

#[test]
fn invalid_scores_are_rejected() {
    let bad = [
        TrackerConfig {
            lost_score: 0,
            ..TrackerConfig::default()
        },
        TrackerConfig {
            initial_score: 9,
            ..TrackerConfig::default()
        },
        TrackerConfig {
            identity: IdentityPolicy::NearestWithin { radius: -1.0 },
            ..TrackerConfig::default()
        },
    ];
    for config in bad {
        assert!(TrackRegistry::new(config).is_err(), "{config:?}");
    }
}

#[test]
fn random_sequences_keep_scores_bounded() {
    let config = TrackerConfig::default();
    let grid = [(10, 10), (10, 40), (40, 10), (40, 40), (25, 25)];
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut reg = TrackRegistry::new(config).unwrap();
    let mut model: BTreeMap<Point, i32> = BTreeMap::new();

    for _ in 0..500 {
        let count = rng.random_range(0..=4);
        let candidates: Vec<Candidate> = (0..count)
            .map(|_| {
                let (x, y) = grid[rng.random_range(0..grid.len())];
                at(x, y)
            })
            .collect();

        let mut fresh = Vec::new();
        for c in &candidates {
            match model.get_mut(&c.position) {
                Some(p) => {
                    *p = (*p + config.found_score).min(config.max_score);
                    fresh.retain(|f| *f != c.position);
                }
                None => {
                    model.insert(c.position, config.initial_score);
                    fresh.push(c.position);
                }
            }
        }
        for (pos, p) in model.iter_mut() {
            if !fresh.contains(pos) {
                *p += config.lost_score;
            }
        }
        model.retain(|_, p| *p > 0);

        reg.process_candidates(&candidates);
        let live = reg.update();
        assert!(live
            .iter()
            .all(|o| o.persistence > 0 && o.persistence <= config.max_score));

        let actual: BTreeMap<Point, i32> = reg.iter().map(|o| (o.position, o.persistence)).collect();
        assert_eq!(actual, model);
    }
}

#[test]
fn clear_forgets_everything_but_ids_keep_counting() {
    let mut reg = TrackRegistry::new(TrackerConfig::default()).unwrap();
    reg.process_candidates(&[at(1, 1), at(2, 2)]);
    reg.update();
    reg.clear();
    assert!(reg.is_empty());
    reg.process_candidates(&[at(1, 1)]);
    assert_eq!(reg.get(Point::new(1, 1)).unwrap().id, 2);
}
