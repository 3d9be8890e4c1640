//! Persistence-scored tracking of candidate positions across frames.
//!
//! Each cycle runs [`TrackRegistry::process_candidates`] followed by
//! [`TrackRegistry::update`]. Matching adds `found_score` (clamped at
//! `max_score`); the update then decays every object by `lost_score` and
//! evicts objects whose persistence dropped to zero or below. A rematched
//! object therefore changes by `found_score + lost_score` per cycle and an
//! unmatched one by `lost_score`. An object created during the cycle keeps its
//! `initial_score` through that cycle's update.

mod config;

use std::collections::{BTreeMap, BTreeSet};

pub use config::{IdentityPolicy, TrackerConfig};

use crate::contour::{Contour, Point};
use crate::shape::Candidate;
use crate::trace::{trace_event, trace_span};
use crate::util::ShapeTrackResult;

/// Lifecycle stage of a tracked object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackState {
    /// Created from an unmatched candidate; persistence has not risen above
    /// the initial score yet.
    New,
    /// Persistence rose above the initial score at least once.
    Confirmed,
}

/// A persistent identity built from rematched candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedObject {
    /// Stable identifier, unique within one registry.
    pub id: u64,
    /// Identity key: the integer centroid of the latest match.
    pub position: Point,
    /// Confidence counter, `0 < persistence <= max_score` while alive.
    pub persistence: i32,
    /// Latest matching contour.
    pub contour: Contour,
    /// Shape distance of the latest match.
    pub distance: f64,
    /// Number of candidates folded into this object, including the first.
    pub hits: u32,
    /// Lifecycle stage.
    pub state: TrackState,
}

/// Registry of tracked objects keyed by position.
#[derive(Debug)]
pub struct TrackRegistry {
    config: TrackerConfig,
    objects: BTreeMap<Point, TrackedObject>,
    created: BTreeSet<Point>,
    next_id: u64,
}

impl TrackRegistry {
    /// Creates an empty registry after validating `config`.
    pub fn new(config: TrackerConfig) -> ShapeTrackResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            objects: BTreeMap::new(),
            created: BTreeSet::new(),
            next_id: 0,
        })
    }

    /// Returns the scoring configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Folds this frame's candidates into the registry.
    ///
    /// Candidates are processed in order, so two candidates at the same new
    /// position create one object and immediately rematch it.
    pub fn process_candidates(&mut self, candidates: &[Candidate]) {
        let mut created = 0usize;
        let mut rematched = 0usize;
        for candidate in candidates {
            match self.find_match(candidate.position) {
                Some(key) => {
                    self.rematch(key, candidate);
                    rematched += 1;
                }
                None => {
                    self.insert(candidate);
                    created += 1;
                }
            }
        }
        trace_event!("candidates_folded", created = created, rematched = rematched);
    }

    /// Decays every object by `lost_score`, evicts the ones at or below zero
    /// and returns the survivors ordered by position.
    ///
    /// Objects created by the preceding [`TrackRegistry::process_candidates`]
    /// call and not rematched since are not decayed.
    pub fn update(&mut self) -> Vec<&TrackedObject> {
        let _span = trace_span!("track_update", tracked = self.objects.len()).entered();

        let lost = self.config.lost_score;
        let created = std::mem::take(&mut self.created);
        let mut expired = Vec::new();
        for (key, obj) in self.objects.iter_mut() {
            if created.contains(key) {
                continue;
            }
            obj.persistence = obj.persistence.saturating_add(lost);
            if obj.persistence <= 0 {
                expired.push(*key);
            }
        }
        for key in &expired {
            self.objects.remove(key);
        }

        trace_event!(
            "tracks_updated",
            evicted = expired.len(),
            live = self.objects.len()
        );
        self.objects.values().collect()
    }

    /// Live objects ordered by position.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedObject> {
        self.objects.values()
    }

    /// Positions of the live objects in ascending order.
    pub fn positions(&self) -> Vec<Point> {
        self.objects.keys().copied().collect()
    }

    /// Looks up the object keyed by `position`.
    pub fn get(&self, position: Point) -> Option<&TrackedObject> {
        self.objects.get(&position)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops every tracked object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.created.clear();
    }

    fn find_match(&self, position: Point) -> Option<Point> {
        match self.config.identity {
            IdentityPolicy::ExactPosition => {
                self.objects.contains_key(&position).then_some(position)
            }
            IdentityPolicy::NearestWithin { radius } => {
                let limit = radius * radius;
                let mut best: Option<(f64, Point)> = None;
                for key in self.objects.keys() {
                    let dx = f64::from(key.x - position.x);
                    let dy = f64::from(key.y - position.y);
                    let d2 = dx * dx + dy * dy;
                    if d2 > limit {
                        continue;
                    }
                    if best.map_or(true, |(bd, _)| d2 < bd) {
                        best = Some((d2, *key));
                    }
                }
                best.map(|(_, key)| key)
            }
        }
    }

    fn rematch(&mut self, key: Point, candidate: &Candidate) {
        let Some(mut obj) = self.objects.remove(&key) else {
            return;
        };
        self.created.remove(&key);
        obj.persistence = obj
            .persistence
            .saturating_add(self.config.found_score)
            .min(self.config.max_score);
        if obj.persistence > self.config.initial_score {
            obj.state = TrackState::Confirmed;
        }
        obj.position = candidate.position;
        obj.contour = candidate.contour.clone();
        obj.distance = candidate.distance;
        obj.hits = obj.hits.saturating_add(1);
        self.objects.insert(obj.position, obj);
    }

    fn insert(&mut self, candidate: &Candidate) {
        let id = self.next_id;
        self.next_id += 1;
        self.created.insert(candidate.position);
        self.objects.insert(
            candidate.position,
            TrackedObject {
                id,
                position: candidate.position,
                persistence: self.config.initial_score,
                contour: candidate.contour.clone(),
                distance: candidate.distance,
                hits: 1,
                state: TrackState::New,
            },
        );
    }
}
