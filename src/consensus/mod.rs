//! Majority voting over a window of frames.
//!
//! The selector collects `cycles` candidate lists, then picks the position
//! observed most often. Ties on the occurrence count go to the smallest mean
//! shape distance, then to the lowest position `(x, y)`. The window is cleared
//! after every vote, so exactly one decision is made per `cycles` updates.

use std::collections::BTreeMap;

use crate::contour::Point;
use crate::shape::Candidate;
use crate::trace::{trace_event, trace_span};
use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Voting window parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusConfig {
    /// Number of updates per vote.
    pub cycles: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self { cycles: 5 }
    }
}

impl ConsensusConfig {
    /// Checks that at least one update is collected per vote.
    pub fn validate(&self) -> ShapeTrackResult<()> {
        if self.cycles == 0 {
            return Err(ShapeTrackError::InvalidConfig {
                key: "cycles",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// The winning position of one vote.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsensusWinner {
    /// Winning integer centroid.
    pub position: Point,
    /// Number of times the position was observed in the window.
    pub occurrences: usize,
    /// Mean shape distance of those observations.
    pub mean_distance: f64,
}

/// Result of one [`ConsensusSelector::vote`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VoteOutcome {
    /// The window is not full yet.
    Pending,
    /// The window completed without any candidate.
    NoCandidates,
    /// The window completed with a winner.
    Winner(ConsensusWinner),
}

impl VoteOutcome {
    /// True when this call closed a window.
    pub fn is_decision(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The winner, if any.
    pub fn winner(self) -> Option<ConsensusWinner> {
        match self {
            Self::Winner(w) => Some(w),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Tally {
    occurrences: usize,
    distance_sum: f64,
}

/// Rolling window of candidate observations.
#[derive(Clone, Debug)]
pub struct ConsensusSelector {
    config: ConsensusConfig,
    window: Vec<Vec<(Point, f64)>>,
}

impl ConsensusSelector {
    /// Creates an empty selector after validating `config`.
    pub fn new(config: ConsensusConfig) -> ShapeTrackResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            window: Vec::with_capacity(config.cycles),
        })
    }

    /// Returns the window parameters.
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Number of updates recorded since the last vote.
    pub fn pending_updates(&self) -> usize {
        self.window.len()
    }

    /// Drops the recorded observations without voting.
    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Records one frame and votes when the window is full.
    pub fn vote(&mut self, candidates: &[Candidate]) -> VoteOutcome {
        self.window
            .push(candidates.iter().map(|c| (c.position, c.distance)).collect());
        if self.window.len() < self.config.cycles {
            return VoteOutcome::Pending;
        }

        let _span = trace_span!("consensus_vote", cycles = self.window.len()).entered();
        let outcome = match self.decide() {
            Some(winner) => {
                trace_event!(
                    "consensus_winner",
                    x = winner.position.x,
                    y = winner.position.y,
                    occurrences = winner.occurrences
                );
                VoteOutcome::Winner(winner)
            }
            None => {
                trace_event!("consensus_empty");
                VoteOutcome::NoCandidates
            }
        };
        self.window.clear();
        outcome
    }

    /// Records one frame; returns the winner on the call that completes a window.
    pub fn update(&mut self, candidates: &[Candidate]) -> Option<ConsensusWinner> {
        self.vote(candidates).winner()
    }

    fn decide(&self) -> Option<ConsensusWinner> {
        let mut tallies: BTreeMap<Point, Tally> = BTreeMap::new();
        for &(position, distance) in self.window.iter().flatten() {
            let tally = tallies.entry(position).or_insert(Tally {
                occurrences: 0,
                distance_sum: 0.0,
            });
            tally.occurrences += 1;
            tally.distance_sum += distance;
        }

        let top = tallies.values().map(|t| t.occurrences).max()?;
        let mut best: Option<ConsensusWinner> = None;
        for (&position, tally) in &tallies {
            if tally.occurrences != top {
                continue;
            }
            let mean_distance = tally.distance_sum / tally.occurrences as f64;
            // ascending key order resolves equal means to the lowest position
            if best.map_or(true, |b| mean_distance < b.mean_distance) {
                best = Some(ConsensusWinner {
                    position,
                    occurrences: tally.occurrences,
                    mean_distance,
                });
            }
        }
        best
    }
}
