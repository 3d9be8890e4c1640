//! Scoring parameters of the track registry.

use crate::util::{ShapeTrackError, ShapeTrackResult};

/// How a candidate is associated with an existing tracked object.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum IdentityPolicy {
    /// Same integer centroid; a one-pixel shift starts a new identity.
    #[default]
    ExactPosition,
    /// Nearest live object within `radius` pixels (Euclidean); the object
    /// moves to the candidate's position.
    NearestWithin {
        /// Association radius in pixels.
        radius: f64,
    },
}

/// Persistence scoring parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Upper bound of an object's persistence.
    pub max_score: i32,
    /// Added on every rematch.
    pub found_score: i32,
    /// Added to every object on every update; must be negative.
    pub lost_score: i32,
    /// Persistence of a freshly created object.
    pub initial_score: i32,
    /// Candidate-to-object association rule.
    pub identity: IdentityPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_score: 8,
            found_score: 3,
            lost_score: -2,
            initial_score: 2,
            identity: IdentityPolicy::ExactPosition,
        }
    }
}

impl TrackerConfig {
    /// Checks that the scores describe a decaying, bounded counter.
    pub fn validate(&self) -> ShapeTrackResult<()> {
        if self.max_score <= 0 {
            return Err(invalid("max_score", "must be positive"));
        }
        if self.found_score < 0 {
            return Err(invalid("found_score", "must be non-negative"));
        }
        if self.lost_score >= 0 {
            return Err(invalid("lost_score", "must be negative"));
        }
        if self.initial_score <= 0 || self.initial_score > self.max_score {
            return Err(invalid("initial_score", "must lie in 1..=max_score"));
        }
        if let IdentityPolicy::NearestWithin { radius } = self.identity {
            if !radius.is_finite() || radius < 0.0 {
                return Err(invalid("radius", "must be finite and non-negative"));
            }
        }
        Ok(())
    }
}

fn invalid(key: &'static str, reason: &str) -> ShapeTrackError {
    ShapeTrackError::InvalidConfig {
        key,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{IdentityPolicy, TrackerConfig};
    use crate::util::ShapeTrackError;

    #[test]
    fn defaults_are_valid() {
        TrackerConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_decaying_scores() {
        let cfg = TrackerConfig {
            lost_score: 0,
            ..TrackerConfig::default()
        };
        assert_eq!(
            cfg.validate().unwrap_err(),
            ShapeTrackError::InvalidConfig {
                key: "lost_score",
                reason: "must be negative".to_string()
            }
        );

        let cfg = TrackerConfig {
            initial_score: 9,
            ..TrackerConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = TrackerConfig {
            identity: IdentityPolicy::NearestWithin { radius: f64::NAN },
            ..TrackerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
