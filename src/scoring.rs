use serde::Serialize;

use crate::model::{Rank, Task};

/// Score reported when there is nothing left to do.
pub const EMPTY_SCORE: i64 = 100;

/// Inclusive lower bounds of each rank, best first. Anything below the
/// last one is a D.
const RANK_THRESHOLDS: [(i64, Rank); 3] = [(270, Rank::A), (210, Rank::B), (120, Rank::C)];

/// The score of the day and the rank it earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub score: i64,
    pub rank: Rank,
}

/// Compute the standing over every task.
///
/// The score is the sum of `progress * priority`. Since a larger priority
/// number means a less urgent task, low urgency work weighs more than urgent
/// work at equal progress. This is kept on purpose; changing it changes every
/// recorded rank.
///
/// Neither field is bounded, so the arithmetic saturates at the `i64` limits
/// instead of overflowing.
pub fn standing(tasks: &[Task]) -> Standing {
    if tasks.is_empty() {
        return Standing {
            score: EMPTY_SCORE,
            rank: Rank::A,
        };
    }

    let score = tasks
        .iter()
        .map(|t| t.progress.saturating_mul(t.priority))
        .fold(0i64, i64::saturating_add);
    Standing {
        score,
        rank: rank_for(score),
    }
}

/// Bucket a score into its rank.
pub fn rank_for(score: i64) -> Rank {
    RANK_THRESHOLDS
        .iter()
        .find(|(bound, _)| score >= *bound)
        .map(|(_, rank)| *rank)
        .unwrap_or(Rank::D)
}
