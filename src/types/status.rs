//! Connection liveness states.

use serde::{Deserialize, Serialize};

/// Liveness of a target's connection.
///
/// `Wait` is both the initial state and the state after an explicit
/// disconnect; unknown targets report `Wait`. `Dead` covers dial failure,
/// peer-initiated closure, and forced kills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkStatus {
    Wait,
    Alive,
    Dead,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            LinkStatus::Wait => "Wait",
            LinkStatus::Alive => "Alive",
            LinkStatus::Dead => "Dead",
        };
        f.write_str(text)
    }
}
