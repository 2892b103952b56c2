use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorState {
    Alive,
    Dead,
    PendingCreation,
    /// Any state this client does not know yet
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorState::Alive => "ALIVE",
            ActorState::Dead => "DEAD",
            ActorState::PendingCreation => "PENDING_CREATION",
            ActorState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A backend service actor (from `GET /actors/`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
    pub namespace: String,
    pub name: String,
    pub class_name: String,
    pub state: ActorState,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorsEnvelope {
    pub actors: Vec<Actor>,
}
