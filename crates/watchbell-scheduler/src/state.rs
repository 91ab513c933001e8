//! State shared between job bodies and command handling.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::store::ArtifactStore;
use crate::subscribers::SubscriberRegistry;

/// Everything the scheduler and the command loop both touch. Lives behind a
/// single mutex so a job firing and a command never interleave.
pub struct BotState {
    pub subscribers: SubscriberRegistry,
    pub status: ArtifactStore,
}

impl BotState {
    pub fn new(subscribers: SubscriberRegistry, status: ArtifactStore) -> Self {
        Self {
            subscribers,
            status,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}

pub type SharedState = Arc<Mutex<BotState>>;
