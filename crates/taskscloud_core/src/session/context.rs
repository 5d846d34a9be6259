//! Injectable holder of the current identity.
//!
//! Replaces ambient global session lookup: the gate publishes into one
//! `SessionContext`, and every component that needs the caller receives a
//! clone of it.

use crate::model::identity::{Identity, IdentityId};
use std::sync::{Arc, PoisonError, RwLock};

/// Shared, cloneable view of the signed-in identity.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Identity>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context already holding `identity`.
    pub fn signed_in(identity: Identity) -> Self {
        let context = Self::new();
        context.publish(identity);
        context
    }

    pub fn current(&self) -> Option<Identity> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn uid(&self) -> Option<IdentityId> {
        self.current().map(|identity| identity.uid)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn publish(&self, identity: Identity) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(identity);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
