use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

/// Tombstones for sessions ended by logout. The gate stays stateless across
/// requests; this list is the one exception the validator consults, and a
/// shared cache slots in behind the same trait for multi-instance setups.
#[async_trait]
pub trait SessionRevocation: Send + Sync {
    /// Tombstone a session id until the artifact itself would have expired.
    async fn revoke(&self, session_id: Uuid, expires_at_unix: i64);
    async fn is_revoked(&self, session_id: Uuid) -> bool;
}

#[derive(Default)]
pub struct MemoryRevocationList {
    revoked: DashMap<Uuid, i64>,
}

impl MemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRevocation for MemoryRevocationList {
    async fn revoke(&self, session_id: Uuid, expires_at_unix: i64) {
        self.revoked.insert(session_id, expires_at_unix);
    }

    async fn is_revoked(&self, session_id: Uuid) -> bool {
        let expired = match self.revoked.get(&session_id) {
            Some(entry) => {
                if *entry >= Utc::now().timestamp() {
                    return true;
                }
                true
            }
            None => false,
        };

        if expired {
            // The artifact is past its own expiry; the tombstone is dead weight.
            self.revoked.remove(&session_id);
        }

        false
    }
}
