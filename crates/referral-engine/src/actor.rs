use referral_shared::types::{AccountId, Role};
use serde::{Deserialize, Serialize};

/// The authenticated caller, as asserted by the session layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: AccountId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: AccountId, role: Role) -> Self {
        Self { id, role }
    }
}
