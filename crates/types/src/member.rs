use serde::{Deserialize, Serialize};

/// Community membership of a single identity.
///
/// Lookups of identities that never joined return [`Member::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub exists: bool,
    /// UNIX seconds at which the join was applied.
    #[serde(default)]
    pub joined_at: u64,
}

impl Member {
    pub fn joined(joined_at: u64) -> Self {
        Self {
            exists: true,
            joined_at,
        }
    }
}
