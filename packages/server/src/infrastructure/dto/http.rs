//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::UserStatus;

/// One registered user as reported by `GET /api/users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummaryDto {
    pub name: String,
    pub status: UserStatus,
    pub remote_address: String,
    /// Whole seconds since the last valid message from this user
    pub idle_seconds: u64,
}
