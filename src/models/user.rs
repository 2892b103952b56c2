use serde::{Deserialize, Serialize};

/// Current user information (from `GET /user/info`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub display_name: String,
    pub is_admin: bool,
    #[serde(default)]
    pub memberships: serde_json::Value,
    pub file_count: i64,
    pub pending_files: i64,
    pub total_files: i64,
    /// `-1` means the quota is unlimited
    pub file_quota: i64,
}

impl UserInfo {
    pub fn has_unlimited_quota(&self) -> bool {
        self.file_quota < 0
    }

    /// Files the user may still submit, `None` when unlimited.
    pub fn remaining_quota(&self) -> Option<i64> {
        if self.has_unlimited_quota() {
            None
        } else {
            Some((self.file_quota - self.total_files).max(0))
        }
    }
}
