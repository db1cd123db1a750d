use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub api_version: String,
    pub metadata: ObjectMeta,
    /// Pods opt in through their own spec; the account itself does not
    /// mount a token by default.
    pub automount_service_account_token: bool,
}
