use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity shared by every descriptor in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: labels.clone(),
        }
    }
}
