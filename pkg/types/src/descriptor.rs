use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::deployment::Deployment;
use crate::meta::ObjectMeta;
use crate::rbac::{Role, RoleBinding};
use crate::service::Service;
use crate::service_account::ServiceAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    ClusterRole,
    Role,
    ClusterRoleBinding,
    RoleBinding,
    ServiceAccount,
    Deployment,
    Service,
}

impl ResourceKind {
    pub fn api_version(&self) -> &'static str {
        match self {
            ResourceKind::ClusterRole
            | ResourceKind::Role
            | ResourceKind::ClusterRoleBinding
            | ResourceKind::RoleBinding => "rbac.authorization.k8s.io/v1",
            ResourceKind::Deployment => "apps/v1",
            ResourceKind::ServiceAccount | ResourceKind::Service => "v1",
        }
    }

    /// Cluster-scoped kinds ignore the namespace in their metadata.
    pub fn is_cluster_scoped(&self) -> bool {
        matches!(self, ResourceKind::ClusterRole | ResourceKind::ClusterRoleBinding)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::ClusterRole => write!(f, "ClusterRole"),
            ResourceKind::Role => write!(f, "Role"),
            ResourceKind::ClusterRoleBinding => write!(f, "ClusterRoleBinding"),
            ResourceKind::RoleBinding => write!(f, "RoleBinding"),
            ResourceKind::ServiceAccount => write!(f, "ServiceAccount"),
            ResourceKind::Deployment => write!(f, "Deployment"),
            ResourceKind::Service => write!(f, "Service"),
        }
    }
}

/// One platform object, tagged by `kind` the way the cluster API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResourceDescriptor {
    ClusterRole(Role),
    Role(Role),
    ClusterRoleBinding(RoleBinding),
    RoleBinding(RoleBinding),
    ServiceAccount(ServiceAccount),
    Deployment(Deployment),
    Service(Service),
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescriptor::ClusterRole(_) => ResourceKind::ClusterRole,
            ResourceDescriptor::Role(_) => ResourceKind::Role,
            ResourceDescriptor::ClusterRoleBinding(_) => ResourceKind::ClusterRoleBinding,
            ResourceDescriptor::RoleBinding(_) => ResourceKind::RoleBinding,
            ResourceDescriptor::ServiceAccount(_) => ResourceKind::ServiceAccount,
            ResourceDescriptor::Deployment(_) => ResourceKind::Deployment,
            ResourceDescriptor::Service(_) => ResourceKind::Service,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ResourceDescriptor::ClusterRole(r) | ResourceDescriptor::Role(r) => &r.metadata,
            ResourceDescriptor::ClusterRoleBinding(b) | ResourceDescriptor::RoleBinding(b) => {
                &b.metadata
            }
            ResourceDescriptor::ServiceAccount(sa) => &sa.metadata,
            ResourceDescriptor::Deployment(d) => &d.metadata,
            ResourceDescriptor::Service(s) => &s.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata().namespace
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.metadata().labels
    }
}

impl std::fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind(), self.namespace(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_account() -> ResourceDescriptor {
        let labels = BTreeMap::from([("app".to_string(), "ksm".to_string())]);
        ResourceDescriptor::ServiceAccount(ServiceAccount {
            api_version: ResourceKind::ServiceAccount.api_version().to_string(),
            metadata: ObjectMeta::new("ksm", "monitoring", &labels),
            automount_service_account_token: false,
        })
    }

    #[test]
    fn kind_tag_is_serialized() {
        let yaml = serde_yaml::to_string(&make_account()).unwrap();
        assert!(yaml.starts_with("kind: ServiceAccount\napiVersion: v1\n"));
        assert!(yaml.contains("automountServiceAccountToken: false"));
        assert!(yaml.contains("namespace: monitoring"));
    }

    #[test]
    fn descriptor_parses_back_from_yaml() {
        let yaml = serde_yaml::to_string(&make_account()).unwrap();
        let parsed: ResourceDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, make_account());
        assert_eq!(parsed.kind(), ResourceKind::ServiceAccount);
        assert_eq!(parsed.to_string(), "ServiceAccount monitoring/ksm");
    }

    #[test]
    fn cluster_scope() {
        assert!(ResourceKind::ClusterRole.is_cluster_scoped());
        assert!(ResourceKind::ClusterRoleBinding.is_cluster_scoped());
        assert!(!ResourceKind::RoleBinding.is_cluster_scoped());
        assert_eq!(ResourceKind::Deployment.api_version(), "apps/v1");
    }
}
