use pkg_constants::workload::RBAC_API_GROUP;
use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

// --- Verbs ---

/// Operations a policy rule can grant. The set is closed: anything else in a
/// config file fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Get,
    List,
    Watch,
    Create,
    Update,
    Patch,
    Delete,
    DeleteCollection,
}

// --- Policy rules ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// API groups this rule applies to ("" is the core group)
    pub api_groups: Vec<String>,
    /// Resource types (e.g. "pods", "services")
    pub resources: Vec<String>,
    pub verbs: Vec<Verb>,
}

impl PolicyRule {
    pub fn new(api_group: &str, resources: &[&str], verbs: &[Verb]) -> Self {
        Self {
            api_groups: vec![api_group.to_string()],
            resources: resources.iter().map(|r| r.to_string()).collect(),
            verbs: verbs.to_vec(),
        }
    }
}

/// Read access to every object kind the exporter reports on, plus the two
/// review APIs it uses to protect its own endpoints.
pub fn kube_state_metrics_rules() -> Vec<PolicyRule> {
    const READ: &[Verb] = &[Verb::List, Verb::Watch];
    vec![
        PolicyRule::new(
            "",
            &[
                "configmaps",
                "secrets",
                "nodes",
                "pods",
                "services",
                "serviceaccounts",
                "resourcequotas",
                "replicationcontrollers",
                "limitranges",
                "persistentvolumeclaims",
                "persistentvolumes",
                "namespaces",
                "endpoints",
            ],
            READ,
        ),
        PolicyRule::new(
            "apps",
            &["statefulsets", "daemonsets", "deployments", "replicasets"],
            READ,
        ),
        PolicyRule::new("batch", &["cronjobs", "jobs"], READ),
        PolicyRule::new("autoscaling", &["horizontalpodautoscalers"], READ),
        PolicyRule::new("authentication.k8s.io", &["tokenreviews"], &[Verb::Create]),
        PolicyRule::new(
            "authorization.k8s.io",
            &["subjectaccessreviews"],
            &[Verb::Create],
        ),
        PolicyRule::new("policy", &["poddisruptionbudgets"], READ),
        PolicyRule::new("certificates.k8s.io", &["certificatesigningrequests"], READ),
        PolicyRule::new(
            "storage.k8s.io",
            &["storageclasses", "volumeattachments"],
            READ,
        ),
        PolicyRule::new(
            "admissionregistration.k8s.io",
            &[
                "mutatingwebhookconfigurations",
                "validatingwebhookconfigurations",
            ],
            READ,
        ),
        PolicyRule::new("networking.k8s.io", &["networkpolicies", "ingresses"], READ),
        PolicyRule::new("coordination.k8s.io", &["leases"], READ),
        PolicyRule::new(
            RBAC_API_GROUP,
            &[
                "clusterrolebindings",
                "clusterroles",
                "rolebindings",
                "roles",
            ],
            READ,
        ),
    ]
}

// --- Role ---

/// Payload of both `Role` and `ClusterRole`; the descriptor tag decides
/// which one the platform sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub api_version: String,
    pub metadata: ObjectMeta,
    pub rules: Vec<PolicyRule>,
}

// --- Subject ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

// --- RoleBinding ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    pub api_group: String,
    /// "Role" or "ClusterRole"
    pub kind: String,
    pub name: String,
}

/// Payload of both `RoleBinding` and `ClusterRoleBinding`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub api_version: String,
    pub metadata: ObjectMeta,
    pub role_ref: RoleRef,
    pub subjects: Vec<Subject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_serialize_lowercase() {
        let yaml = serde_yaml::to_string(&vec![Verb::List, Verb::DeleteCollection]).unwrap();
        assert_eq!(yaml, "- list\n- deletecollection\n");
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let parsed: Result<Vec<Verb>, _> = serde_yaml::from_str("- list\n- escalate\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn default_rules_only_create_reviews() {
        let rules = kube_state_metrics_rules();
        assert_eq!(rules.len(), 13);
        for rule in &rules {
            if rule.verbs.contains(&Verb::Create) {
                assert_eq!(rule.verbs, vec![Verb::Create]);
                assert!(rule.resources[0].ends_with("reviews"));
            } else {
                assert_eq!(rule.verbs, vec![Verb::List, Verb::Watch]);
            }
        }
        assert_eq!(rules[0].api_groups, vec![String::new()]);
        assert!(rules[0].resources.contains(&"endpoints".to_string()));
    }
}
