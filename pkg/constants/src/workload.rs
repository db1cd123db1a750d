//! Defaults describing the kube-state-metrics workload.

/// Default workload name. Also used for the role, binding, service account
/// and service.
pub const DEFAULT_NAME: &str = "kube-state-metrics";

/// Default namespace for every descriptor in the bundle.
pub const DEFAULT_NAMESPACE: &str = "kube-system";

/// Default container image.
pub const DEFAULT_IMAGE: &str = "registry.k8s.io/kube-state-metrics/kube-state-metrics:v2.5.0";

/// Label key used for selection when no labels are configured.
pub const APP_LABEL: &str = "app";

pub const DEFAULT_REPLICAS: i32 = 1;

pub const DEFAULT_CPU_LIMIT: &str = "200m";
pub const DEFAULT_MEMORY_LIMIT: &str = "200Mi";
pub const DEFAULT_CPU_REQUEST: &str = "100m";
pub const DEFAULT_MEMORY_REQUEST: &str = "100Mi";

/// The `nobody` uid/gid the exporter runs as.
pub const NOBODY_ID: i64 = 65534;

/// API group of the RBAC objects.
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";
