use pkg_constants::network::{
    LIVENESS_PATH, METRICS_PORT, METRICS_PORT_NAME, PROBE_INITIAL_DELAY_SECONDS,
    PROBE_TIMEOUT_SECONDS, READINESS_PATH, TELEMETRY_PORT, TELEMETRY_PORT_NAME,
};
use pkg_constants::workload::{
    APP_LABEL, DEFAULT_CPU_LIMIT, DEFAULT_CPU_REQUEST, DEFAULT_IMAGE, DEFAULT_MEMORY_LIMIT,
    DEFAULT_MEMORY_REQUEST, DEFAULT_NAME, DEFAULT_NAMESPACE, DEFAULT_REPLICAS, NOBODY_ID,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::pod::{Protocol, ResourceList, ResourceRequirements};
use crate::rbac::{PolicyRule, kube_state_metrics_rules};
use crate::service::ServiceType;

// --- Workload options ---

/// Whether the exporter's permissions cover the whole cluster or only the
/// workload's namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RbacScope {
    #[default]
    Cluster,
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub name: String,
    pub container_port: i32,
    #[serde(default)]
    pub protocol: Protocol,
    /// Port exposed by the service; defaults to `container_port`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposed_port: Option<i32>,
}

impl PortSpec {
    pub fn tcp(name: &str, container_port: i32) -> Self {
        Self {
            name: name.to_string(),
            container_port,
            protocol: Protocol::Tcp,
            exposed_port: None,
        }
    }

    pub fn service_port(&self) -> i32 {
        self.exposed_port.unwrap_or(self.container_port)
    }
}

fn default_initial_delay() -> i32 {
    PROBE_INITIAL_DELAY_SECONDS
}
fn default_timeout() -> i32 {
    PROBE_TIMEOUT_SECONDS
}

/// HTTP GET health check against one of the declared container ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    pub path: String,
    pub port: i32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: i32,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i32,
}

impl ProbeSpec {
    pub fn http(path: &str, port: i32) -> Self {
        Self {
            path: path.to_string(),
            port,
            initial_delay_seconds: PROBE_INITIAL_DELAY_SECONDS,
            timeout_seconds: PROBE_TIMEOUT_SECONDS,
        }
    }
}

fn default_nobody() -> i64 {
    NOBODY_ID
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    #[serde(default = "default_nobody")]
    pub run_as_user: i64,
    #[serde(default = "default_nobody")]
    pub fs_group: i64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            run_as_user: NOBODY_ID,
            fs_group: NOBODY_ID,
        }
    }
}

// --- Workload config ---

/// Everything the builder needs to describe one workload deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    pub name: String,
    pub namespace: String,
    pub image: String,
    /// Applied to every descriptor and used as the pod selector
    pub labels: BTreeMap<String, String>,
    pub replicas: i32,
    pub resources: ResourceRequirements,
    pub ports: Vec<PortSpec>,
    pub rules: Vec<PolicyRule>,
    pub rbac_scope: RbacScope,
    pub service_type: ServiceType,
    pub liveness_probe: Option<ProbeSpec>,
    pub readiness_probe: Option<ProbeSpec>,
    pub security: SecuritySettings,
}

/// `{app: <name>}`, the selector used when none is configured.
pub fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

impl Default for WorkloadConfig {
    /// The stock kube-state-metrics deployment.
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            labels: app_labels(DEFAULT_NAME),
            replicas: DEFAULT_REPLICAS,
            resources: ResourceRequirements {
                limits: ResourceList::new(DEFAULT_CPU_LIMIT, DEFAULT_MEMORY_LIMIT),
                requests: ResourceList::new(DEFAULT_CPU_REQUEST, DEFAULT_MEMORY_REQUEST),
            },
            ports: vec![
                PortSpec::tcp(METRICS_PORT_NAME, METRICS_PORT),
                PortSpec::tcp(TELEMETRY_PORT_NAME, TELEMETRY_PORT),
            ],
            rules: kube_state_metrics_rules(),
            rbac_scope: RbacScope::default(),
            service_type: ServiceType::default(),
            liveness_probe: Some(ProbeSpec::http(LIVENESS_PATH, METRICS_PORT)),
            readiness_probe: Some(ProbeSpec::http(READINESS_PATH, TELEMETRY_PORT)),
            security: SecuritySettings::default(),
        }
    }
}

// --- Config file ---

/// Workload configuration file (YAML). Every field is optional; missing
/// fields fall back to the stock kube-state-metrics values.
///
/// Example `config.yaml`:
/// ```yaml
/// name: kube-state-metrics
/// namespace: monitoring
/// image: registry.k8s.io/kube-state-metrics/kube-state-metrics:v2.10.1
/// replicas: 2
/// rbac-scope: namespace
/// ports:
///   - name: http-metrics
///     containerPort: 8080
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<PortSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<PolicyRule>>,
    #[serde(default, alias = "rbac-scope", skip_serializing_if = "Option::is_none")]
    pub rbac_scope: Option<RbacScope>,
    #[serde(default, alias = "service-type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, alias = "liveness-probe", skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<ProbeSpec>,
    #[serde(default, alias = "readiness-probe", skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<ProbeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySettings>,
}

impl WorkloadConfigFile {
    /// Merge over the defaults. A custom name without custom labels selects
    /// on `app: <name>`; custom ports drop the stock probes, which target
    /// the stock ports.
    pub fn into_config(self) -> WorkloadConfig {
        let defaults = WorkloadConfig::default();
        let name = self.name.unwrap_or(defaults.name);
        let labels = self.labels.unwrap_or_else(|| app_labels(&name));
        let (default_liveness, default_readiness) = if self.ports.is_some() {
            (None, None)
        } else {
            (defaults.liveness_probe, defaults.readiness_probe)
        };
        WorkloadConfig {
            labels,
            name,
            namespace: self.namespace.unwrap_or(defaults.namespace),
            image: self.image.unwrap_or(defaults.image),
            replicas: self.replicas.unwrap_or(defaults.replicas),
            resources: self.resources.unwrap_or(defaults.resources),
            ports: self.ports.unwrap_or(defaults.ports),
            rules: self.rules.unwrap_or(defaults.rules),
            rbac_scope: self.rbac_scope.unwrap_or(defaults.rbac_scope),
            service_type: self.service_type.unwrap_or(defaults.service_type),
            liveness_probe: self.liveness_probe.or(default_liveness),
            readiness_probe: self.readiness_probe.or(default_readiness),
            security: self.security.unwrap_or(defaults.security),
        }
    }
}

impl From<WorkloadConfig> for WorkloadConfigFile {
    fn from(config: WorkloadConfig) -> Self {
        Self {
            name: Some(config.name),
            namespace: Some(config.namespace),
            image: Some(config.image),
            labels: Some(config.labels),
            replicas: Some(config.replicas),
            resources: Some(config.resources),
            ports: Some(config.ports),
            rules: Some(config.rules),
            rbac_scope: Some(config.rbac_scope),
            service_type: Some(config.service_type),
            liveness_probe: config.liveness_probe,
            readiness_probe: config.readiness_probe,
            security: Some(config.security),
        }
    }
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using defaults", path);
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_stock_deployment() {
        let config = WorkloadConfig::default();
        assert_eq!(config.name, "kube-state-metrics");
        assert_eq!(config.namespace, "kube-system");
        assert_eq!(config.labels, app_labels("kube-state-metrics"));
        assert_eq!(config.replicas, 1);
        assert_eq!(config.ports.len(), 2);
        assert_eq!(config.ports[0].service_port(), 8080);
        assert_eq!(config.liveness_probe.as_ref().unwrap().path, "/healthz");
        assert_eq!(config.readiness_probe.as_ref().unwrap().port, 8081);
        assert_eq!(config.security.run_as_user, 65534);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file: WorkloadConfigFile = serde_yaml::from_str("{}").unwrap();
        assert_eq!(file.into_config(), WorkloadConfig::default());
    }

    #[test]
    fn custom_name_relabels_when_labels_missing() {
        let file: WorkloadConfigFile = serde_yaml::from_str("name: ksm\nreplicas: 3\n").unwrap();
        let config = file.into_config();
        assert_eq!(config.name, "ksm");
        assert_eq!(config.replicas, 3);
        assert_eq!(config.labels, app_labels("ksm"));
        assert_eq!(config.namespace, "kube-system");
    }

    #[test]
    fn explicit_labels_are_kept() {
        let yaml = "name: ksm\nlabels:\n  app.kubernetes.io/name: ksm\n  tier: monitoring\n";
        let config = serde_yaml::from_str::<WorkloadConfigFile>(yaml)
            .unwrap()
            .into_config();
        assert_eq!(config.labels.len(), 2);
        assert_eq!(config.labels["tier"], "monitoring");
    }

    #[test]
    fn kebab_case_aliases() {
        let yaml = "rbac-scope: namespace\nservice-type: NodePort\nliveness-probe:\n  path: /livez\n  port: 8080\n";
        let config = serde_yaml::from_str::<WorkloadConfigFile>(yaml)
            .unwrap()
            .into_config();
        assert_eq!(config.rbac_scope, RbacScope::Namespace);
        assert_eq!(config.service_type, ServiceType::NodePort);
        let probe = config.liveness_probe.unwrap();
        assert_eq!(probe.path, "/livez");
        assert_eq!(probe.initial_delay_seconds, 5);
        assert_eq!(probe.timeout_seconds, 5);
    }

    #[test]
    fn ports_parse_with_protocol_default() {
        let yaml = "ports:\n  - name: metrics\n    containerPort: 9100\n    exposedPort: 80\n  - name: dns\n    containerPort: 53\n    protocol: UDP\n";
        let config = serde_yaml::from_str::<WorkloadConfigFile>(yaml)
            .unwrap()
            .into_config();
        assert_eq!(config.ports[0].protocol, Protocol::Tcp);
        assert_eq!(config.ports[0].service_port(), 80);
        assert_eq!(config.ports[1].protocol, Protocol::Udp);
        assert!(config.liveness_probe.is_none());
        assert!(config.readiness_probe.is_none());
    }

    #[test]
    fn defaults_survive_a_round_trip_through_the_file_form() {
        let yaml = serde_yaml::to_string(&WorkloadConfigFile::from(WorkloadConfig::default())).unwrap();
        let config = serde_yaml::from_str::<WorkloadConfigFile>(&yaml)
            .unwrap()
            .into_config();
        assert_eq!(config, WorkloadConfig::default());
    }

    #[test]
    fn missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let file: WorkloadConfigFile = load_config_file(path.to_str().unwrap()).unwrap();
        assert!(file.name.is_none());
    }

    #[test]
    fn existing_file_is_parsed() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "namespace: monitoring").unwrap();
        let file: WorkloadConfigFile = load_config_file(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(file.namespace.as_deref(), Some("monitoring"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "replicas: [not, a, number]").unwrap();
        let result: anyhow::Result<WorkloadConfigFile> = load_config_file(tmp.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
