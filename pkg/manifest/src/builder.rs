use pkg_constants::network::MAX_PORT;
use pkg_constants::workload::RBAC_API_GROUP;
use pkg_types::config::{PortSpec, ProbeSpec, RbacScope, WorkloadConfig};
use pkg_types::deployment::{Deployment, DeploymentSpec, LabelSelector};
use pkg_types::descriptor::{ResourceDescriptor, ResourceKind};
use pkg_types::meta::ObjectMeta;
use pkg_types::pod::{
    Container, ContainerPort, HttpGetAction, PodSecurityContext, PodSpec, PodTemplateMeta,
    PodTemplateSpec, Probe, Protocol, ResourceList, SecurityContext,
};
use pkg_types::quantity::{parse_cpu_millis, parse_memory_bytes};
use pkg_types::rbac::{Role, RoleBinding, RoleRef, Subject, SubjectKind};
use pkg_types::service::{Service, ServicePort, ServiceSpec};
use pkg_types::service_account::ServiceAccount;
use pkg_types::validate::{
    validate_image, validate_label_key, validate_label_value, validate_name, validate_port_name,
    validate_service_name,
};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::{FieldContext, InvalidConfiguration};

/// Build the bundle for one workload: role, binding, service account,
/// deployment, service. Each descriptor only references ones before it.
///
/// The whole config is validated first, so on error nothing is produced.
pub fn build(config: &WorkloadConfig) -> Result<Vec<ResourceDescriptor>, InvalidConfiguration> {
    validate(config)?;

    let descriptors = vec![
        role(config),
        role_binding(config),
        service_account(config),
        deployment(config),
        service(config),
    ];
    for descriptor in &descriptors {
        debug!("Built {}", descriptor);
    }
    info!(
        "Built {} descriptors for {}/{} (service type {})",
        descriptors.len(),
        config.namespace,
        config.name,
        config.service_type
    );
    Ok(descriptors)
}

// --- Validation ---

/// Check every constraint on the config, reporting the first violation.
pub fn validate(config: &WorkloadConfig) -> Result<(), InvalidConfiguration> {
    validate_service_name(&config.name).field("name")?;
    validate_name(&config.namespace).field("namespace")?;
    validate_image(&config.image).field("image")?;

    if config.labels.is_empty() {
        return Err(InvalidConfiguration::new(
            "labels",
            "at least one label is required to select the pods",
        ));
    }
    for (key, value) in &config.labels {
        validate_label_key(key).field(format!("labels.{}", key))?;
        validate_label_value(value).field(format!("labels.{}", key))?;
    }

    if config.replicas < 0 {
        return Err(InvalidConfiguration::new(
            "replicas",
            format!("must be >= 0 (got {})", config.replicas),
        ));
    }

    validate_resources(config)?;
    validate_ports(&config.ports)?;
    validate_rules(config)?;

    if let Some(probe) = &config.liveness_probe {
        validate_probe(probe, &config.ports, "livenessProbe")?;
    }
    if let Some(probe) = &config.readiness_probe {
        validate_probe(probe, &config.ports, "readinessProbe")?;
    }

    if config.security.run_as_user <= 0 {
        return Err(InvalidConfiguration::new(
            "security.runAsUser",
            format!(
                "must be a positive non-root uid (got {})",
                config.security.run_as_user
            ),
        ));
    }
    if config.security.fs_group < 0 {
        return Err(InvalidConfiguration::new(
            "security.fsGroup",
            format!("must be >= 0 (got {})", config.security.fs_group),
        ));
    }
    Ok(())
}

/// Parsed (cpu millicores, memory bytes) of one resource list.
fn parse_list(
    list: &ResourceList,
    prefix: &str,
) -> Result<(Option<u64>, Option<u64>), InvalidConfiguration> {
    let cpu = list
        .cpu
        .as_deref()
        .map(|q| parse_cpu_millis(q).field(format!("{}.cpu", prefix)))
        .transpose()?;
    let memory = list
        .memory
        .as_deref()
        .map(|q| parse_memory_bytes(q).field(format!("{}.memory", prefix)))
        .transpose()?;
    Ok((cpu, memory))
}

fn validate_resources(config: &WorkloadConfig) -> Result<(), InvalidConfiguration> {
    let (cpu_limit, memory_limit) = parse_list(&config.resources.limits, "resources.limits")?;
    let (cpu_request, memory_request) =
        parse_list(&config.resources.requests, "resources.requests")?;

    if let (Some(request), Some(limit)) = (cpu_request, cpu_limit) {
        if request > limit {
            return Err(InvalidConfiguration::new(
                "resources.requests.cpu",
                format!("request {}m exceeds limit {}m", request, limit),
            ));
        }
    }
    if let (Some(request), Some(limit)) = (memory_request, memory_limit) {
        if request > limit {
            return Err(InvalidConfiguration::new(
                "resources.requests.memory",
                format!("request {} bytes exceeds limit {} bytes", request, limit),
            ));
        }
    }
    Ok(())
}

fn check_port_range(port: i32, field: String) -> Result<(), InvalidConfiguration> {
    if !(1..=MAX_PORT).contains(&port) {
        return Err(InvalidConfiguration::new(
            field,
            format!("must be in 1..={} (got {})", MAX_PORT, port),
        ));
    }
    Ok(())
}

fn validate_ports(ports: &[PortSpec]) -> Result<(), InvalidConfiguration> {
    if ports.is_empty() {
        return Err(InvalidConfiguration::new(
            "ports",
            "at least one port is required to expose the service",
        ));
    }

    let mut names = HashSet::new();
    let mut container_ports = HashSet::new();
    let mut service_ports = HashSet::new();
    for (i, port) in ports.iter().enumerate() {
        validate_port_name(&port.name).field(format!("ports[{}].name", i))?;
        check_port_range(port.container_port, format!("ports[{}].containerPort", i))?;
        if let Some(exposed) = port.exposed_port {
            check_port_range(exposed, format!("ports[{}].exposedPort", i))?;
        }

        if !names.insert(port.name.as_str()) {
            return Err(InvalidConfiguration::new(
                format!("ports[{}].name", i),
                format!("duplicate port name '{}'", port.name),
            ));
        }
        if !container_ports.insert((port.container_port, port.protocol)) {
            return Err(InvalidConfiguration::new(
                format!("ports[{}].containerPort", i),
                format!(
                    "duplicate container port {}/{}",
                    port.container_port, port.protocol
                ),
            ));
        }
        if !service_ports.insert((port.service_port(), port.protocol)) {
            return Err(InvalidConfiguration::new(
                format!("ports[{}].exposedPort", i),
                format!(
                    "duplicate service port {}/{}",
                    port.service_port(),
                    port.protocol
                ),
            ));
        }
    }
    Ok(())
}

fn validate_rules(config: &WorkloadConfig) -> Result<(), InvalidConfiguration> {
    if config.rules.is_empty() {
        return Err(InvalidConfiguration::new(
            "rules",
            "at least one permission rule is required",
        ));
    }
    for (i, rule) in config.rules.iter().enumerate() {
        if rule.api_groups.is_empty() {
            return Err(InvalidConfiguration::new(
                format!("rules[{}].apiGroups", i),
                "must list at least one group (\"\" is the core group)",
            ));
        }
        if rule.resources.is_empty() || rule.resources.iter().any(|r| r.is_empty()) {
            return Err(InvalidConfiguration::new(
                format!("rules[{}].resources", i),
                "must list at least one non-empty resource type",
            ));
        }
        if rule.verbs.is_empty() {
            return Err(InvalidConfiguration::new(
                format!("rules[{}].verbs", i),
                "must list at least one verb",
            ));
        }
    }
    Ok(())
}

fn validate_probe(
    probe: &ProbeSpec,
    ports: &[PortSpec],
    field: &str,
) -> Result<(), InvalidConfiguration> {
    if !probe.path.starts_with('/') {
        return Err(InvalidConfiguration::new(
            format!("{}.path", field),
            format!("must start with '/' (got '{}')", probe.path),
        ));
    }
    if !ports
        .iter()
        .any(|p| p.container_port == probe.port && p.protocol == Protocol::Tcp)
    {
        return Err(InvalidConfiguration::new(
            format!("{}.port", field),
            format!("port {} is not a declared TCP container port", probe.port),
        ));
    }
    if probe.initial_delay_seconds < 0 {
        return Err(InvalidConfiguration::new(
            format!("{}.initialDelaySeconds", field),
            format!("must be >= 0 (got {})", probe.initial_delay_seconds),
        ));
    }
    if probe.timeout_seconds < 1 {
        return Err(InvalidConfiguration::new(
            format!("{}.timeoutSeconds", field),
            format!("must be >= 1 (got {})", probe.timeout_seconds),
        ));
    }
    Ok(())
}

// --- Descriptors ---

fn metadata(config: &WorkloadConfig) -> ObjectMeta {
    ObjectMeta::new(&config.name, &config.namespace, &config.labels)
}

fn role_kind(scope: RbacScope) -> ResourceKind {
    match scope {
        RbacScope::Cluster => ResourceKind::ClusterRole,
        RbacScope::Namespace => ResourceKind::Role,
    }
}

fn role(config: &WorkloadConfig) -> ResourceDescriptor {
    let kind = role_kind(config.rbac_scope);
    let role = Role {
        api_version: kind.api_version().to_string(),
        metadata: metadata(config),
        rules: config.rules.clone(),
    };
    match config.rbac_scope {
        RbacScope::Cluster => ResourceDescriptor::ClusterRole(role),
        RbacScope::Namespace => ResourceDescriptor::Role(role),
    }
}

fn role_binding(config: &WorkloadConfig) -> ResourceDescriptor {
    let binding = RoleBinding {
        api_version: ResourceKind::RoleBinding.api_version().to_string(),
        metadata: metadata(config),
        role_ref: RoleRef {
            api_group: RBAC_API_GROUP.to_string(),
            kind: role_kind(config.rbac_scope).to_string(),
            name: config.name.clone(),
        },
        subjects: vec![Subject {
            kind: SubjectKind::ServiceAccount,
            name: config.name.clone(),
            namespace: Some(config.namespace.clone()),
        }],
    };
    match config.rbac_scope {
        RbacScope::Cluster => ResourceDescriptor::ClusterRoleBinding(binding),
        RbacScope::Namespace => ResourceDescriptor::RoleBinding(binding),
    }
}

fn service_account(config: &WorkloadConfig) -> ResourceDescriptor {
    ResourceDescriptor::ServiceAccount(ServiceAccount {
        api_version: ResourceKind::ServiceAccount.api_version().to_string(),
        metadata: metadata(config),
        automount_service_account_token: false,
    })
}

fn http_probe(probe: &ProbeSpec) -> Probe {
    Probe {
        http_get: HttpGetAction {
            path: probe.path.clone(),
            port: probe.port,
        },
        initial_delay_seconds: probe.initial_delay_seconds,
        timeout_seconds: probe.timeout_seconds,
    }
}

fn deployment(config: &WorkloadConfig) -> ResourceDescriptor {
    let container = Container {
        name: config.name.clone(),
        image: config.image.clone(),
        ports: config
            .ports
            .iter()
            .map(|p| ContainerPort {
                name: p.name.clone(),
                container_port: p.container_port,
                protocol: p.protocol,
            })
            .collect(),
        liveness_probe: config.liveness_probe.as_ref().map(http_probe),
        readiness_probe: config.readiness_probe.as_ref().map(http_probe),
        resources: config.resources.clone(),
        security_context: Some(SecurityContext::restricted(config.security.run_as_user)),
    };

    ResourceDescriptor::Deployment(Deployment {
        api_version: ResourceKind::Deployment.api_version().to_string(),
        metadata: metadata(config),
        spec: DeploymentSpec {
            replicas: config.replicas,
            selector: LabelSelector {
                match_labels: config.labels.clone(),
            },
            template: PodTemplateSpec {
                metadata: PodTemplateMeta {
                    labels: config.labels.clone(),
                },
                spec: PodSpec {
                    automount_service_account_token: true,
                    containers: vec![container],
                    service_account_name: config.name.clone(),
                    security_context: Some(PodSecurityContext {
                        fs_group: config.security.fs_group,
                        run_as_non_root: true,
                        run_as_user: config.security.run_as_user,
                    }),
                },
            },
        },
    })
}

fn service(config: &WorkloadConfig) -> ResourceDescriptor {
    ResourceDescriptor::Service(Service {
        api_version: ResourceKind::Service.api_version().to_string(),
        metadata: metadata(config),
        spec: ServiceSpec {
            ports: config
                .ports
                .iter()
                .map(|p| ServicePort {
                    name: p.name.clone(),
                    port: p.service_port(),
                    protocol: p.protocol,
                    target_port: p.container_port,
                })
                .collect(),
            selector: config.labels.clone(),
            service_type: config.service_type,
        },
    })
}
