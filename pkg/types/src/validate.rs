use anyhow::{Result, bail};

/// Validate a Kubernetes-style resource name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a name that is also used for a Service, which must additionally
/// start with a letter.
pub fn validate_service_name(name: &str) -> Result<()> {
    validate_name(name)?;
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        bail!("name '{}' must start with a lowercase letter", name);
    }
    Ok(())
}

/// Validate an image registry host: a DNS hostname with an optional port.
fn validate_registry(registry: &str) -> Result<()> {
    let (host, port) = match registry.split_once(':') {
        Some((h, p)) => (h, Some(p)),
        None => (registry, None),
    };
    if host.is_empty() || host.len() > 253 {
        bail!("registry host '{}' has an invalid length", registry);
    }
    for part in host.split('.') {
        let bytes = part.as_bytes();
        let ok = !bytes.is_empty()
            && bytes.len() <= 63
            && bytes[0].is_ascii_alphanumeric()
            && bytes[bytes.len() - 1].is_ascii_alphanumeric()
            && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-');
        if !ok {
            bail!("registry host '{}' is not a valid DNS hostname", registry);
        }
    }
    if let Some(port) = port {
        match port.parse::<u16>() {
            Ok(p) if p > 0 && port.chars().all(|c| c.is_ascii_digit()) => {}
            _ => bail!("registry '{}' has an invalid port '{}'", registry, port),
        }
    }
    Ok(())
}

/// Validate a named port (IANA service name syntax).
/// Rules: max 15 chars, `[a-z0-9-]`, at least one letter, no leading,
/// trailing or consecutive hyphens.
pub fn validate_port_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("port name must not be empty");
    }
    if name.len() > 15 {
        bail!("port name '{}' exceeds 15 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        bail!(
            "port name '{}' must not start or end with a hyphen or contain '--'",
            name
        );
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "port name '{}' must contain only lowercase letters, digits, and hyphens",
            name
        );
    }
    if !name.chars().any(|c| c.is_ascii_lowercase()) {
        bail!("port name '{}' must contain at least one letter", name);
    }
    Ok(())
}

fn is_label_segment(value: &str) -> bool {
    let bytes = value.as_bytes();
    match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            first.is_ascii_alphanumeric()
                && last.is_ascii_alphanumeric()
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        }
        _ => false,
    }
}

/// Validate a label key: `[prefix/]name`, where the prefix is a DNS
/// subdomain and the name is at most 63 alphanumeric, `-`, `_` or `.` chars.
pub fn validate_label_key(key: &str) -> Result<()> {
    let (prefix, name) = match key.rsplit_once('/') {
        Some((p, n)) => (Some(p), n),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if prefix.is_empty() || prefix.len() > 253 {
            bail!("label key '{}' has an invalid prefix length", key);
        }
        for part in prefix.split('.') {
            if validate_name(part).is_err() {
                bail!("label key '{}' prefix must be a DNS subdomain", key);
            }
        }
    }
    if name.len() > 63 {
        bail!("label key '{}' name part exceeds 63 characters", key);
    }
    if !is_label_segment(name) {
        bail!(
            "label key '{}' must be alphanumeric, '-', '_' or '.', starting and ending alphanumeric",
            key
        );
    }
    Ok(())
}

/// Validate a label value. Empty values are allowed.
pub fn validate_label_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    if value.len() > 63 {
        bail!("label value '{}' exceeds 63 characters", value);
    }
    if !is_label_segment(value) {
        bail!(
            "label value '{}' must be alphanumeric, '-', '_' or '.', starting and ending alphanumeric",
            value
        );
    }
    Ok(())
}

/// Validate a container image reference:
/// `[registry[:port]/]repository[:tag][@sha256:<hex>]`.
pub fn validate_image(image: &str) -> Result<()> {
    if image.is_empty() {
        bail!("image must not be empty");
    }
    if image.chars().any(char::is_whitespace) {
        bail!("image '{}' must not contain whitespace", image);
    }
    if image.contains("://") {
        bail!("image '{}' must not include a URL scheme", image);
    }

    let (name, digest) = match image.split_once('@') {
        Some((n, d)) => (n, Some(d)),
        None => (image, None),
    };
    if let Some(digest) = digest {
        let Some(hex) = digest.strip_prefix("sha256:") else {
            bail!("image '{}' digest must use sha256", image);
        };
        if hex.len() != 64 || !hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
            bail!("image '{}' digest must be 64 lowercase hex characters", image);
        }
    }

    // A ':' after the last '/' separates the tag; earlier ones belong to a
    // registry port.
    let last_slash = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (repository, tag) = match name[last_slash..].rfind(':') {
        Some(i) => (&name[..last_slash + i], Some(&name[last_slash + i + 1..])),
        None => (name, None),
    };

    if let Some(tag) = tag {
        if tag.is_empty() || tag.len() > 128 {
            bail!("image '{}' tag must be 1-128 characters", image);
        }
        if tag.starts_with(['.', '-'])
            || !tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            bail!("image '{}' has an invalid tag '{}'", image, tag);
        }
    }

    let mut components = repository.split('/').peekable();
    let mut first = true;
    while let Some(component) = components.next() {
        let is_registry = first
            && components.peek().is_some()
            && (component.contains('.') || component.contains(':') || component == "localhost");
        first = false;
        if is_registry {
            if let Err(e) = validate_registry(component) {
                bail!("image '{}': {}", image, e);
            }
            continue;
        }
        if component.is_empty() {
            bail!("image '{}' has an empty path component", image);
        }
        let bytes = component.as_bytes();
        let edges_ok =
            bytes[0].is_ascii_alphanumeric() && bytes[bytes.len() - 1].is_ascii_alphanumeric();
        let chars_ok = component
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
        if !edges_ok || !chars_ok {
            bail!(
                "image '{}' path component '{}' must be lowercase alphanumeric with '.', '_' or '-' separators",
                image,
                component
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(validate_name("kube-state-metrics").is_ok());
        assert!(validate_name("kube-system").is_ok());
        assert!(validate_name("app-123").is_ok());
        assert!(validate_name("a").is_ok());
        assert!(validate_name("a-b-c-d").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("My-App").is_err());
        assert!(validate_name("my_app").is_err());
        assert!(validate_name("-leading").is_err());
        assert!(validate_name("trailing-").is_err());
        assert!(validate_name("special!char").is_err());
        assert!(validate_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn service_names() {
        assert!(validate_service_name("kube-state-metrics").is_ok());
        assert!(validate_service_name("ksm2").is_ok());
        assert!(validate_service_name("1ksm").is_err());
        assert!(validate_service_name("").is_err());
    }

    #[test]
    fn port_names() {
        assert!(validate_port_name("http-metrics").is_ok());
        assert!(validate_port_name("telemetry").is_ok());
        assert!(validate_port_name("h2c").is_ok());
        assert!(validate_port_name("").is_err());
        assert!(validate_port_name("8080").is_err());
        assert!(validate_port_name("http--metrics").is_err());
        assert!(validate_port_name("metrics-endpoint-x").is_err());
        assert!(validate_port_name("Metrics").is_err());
    }

    #[test]
    fn label_keys_and_values() {
        assert!(validate_label_key("app").is_ok());
        assert!(validate_label_key("app.kubernetes.io/name").is_ok());
        assert!(validate_label_key("").is_err());
        assert!(validate_label_key("/name").is_err());
        assert!(validate_label_key("Bad_Prefix/name").is_err());
        assert!(validate_label_key("-app").is_err());

        assert!(validate_label_value("").is_ok());
        assert!(validate_label_value("kube-state-metrics").is_ok());
        assert!(validate_label_value("v2.5.0").is_ok());
        assert!(validate_label_value("has space").is_err());
        assert!(validate_label_value("trailing-").is_err());
        assert!(validate_label_value(&"x".repeat(64)).is_err());
    }

    #[test]
    fn valid_images() {
        assert!(
            validate_image("registry.k8s.io/kube-state-metrics/kube-state-metrics:v2.5.0").is_ok()
        );
        assert!(validate_image("nginx").is_ok());
        assert!(validate_image("nginx:1.25-alpine").is_ok());
        assert!(validate_image("localhost:5000/ksm:dev").is_ok());
        assert!(validate_image("my-registry.example.com:443/team/ksm:v1").is_ok());
        assert!(validate_image(&format!("quay.io/org/ksm@sha256:{}", "a".repeat(64))).is_ok());
    }

    #[test]
    fn invalid_images() {
        assert!(validate_image("").is_err());
        assert!(validate_image("nginx latest").is_err());
        assert!(validate_image("https://registry.k8s.io/ksm").is_err());
        assert!(validate_image("Registry.k8s.io/KSM:v1").is_err());
        assert!(validate_image("nginx:").is_err());
        assert!(validate_image("nginx:-bad").is_err());
        assert!(validate_image("org//ksm").is_err());
        assert!(validate_image("ksm@sha256:abc").is_err());
        assert!(validate_image("ksm@md5:abc").is_err());
        assert!(validate_image("bad_host!:port/ksm:v1").is_err());
        assert!(validate_image("bad_host.io/ksm:v1").is_err());
        assert!(validate_image("registry.io:port/ksm").is_err());
        assert!(validate_image("registry.io:0/ksm").is_err());
        assert!(validate_image("registry.io:70000/ksm").is_err());
        assert!(validate_image("-registry.io/ksm").is_err());
        assert!(validate_image("registry..io/ksm").is_err());
    }
}
