//! Filesystem path constants.

/// Default config file path for `ksmctl`.
pub const DEFAULT_CONFIG: &str = "/etc/ksm/config.yaml";

/// Extension used for each rendered manifest file.
pub const MANIFEST_EXTENSION: &str = "yaml";
