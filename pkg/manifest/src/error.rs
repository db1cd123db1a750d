use thiserror::Error;

/// The only way `build` fails: one field of the configuration is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {field}: {reason}")]
pub struct InvalidConfiguration {
    /// Dotted path of the offending field, e.g. `ports[1].name`
    pub field: String,
    pub reason: String,
}

impl InvalidConfiguration {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Attach a field path to a field-level check.
pub(crate) trait FieldContext<T> {
    fn field(self, field: impl Into<String>) -> Result<T, InvalidConfiguration>;
}

impl<T> FieldContext<T> for anyhow::Result<T> {
    fn field(self, field: impl Into<String>) -> Result<T, InvalidConfiguration> {
        self.map_err(|e| InvalidConfiguration::new(field, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_field() {
        let err = InvalidConfiguration::new("replicas", "must be >= 0 (got -1)");
        assert_eq!(
            err.to_string(),
            "invalid configuration: replicas: must be >= 0 (got -1)"
        );
    }

    #[test]
    fn field_context_wraps_anyhow_errors() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("name must not be empty"));
        let err = result.field("name").unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.reason, "name must not be empty");
    }
}
