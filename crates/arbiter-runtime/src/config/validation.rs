//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{ArbiterConfig, LogOutput, LoggingConfig, PipelineConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ArbiterConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_pipeline_config(&config.pipeline)?;
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.output = \"file\" requires logging.file_path",
        ));
    }

    if let Some(target) = logging.filters.keys().find(|t| t.trim().is_empty()) {
        return Err(ConfigError::invalid(
            "logging.filters",
            format!("empty filter target {target:?}"),
        ));
    }

    Ok(())
}

/// Validates pipeline settings.
fn validate_pipeline_config(pipeline: &PipelineConfig) -> ConfigResult<()> {
    require_positive("pipeline.line_width", pipeline.line_width as u64)?;
    require_positive("pipeline.max_candidate_len", pipeline.max_candidate_len as u64)?;
    require_positive("pipeline.dedup_window_secs", pipeline.dedup_window_secs)?;
    require_positive("pipeline.preview_len", pipeline.preview_len as u64)?;
    require_positive("pipeline.sweep_interval_secs", pipeline.sweep_interval_secs)?;

    if pipeline.continuation.chars().count() >= pipeline.line_width {
        return Err(ConfigError::invalid(
            "pipeline.continuation",
            "marker must be shorter than the line width",
        ));
    }

    if pipeline.preview_len >= pipeline.line_width {
        return Err(ConfigError::invalid(
            "pipeline.preview_len",
            "preview must be shorter than the line width",
        ));
    }

    if pipeline.literal_keyword.contains(char::is_whitespace) {
        return Err(ConfigError::invalid(
            "pipeline.literal_keyword",
            "keyword cannot contain whitespace",
        ));
    }

    if pipeline.exempt_phrases.iter().any(|p| p.trim().is_empty()) {
        return Err(ConfigError::invalid(
            "pipeline.exempt_phrases",
            "phrases cannot be empty",
        ));
    }

    Ok(())
}

fn require_positive(field: &str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn with_pipeline(f: impl FnOnce(&mut PipelineConfig)) -> ArbiterConfig {
        let mut config = ArbiterConfig::default();
        f(&mut config.pipeline);
        config
    }

    fn rejected_field(config: &ArbiterConfig) -> Option<String> {
        validate_config(config)
            .err()
            .and_then(|e| e.field().map(str::to_string))
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ArbiterConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = with_pipeline(|p| p.line_width = 0);
        assert_eq!(rejected_field(&config).as_deref(), Some("pipeline.line_width"));

        let config = with_pipeline(|p| p.dedup_window_secs = 0);
        assert_eq!(
            rejected_field(&config).as_deref(),
            Some("pipeline.dedup_window_secs")
        );

        let config = with_pipeline(|p| p.sweep_interval_secs = 0);
        assert_eq!(
            rejected_field(&config).as_deref(),
            Some("pipeline.sweep_interval_secs")
        );
    }

    #[test]
    fn test_width_relations() {
        let config = with_pipeline(|p| {
            p.line_width = 20;
            p.preview_len = 23;
        });
        assert_eq!(rejected_field(&config).as_deref(), Some("pipeline.preview_len"));

        let config = with_pipeline(|p| {
            p.line_width = 3;
            p.preview_len = 1;
        });
        assert_eq!(rejected_field(&config).as_deref(), Some("pipeline.continuation"));
    }

    #[test]
    fn test_keyword_and_phrases() {
        let config = with_pipeline(|p| p.literal_keyword = "card name".to_string());
        assert_eq!(
            rejected_field(&config).as_deref(),
            Some("pipeline.literal_keyword")
        );

        let config = with_pipeline(|p| p.literal_keyword.clear());
        assert!(validate_config(&config).is_ok());

        let config = with_pipeline(|p| p.exempt_phrases.push("  ".to_string()));
        assert_eq!(
            rejected_field(&config).as_deref(),
            Some("pipeline.exempt_phrases")
        );
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = ArbiterConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.logging.file_path = Some("arbiter.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_filter_target_rejected() {
        let mut config = ArbiterConfig::default();
        config.logging.filters.insert(" ".to_string(), LogLevel::Debug);
        assert_eq!(rejected_field(&config).as_deref(), Some("logging.filters"));
    }
}
