//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a URL and, when given, its scheme
pub fn validate_url(
    url: &str,
    allowed_schemes: &[&str],
    field_name: &str,
    domain: &str,
) -> ConfigResult<url::Url> {
    validate_required_string(url, field_name, domain)?;

    let parsed = url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    if !allowed_schemes.is_empty() && !allowed_schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} scheme '{}' not supported (expected one of: {})",
                field_name,
                parsed.scheme(),
                allowed_schemes.join(", ")
            ),
        });
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must have a host", field_name),
        });
    }

    Ok(parsed)
}

/// Validate a value inside a half-open range `[min, max)`
pub fn validate_range(value: f64, min: f64, max: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !(min..max).contains(&value) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} must be in [{}, {}), got {}",
                field_name, min, max, value
            ),
        });
    }
    Ok(())
}
