//! Domain-driven configuration management for idstorm
//!
//! Configuration is split by functional domain (run, target, network,
//! logging, report), each with defaults and validation, loaded from YAML
//! with environment variable overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    logging::{LogFormat, LogLevel, LoggingConfig},
    network::NetworkConfig,
    report::{ReportConfig, ReportFormat},
    run::{RunConfig, MAX_CONCURRENCY_LIMIT},
    target::{LdapConfig, MemoryTargetConfig, ScimConfig, TargetConfig, TargetKind},
    HarnessConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
