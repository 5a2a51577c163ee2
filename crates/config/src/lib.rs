//! Settings loading, env substitution, and validation for the setup wizard.
//!
//! Settings files: `clawsetup.toml`, `clawsetup.yaml`, or `clawsetup.json`
//! Searched in `./` then `~/.config/clawsetup/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{EndpointConfig, SetupConfig, WizardConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
