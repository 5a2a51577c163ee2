//! Provider catalog and model discovery for the setup wizard.
//!
//! The catalog is a fixed table; discovery goes through the config API
//! collaborator, which talks to the upstream provider on our behalf.

pub mod catalog;
pub mod discovery;
pub mod endpoint;
pub mod error;

pub use {
    catalog::{
        CUSTOM_PROVIDER_ID, DEFAULT_PROVIDER_ID, ProviderGroup, ProviderOption, by_group,
        known_providers, lookup,
    },
    discovery::{DiscoveryOutcome, HttpModelDiscovery, ModelDiscovery},
    endpoint::{CONFIG_API_PATH, Endpoint, MODELS_API_PATH, Reply},
    error::{Error, Result},
};
