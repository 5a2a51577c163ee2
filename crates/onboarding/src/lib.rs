//! Guided setup of the OpenClaw gateway's model provider.
//!
//! Flow: provider → credential → model (optionally discovered) → gateway
//! token → save through the config API.

pub mod error;
pub mod flow;
pub mod session;
pub mod state;
pub mod submit;
pub mod token;
pub mod wizard;

pub use {
    error::{Error, Result},
    flow::{FlowCommand, WizardFlow, WizardStep},
    session::{DiscoveryRejection, DiscoveryReport, SetupSession, SubmitReport},
    state::{Action, ConfigurationState, reduce},
    submit::{
        ConfigStore, HttpConfigStore, ProviderCredential, SaveRequest, SaveResponse,
        SubmitRejection, plan_submission,
    },
    token::{TokenGenerator, is_well_formed},
    wizard::{WizardOutcome, print_status, run_wizard},
};
