//! Pure state machine for one setup session. No I/O.
//!
//! Every change goes through [`reduce`], so cross-field rules (provider switch
//! resets the credential variable, the discovered models, and the discovery
//! message together) can never be observed half-applied.

use secrecy::{ExposeSecret, Secret};

use clawsetup_provider_setup::{
    DiscoveryOutcome, ProviderOption,
    catalog::{self, is_custom},
};

use crate::submit::SaveResponse;

/// The operator's in-progress choices.
#[derive(Clone)]
pub struct ConfigurationState {
    provider_id: String,
    provider_env_key: String,
    custom_env_key: String,
    api_key: Secret<String>,
    model: String,
    models: Vec<String>,
    gateway_token: String,
    models_message: Option<String>,
    status: Option<SaveResponse>,
    /// Bumped on every provider selection; tags discovery calls.
    provider_generation: u64,
}

/// Operator actions and async completions.
#[derive(Debug, Clone)]
pub enum Action {
    SelectProvider { id: String },
    SetCustomEnvKey { value: String },
    EditApiKey { value: Secret<String> },
    EditModel { value: String },
    EditToken { value: String },
    /// Replace the token with a freshly generated one.
    ReplaceToken { token: String },
    /// Local validation message shown in the discovery hint line.
    Notice { message: String },
    DiscoveryStarted,
    DiscoveryFinished { outcome: DiscoveryOutcome },
    SubmitStarted,
    SubmitFinished { response: SaveResponse },
}

impl ConfigurationState {
    /// Start a session on `provider_id`. Unknown ids leave the provider
    /// unselected; callers check the catalog first.
    pub fn new(provider_id: &str, custom_env_key: &str, gateway_token: String) -> Self {
        let blank = Self {
            provider_id: String::new(),
            provider_env_key: String::new(),
            custom_env_key: custom_env_key.to_string(),
            api_key: Secret::new(String::new()),
            model: String::new(),
            models: Vec::new(),
            gateway_token,
            models_message: None,
            status: None,
            provider_generation: 0,
        };
        reduce(&blank, Action::SelectProvider {
            id: provider_id.to_string(),
        })
    }

    /// Apply `action` in place.
    pub fn apply(&mut self, action: Action) {
        *self = reduce(self, action);
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn selected_provider(&self) -> Option<&'static ProviderOption> {
        catalog::lookup(&self.provider_id)
    }

    pub fn is_custom_selected(&self) -> bool {
        is_custom(&self.provider_id)
    }

    pub fn provider_env_key(&self) -> &str {
        &self.provider_env_key
    }

    pub fn custom_env_key(&self) -> &str {
        &self.custom_env_key
    }

    pub fn api_key(&self) -> &Secret<String> {
        &self.api_key
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn gateway_token(&self) -> &str {
        &self.gateway_token
    }

    pub fn models_message(&self) -> Option<&str> {
        self.models_message.as_deref()
    }

    pub fn status(&self) -> Option<&SaveResponse> {
        self.status.as_ref()
    }

    pub fn provider_generation(&self) -> u64 {
        self.provider_generation
    }

    /// Submission is possible once a model is named.
    pub fn can_save(&self) -> bool {
        !self.model.trim().is_empty()
    }

    /// Placeholder for the API key input, e.g. `OPENAI_API_KEY...`.
    pub fn api_key_hint(&self) -> String {
        if self.provider_env_key.is_empty() {
            "API Key".to_string()
        } else {
            format!("{}...", self.provider_env_key)
        }
    }
}

impl std::fmt::Debug for ConfigurationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationState")
            .field("provider_id", &self.provider_id)
            .field("provider_env_key", &self.provider_env_key)
            .field("custom_env_key", &self.custom_env_key)
            .field(
                "api_key",
                &(!self.api_key.expose_secret().is_empty()).then_some("[REDACTED]"),
            )
            .field("model", &self.model)
            .field("models", &self.models)
            .field("gateway_token", &"[REDACTED]")
            .field("models_message", &self.models_message)
            .field("status", &self.status)
            .field("provider_generation", &self.provider_generation)
            .finish()
    }
}

/// The transition function: current state + action → next state.
pub fn reduce(state: &ConfigurationState, action: Action) -> ConfigurationState {
    let mut next = state.clone();
    match action {
        Action::SelectProvider { id } => {
            let Some(option) = catalog::lookup(&id) else {
                return next;
            };
            next.provider_env_key = if option.is_custom() {
                next.custom_env_key.clone()
            } else {
                option.env_key.unwrap_or_default().to_string()
            };
            if let Some(model) = option.default_model {
                next.model = model.to_string();
            }
            next.models.clear();
            next.models_message = None;
            next.provider_id = option.id.to_string();
            next.provider_generation += 1;
        },
        Action::SetCustomEnvKey { value } => {
            if is_custom(&next.provider_id) {
                next.provider_env_key = value.clone();
            }
            next.custom_env_key = value;
        },
        Action::EditApiKey { value } => next.api_key = value,
        Action::EditModel { value } => next.model = value,
        Action::EditToken { value } | Action::ReplaceToken { token: value } => {
            next.gateway_token = value;
        },
        Action::Notice { message } => next.models_message = Some(message),
        Action::DiscoveryStarted => next.models_message = None,
        Action::DiscoveryFinished { outcome } => match outcome {
            DiscoveryOutcome::Listed { models, message } => {
                next.models = models;
                next.models_message = message;
            },
            DiscoveryOutcome::Failed { message } => {
                next.models.clear();
                next.models_message = Some(message);
            },
            // No reply: keep whatever list the operator already has.
            DiscoveryOutcome::Unreachable { message, .. } => {
                next.models_message = Some(message);
            },
        },
        Action::SubmitStarted => next.status = None,
        Action::SubmitFinished { response } => next.status = Some(response),
    }
    next
}
