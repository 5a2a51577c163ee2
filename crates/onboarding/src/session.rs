//! One setup session: the shared state plus its two async effects.
//!
//! The state lives behind a std mutex that is never held across an `.await`.
//! Discovery and submission each have an in-flight flag, raised and checked in
//! the same critical section, and cleared by a guard even if the caller drops
//! the future.

use std::sync::{Arc, Mutex, MutexGuard};

use {
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info, warn},
};

use {
    clawsetup_config::{SetupConfig, WizardConfig},
    clawsetup_provider_setup::{
        DiscoveryOutcome, Endpoint, HttpModelDiscovery, ModelDiscovery, catalog,
    },
};

use crate::{
    error::{Error, Result},
    state::{Action, ConfigurationState},
    submit::{
        ConfigStore, HttpConfigStore, SaveResponse, SubmitRejection, plan_submission,
    },
    token::TokenGenerator,
};

/// Why discovery was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryRejection {
    #[error("请先填写 API Key")]
    MissingApiKey,
    #[error("正在获取模型，请稍候")]
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryReport {
    Rejected(DiscoveryRejection),
    /// The outcome was written into the state.
    Applied(DiscoveryOutcome),
    /// Provider or key changed while the call was pending; the outcome was
    /// dropped.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    Rejected(SubmitRejection),
    /// A status was recorded, successful or not.
    Completed(SaveResponse),
}

#[derive(Clone, Copy, Debug)]
enum Flight {
    Discovery,
    Submission,
}

struct Inner {
    state: ConfigurationState,
    discovering: bool,
    saving: bool,
}

impl Inner {
    fn apply(&mut self, action: Action) {
        self.state.apply(action);
    }

    fn set_flight(&mut self, flight: Flight, on: bool) {
        match flight {
            Flight::Discovery => self.discovering = on,
            Flight::Submission => self.saving = on,
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Clears an in-flight flag when dropped, unless [`FlightGuard::land`] did.
struct FlightGuard<'a> {
    inner: &'a Mutex<Inner>,
    flight: Flight,
    armed: bool,
}

impl<'a> FlightGuard<'a> {
    fn new(inner: &'a Mutex<Inner>, flight: Flight) -> Self {
        Self {
            inner,
            flight,
            armed: true,
        }
    }

    /// Clear the flag under a lock the caller already holds.
    fn land(mut self, inner: &mut Inner) {
        inner.set_flight(self.flight, false);
        self.armed = false;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(flight = ?self.flight, "in-flight call abandoned");
            lock(self.inner).set_flight(self.flight, false);
        }
    }
}

/// What a discovery call was issued for.
struct DiscoveryTicket {
    provider_id: String,
    api_key: Secret<String>,
    generation: u64,
}

impl DiscoveryTicket {
    fn still_current(&self, state: &ConfigurationState) -> bool {
        state.provider_generation() == self.generation
            && state.provider_id() == self.provider_id
            && state.api_key().expose_secret().trim() == self.api_key.expose_secret()
    }
}

pub struct SetupSession {
    inner: Mutex<Inner>,
    discovery: Arc<dyn ModelDiscovery>,
    store: Arc<dyn ConfigStore>,
    tokens: TokenGenerator,
}

impl SetupSession {
    pub fn new(
        discovery: Arc<dyn ModelDiscovery>,
        store: Arc<dyn ConfigStore>,
        tokens: TokenGenerator,
        wizard: &WizardConfig,
    ) -> Result<Self> {
        let provider = wizard.provider.trim();
        if catalog::lookup(provider).is_none() {
            return Err(Error::UnknownProvider {
                id: provider.to_string(),
            });
        }
        let state = ConfigurationState::new(
            provider,
            wizard.custom_env_key.as_deref().unwrap_or_default(),
            tokens.generate(),
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                state,
                discovering: false,
                saving: false,
            }),
            discovery,
            store,
            tokens,
        })
    }

    /// Session talking to the configured HTTP collaborator.
    pub fn from_config(config: &SetupConfig) -> Result<Self> {
        let endpoint = Endpoint::from_config(&config.endpoint)?;
        info!(base_url = %endpoint.base_url(), "setup session using config API");
        Self::new(
            Arc::new(HttpModelDiscovery::new(endpoint.clone())),
            Arc::new(HttpConfigStore::new(endpoint)),
            TokenGenerator::default(),
            &config.wizard,
        )
    }

    pub fn snapshot(&self) -> ConfigurationState {
        lock(&self.inner).state.clone()
    }

    pub fn is_discovering(&self) -> bool {
        lock(&self.inner).discovering
    }

    pub fn is_saving(&self) -> bool {
        lock(&self.inner).saving
    }

    fn dispatch(&self, action: Action) {
        lock(&self.inner).apply(action);
    }

    pub fn select_provider(&self, id: &str) -> Result<()> {
        let id = id.trim();
        if catalog::lookup(id).is_none() {
            return Err(Error::UnknownProvider { id: id.to_string() });
        }
        debug!(provider = id, "provider selected");
        self.dispatch(Action::SelectProvider { id: id.to_string() });
        Ok(())
    }

    pub fn set_custom_env_key(&self, value: impl Into<String>) {
        self.dispatch(Action::SetCustomEnvKey {
            value: value.into(),
        });
    }

    pub fn edit_api_key(&self, value: impl Into<String>) {
        self.dispatch(Action::EditApiKey {
            value: Secret::new(value.into()),
        });
    }

    pub fn edit_model(&self, value: impl Into<String>) {
        self.dispatch(Action::EditModel {
            value: value.into(),
        });
    }

    pub fn edit_token(&self, value: impl Into<String>) {
        self.dispatch(Action::EditToken {
            value: value.into(),
        });
    }

    /// Replace the gateway token with a fresh one and return it.
    pub fn regenerate_token(&self) -> String {
        let token = self.tokens.generate();
        self.dispatch(Action::ReplaceToken {
            token: token.clone(),
        });
        token
    }

    /// Ask the collaborator which models the current credential can use.
    pub async fn discover_models(&self) -> DiscoveryReport {
        let ticket = {
            let mut inner = lock(&self.inner);
            if inner.discovering {
                return DiscoveryReport::Rejected(DiscoveryRejection::InFlight);
            }
            let api_key = inner.state.api_key().expose_secret().trim().to_string();
            if api_key.is_empty() {
                inner.apply(Action::Notice {
                    message: DiscoveryRejection::MissingApiKey.to_string(),
                });
                return DiscoveryReport::Rejected(DiscoveryRejection::MissingApiKey);
            }
            inner.discovering = true;
            inner.apply(Action::DiscoveryStarted);
            DiscoveryTicket {
                provider_id: inner.state.provider_id().to_string(),
                api_key: Secret::new(api_key),
                generation: inner.state.provider_generation(),
            }
        };
        let guard = FlightGuard::new(&self.inner, Flight::Discovery);

        let outcome = self
            .discovery
            .discover(&ticket.provider_id, ticket.api_key.expose_secret())
            .await;

        let mut inner = lock(&self.inner);
        guard.land(&mut inner);
        if !ticket.still_current(&inner.state) {
            info!(
                provider = %ticket.provider_id,
                "discarding model list for a superseded selection"
            );
            return DiscoveryReport::Discarded;
        }
        inner.apply(Action::DiscoveryFinished {
            outcome: outcome.clone(),
        });
        DiscoveryReport::Applied(outcome)
    }

    /// Send the configuration. A token is generated first if the field is
    /// empty, and the new token is written back into the state.
    pub async fn submit(&self) -> SubmitReport {
        let request = {
            let mut inner = lock(&self.inner);
            if inner.saving {
                return SubmitReport::Rejected(SubmitRejection::InFlight);
            }
            let plan = match plan_submission(&inner.state, &self.tokens) {
                Ok(plan) => plan,
                Err(rejection) => return SubmitReport::Rejected(rejection),
            };
            inner.saving = true;
            inner.apply(Action::SubmitStarted);
            if let Some(token) = plan.generated_token {
                inner.apply(Action::ReplaceToken { token });
            }
            plan.request
        };
        let guard = FlightGuard::new(&self.inner, Flight::Submission);

        info!(
            model = %request.model,
            credentials = request.providers.len(),
            "saving configuration"
        );
        let response = match self.store.save(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "config save failed");
                SaveResponse::transport_failure(e.to_string())
            },
        };
        if response.ok {
            info!(restarted = response.restarted, "configuration saved");
        } else {
            warn!(message = %response.message, "configuration not saved");
        }

        let mut inner = lock(&self.inner);
        guard.land(&mut inner);
        inner.apply(Action::SubmitFinished {
            response: response.clone(),
        });
        SubmitReport::Completed(response)
    }
}
