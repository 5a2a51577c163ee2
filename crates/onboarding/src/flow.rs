//! Step machine for the terminal wizard. No I/O.
//!
//! Flow: provider → custom env key (custom only) → API key → model → token →
//! confirm → done. Each input yields a [`FlowCommand`] for the driver to run
//! against the session. `back` steps one step backwards from anywhere, so
//! every field stays editable after a failed save.

use clawsetup_provider_setup::{ProviderGroup, ProviderOption, by_group, catalog};

use crate::{state::ConfigurationState, submit::SubmitRejection};

/// Steps in the setup wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Provider,
    CustomEnvKey,
    ApiKey,
    Model,
    Token,
    Confirm,
    Done,
}

/// What the driver should do with the last input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowCommand {
    /// Keep the current value.
    Keep,
    SelectProvider(String),
    SetCustomEnvKey(String),
    SetApiKey(String),
    Discover,
    SetModel(String),
    RegenerateToken,
    SetToken(String),
    Submit,
    Cancel,
    /// Input not understood; show the message and stay on the step.
    Invalid(String),
}

/// Providers in menu order, grouped as displayed.
pub fn menu_providers() -> Vec<&'static ProviderOption> {
    ProviderGroup::ALL
        .iter()
        .flat_map(|group| by_group(*group))
        .collect()
}

/// Numbered provider menu, one group heading per section.
pub fn provider_menu() -> String {
    let mut out = String::new();
    let mut index = 1;
    for group in ProviderGroup::ALL {
        out.push_str(&format!("{}:\n", group.label()));
        for option in by_group(group) {
            out.push_str(&format!("  {index:>2}. {} ({})\n", option.label, option.id));
            index += 1;
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct WizardFlow {
    step: WizardStep,
}

impl Default for WizardFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardFlow {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Provider,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_done(&self) -> bool {
        self.step == WizardStep::Done
    }

    /// Back to the confirm step after a save that did not succeed.
    pub fn retry(&mut self) {
        self.step = WizardStep::Confirm;
    }

    pub fn finish(&mut self) {
        self.step = WizardStep::Done;
    }

    /// The step `back` returns to.
    fn previous(&self, state: &ConfigurationState) -> WizardStep {
        match self.step {
            WizardStep::Provider | WizardStep::CustomEnvKey => WizardStep::Provider,
            WizardStep::ApiKey if state.is_custom_selected() => WizardStep::CustomEnvKey,
            WizardStep::ApiKey => WizardStep::Provider,
            WizardStep::Model => WizardStep::ApiKey,
            WizardStep::Token => WizardStep::Model,
            WizardStep::Confirm => WizardStep::Token,
            WizardStep::Done => WizardStep::Done,
        }
    }

    /// The prompt text for the current step.
    pub fn prompt(&self, state: &ConfigurationState) -> String {
        match self.step {
            WizardStep::Provider => format!(
                "{}选择提供商（序号或 id，回车保留 {}）：",
                provider_menu(),
                state.provider_id()
            ),
            WizardStep::CustomEnvKey => {
                let current = state.custom_env_key();
                if current.is_empty() {
                    "API Key 环境变量名（如 FOO_API_KEY）：".to_string()
                } else {
                    format!("API Key 环境变量名（回车保留 {current}）：")
                }
            },
            WizardStep::ApiKey => format!("{}（回车保留当前值）：", state.api_key_hint()),
            WizardStep::Model => {
                let mut out = String::new();
                for (i, model) in state.models().iter().enumerate() {
                    out.push_str(&format!("  {:>2}. {model}\n", i + 1));
                }
                if let Some(message) = state.models_message() {
                    out.push_str(message);
                    out.push('\n');
                }
                let auto = state
                    .selected_provider()
                    .is_some_and(|p| p.supports_auto_models);
                let discover_hint = if auto { "，? 获取模型列表" } else { "" };
                out.push_str(&format!(
                    "默认模型（当前 {}{discover_hint}）：",
                    display_or_dash(state.model())
                ));
                out
            },
            WizardStep::Token => format!(
                "Gateway Token（当前 {}，r 重新生成，回车保留）：",
                display_or_dash(state.gateway_token())
            ),
            WizardStep::Confirm => format!(
                "提供商 {} / 模型 {}\n回车保存，back 返回上一步，q 退出：",
                state.provider_id(),
                display_or_dash(state.model())
            ),
            WizardStep::Done => "配置完成。".to_string(),
        }
    }

    /// Process one line of input against the current state.
    pub fn advance(&mut self, input: &str, state: &ConfigurationState) -> FlowCommand {
        let input = input.trim();
        if input.eq_ignore_ascii_case("back") {
            self.step = self.previous(state);
            return FlowCommand::Keep;
        }
        match self.step {
            WizardStep::Provider => {
                let option = if input.is_empty() {
                    state.selected_provider()
                } else {
                    resolve_provider(input)
                };
                let Some(option) = option else {
                    return FlowCommand::Invalid(format!("未知的提供商：{input}"));
                };
                self.step = if option.is_custom() {
                    WizardStep::CustomEnvKey
                } else {
                    WizardStep::ApiKey
                };
                if input.is_empty() {
                    FlowCommand::Keep
                } else {
                    FlowCommand::SelectProvider(option.id.to_string())
                }
            },
            WizardStep::CustomEnvKey => {
                self.step = WizardStep::ApiKey;
                if input.is_empty() {
                    FlowCommand::Keep
                } else {
                    FlowCommand::SetCustomEnvKey(input.to_string())
                }
            },
            WizardStep::ApiKey => {
                self.step = WizardStep::Model;
                if input.is_empty() {
                    FlowCommand::Keep
                } else {
                    FlowCommand::SetApiKey(input.to_string())
                }
            },
            WizardStep::Model => {
                if input == "?" {
                    return FlowCommand::Discover;
                }
                if input.is_empty() {
                    if state.model().trim().is_empty() {
                        return FlowCommand::Invalid(SubmitRejection::EmptyModel.to_string());
                    }
                    self.step = WizardStep::Token;
                    return FlowCommand::Keep;
                }
                let picked = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| state.models().get(i));
                self.step = WizardStep::Token;
                FlowCommand::SetModel(picked.map_or_else(|| input.to_string(), Clone::clone))
            },
            WizardStep::Token => {
                if input.eq_ignore_ascii_case("r") {
                    return FlowCommand::RegenerateToken;
                }
                self.step = WizardStep::Confirm;
                if input.is_empty() {
                    FlowCommand::Keep
                } else {
                    FlowCommand::SetToken(input.to_string())
                }
            },
            WizardStep::Confirm => {
                if input.eq_ignore_ascii_case("q") {
                    self.step = WizardStep::Done;
                    FlowCommand::Cancel
                } else {
                    FlowCommand::Submit
                }
            },
            WizardStep::Done => FlowCommand::Keep,
        }
    }
}

fn resolve_provider(input: &str) -> Option<&'static ProviderOption> {
    match input.parse::<usize>() {
        Ok(n) => n
            .checked_sub(1)
            .and_then(|i| menu_providers().get(i).copied()),
        Err(_) => catalog::lookup(&input.to_ascii_lowercase()),
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::state::Action,
        clawsetup_provider_setup::{DiscoveryOutcome, known_providers},
    };

    fn state(provider: &str) -> ConfigurationState {
        ConfigurationState::new(provider, "", "ab".repeat(24))
    }

    #[test]
    fn full_flow_for_catalog_provider() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        assert_eq!(f.step(), WizardStep::Provider);

        assert_eq!(
            f.advance("deepseek", &s),
            FlowCommand::SelectProvider("deepseek".into())
        );
        assert_eq!(f.step(), WizardStep::ApiKey);

        assert_eq!(f.advance("sk-1", &s), FlowCommand::SetApiKey("sk-1".into()));
        assert_eq!(f.step(), WizardStep::Model);

        assert_eq!(f.advance("", &s), FlowCommand::Keep);
        assert_eq!(f.step(), WizardStep::Token);

        assert_eq!(f.advance("", &s), FlowCommand::Keep);
        assert_eq!(f.step(), WizardStep::Confirm);

        assert_eq!(f.advance("", &s), FlowCommand::Submit);
        assert_eq!(f.step(), WizardStep::Confirm);
        f.finish();
        assert!(f.is_done());
    }

    #[test]
    fn custom_provider_asks_for_env_key() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        assert_eq!(
            f.advance("custom", &s),
            FlowCommand::SelectProvider("custom".into())
        );
        assert_eq!(f.step(), WizardStep::CustomEnvKey);
        assert_eq!(
            f.advance("FOO_KEY", &s),
            FlowCommand::SetCustomEnvKey("FOO_KEY".into())
        );
        assert_eq!(f.step(), WizardStep::ApiKey);
    }

    #[test]
    fn provider_by_menu_number() {
        let s = state("openai");
        let expected = menu_providers()[2].id;
        let mut f = WizardFlow::new();
        assert_eq!(
            f.advance("3", &s),
            FlowCommand::SelectProvider(expected.into())
        );
    }

    #[test]
    fn menu_lists_every_provider_once() {
        assert_eq!(menu_providers().len(), known_providers().len());
        let menu = provider_menu();
        for p in known_providers() {
            assert!(menu.contains(&format!("({})", p.id)), "{}", p.id);
        }
    }

    #[test]
    fn unknown_provider_stays() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        assert!(matches!(f.advance("ollama", &s), FlowCommand::Invalid(_)));
        assert!(matches!(f.advance("99", &s), FlowCommand::Invalid(_)));
        assert_eq!(f.step(), WizardStep::Provider);
    }

    #[test]
    fn model_step_discovers_and_picks_by_number() {
        let mut s = state("openai");
        s.apply(Action::DiscoveryFinished {
            outcome: DiscoveryOutcome::Listed {
                models: vec!["gpt-4o".into(), "gpt-4o-mini".into()],
                message: None,
            },
        });
        let mut f = WizardFlow::new();
        f.advance("", &s);
        f.advance("", &s);
        assert_eq!(f.step(), WizardStep::Model);

        assert_eq!(f.advance("?", &s), FlowCommand::Discover);
        assert_eq!(f.step(), WizardStep::Model);
        assert!(f.prompt(&s).contains(" 2. gpt-4o-mini"));

        assert_eq!(f.advance("2", &s), FlowCommand::SetModel("gpt-4o-mini".into()));
        assert_eq!(f.step(), WizardStep::Token);
    }

    #[test]
    fn out_of_range_number_is_a_model_name() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        f.advance("", &s);
        f.advance("", &s);
        assert_eq!(f.advance("7", &s), FlowCommand::SetModel("7".into()));
    }

    #[test]
    fn blank_model_cannot_be_kept() {
        let mut s = state("custom");
        s.apply(Action::EditModel {
            value: String::new(),
        });
        let mut f = WizardFlow::new();
        f.advance("", &s);
        f.advance("", &s);
        f.advance("", &s);
        assert_eq!(f.step(), WizardStep::Model);
        assert!(matches!(f.advance("", &s), FlowCommand::Invalid(_)));
        assert_eq!(f.step(), WizardStep::Model);
    }

    #[test]
    fn token_step_regenerates_in_place() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        for _ in 0..3 {
            f.advance("", &s);
        }
        assert_eq!(f.step(), WizardStep::Token);
        assert_eq!(f.advance("R", &s), FlowCommand::RegenerateToken);
        assert_eq!(f.step(), WizardStep::Token);
        assert_eq!(f.advance("mine", &s), FlowCommand::SetToken("mine".into()));
    }

    #[test]
    fn back_and_quit_from_confirm() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        for _ in 0..4 {
            f.advance("", &s);
        }
        assert_eq!(f.step(), WizardStep::Confirm);

        f.advance("back", &s);
        assert_eq!(f.step(), WizardStep::Token);

        f.advance("", &s);
        assert_eq!(f.advance("q", &s), FlowCommand::Cancel);
        assert!(f.is_done());
    }

    #[test]
    fn back_after_failed_save_reaches_every_field() {
        let s = state("openai");
        let mut f = WizardFlow::new();
        f.retry();

        let mut visited = Vec::new();
        for _ in 0..5 {
            assert_eq!(f.advance("back", &s), FlowCommand::Keep);
            visited.push(f.step());
        }
        assert_eq!(visited, [
            WizardStep::Token,
            WizardStep::Model,
            WizardStep::ApiKey,
            WizardStep::Provider,
            WizardStep::Provider,
        ]);

        // Forward again with a different model.
        f.advance("", &s);
        f.advance("", &s);
        assert_eq!(f.advance("openai/o3", &s), FlowCommand::SetModel("openai/o3".into()));
        assert_eq!(f.step(), WizardStep::Token);
    }

    #[test]
    fn back_from_api_key_visits_custom_env_key() {
        let s = state("custom");
        let mut f = WizardFlow::new();
        f.retry();
        for _ in 0..3 {
            f.advance("back", &s);
        }
        assert_eq!(f.step(), WizardStep::ApiKey);
        f.advance("back", &s);
        assert_eq!(f.step(), WizardStep::CustomEnvKey);
        f.advance("back", &s);
        assert_eq!(f.step(), WizardStep::Provider);
    }

    #[test]
    fn retry_returns_to_confirm() {
        let mut f = WizardFlow::new();
        f.finish();
        f.retry();
        assert_eq!(f.step(), WizardStep::Confirm);
    }
}
