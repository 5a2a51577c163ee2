//! Fixed table of LLM providers offered by the wizard.

use serde::Serialize;

/// Id of the provider whose credential variable name is operator-supplied.
pub const CUSTOM_PROVIDER_ID: &str = "custom";

/// Provider selected when nothing else is configured.
pub const DEFAULT_PROVIDER_ID: &str = "openai";

/// Display grouping. Carries no behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderGroup {
    Mainstream,
    Domestic,
}

impl ProviderGroup {
    pub const ALL: [Self; 2] = [Self::Mainstream, Self::Domestic];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mainstream => "主流提供商",
            Self::Domestic => "国内提供商",
        }
    }
}

/// A selectable provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOption {
    pub id: &'static str,
    pub label: &'static str,
    /// Credential variable name; `None` only for the custom provider.
    pub env_key: Option<&'static str>,
    pub group: ProviderGroup,
    /// Informational: discovery is attempted regardless.
    pub supports_auto_models: bool,
    /// Model pre-filled when the provider is selected.
    pub default_model: Option<&'static str>,
}

impl ProviderOption {
    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_PROVIDER_ID
    }
}

const PROVIDERS: &[ProviderOption] = &[
    ProviderOption {
        id: "openai",
        label: "OpenAI",
        env_key: Some("OPENAI_API_KEY"),
        group: ProviderGroup::Mainstream,
        supports_auto_models: true,
        default_model: Some("openai/gpt-4o-mini"),
    },
    ProviderOption {
        id: "anthropic",
        label: "Anthropic",
        env_key: Some("ANTHROPIC_API_KEY"),
        group: ProviderGroup::Mainstream,
        supports_auto_models: true,
        default_model: Some("anthropic/claude-3-7-sonnet"),
    },
    ProviderOption {
        id: "gemini",
        label: "Gemini",
        env_key: Some("GEMINI_API_KEY"),
        group: ProviderGroup::Mainstream,
        supports_auto_models: true,
        default_model: Some("gemini/gemini-1.5-pro"),
    },
    ProviderOption {
        id: "groq",
        label: "Groq",
        env_key: Some("GROQ_API_KEY"),
        group: ProviderGroup::Mainstream,
        supports_auto_models: true,
        default_model: Some("groq/llama-3.1-70b-versatile"),
    },
    ProviderOption {
        id: "mistral",
        label: "Mistral",
        env_key: Some("MISTRAL_API_KEY"),
        group: ProviderGroup::Mainstream,
        supports_auto_models: true,
        default_model: Some("mistral/large-latest"),
    },
    ProviderOption {
        id: "cohere",
        label: "Cohere",
        env_key: Some("COHERE_API_KEY"),
        group: ProviderGroup::Mainstream,
        supports_auto_models: false,
        default_model: Some("cohere/command-r-plus"),
    },
    ProviderOption {
        id: "minimax",
        label: "MiniMax",
        env_key: Some("MINIMAX_API_KEY"),
        group: ProviderGroup::Domestic,
        supports_auto_models: false,
        default_model: Some("minimax/MiniMax-M2.1"),
    },
    ProviderOption {
        id: "deepseek",
        label: "DeepSeek",
        env_key: Some("DEEPSEEK_API_KEY"),
        group: ProviderGroup::Domestic,
        supports_auto_models: true,
        default_model: Some("deepseek/deepseek-chat"),
    },
    ProviderOption {
        id: "moonshot",
        label: "Moonshot / Kimi",
        env_key: Some("MOONSHOT_API_KEY"),
        group: ProviderGroup::Domestic,
        supports_auto_models: true,
        default_model: Some("moonshot/kimi-k2.5"),
    },
    ProviderOption {
        id: "zai",
        label: "ZAI / GLM",
        env_key: Some("ZAI_API_KEY"),
        group: ProviderGroup::Domestic,
        supports_auto_models: false,
        default_model: Some("zai/glm-4.7"),
    },
    ProviderOption {
        id: "qwen",
        label: "Qwen",
        env_key: Some("QWEN_API_KEY"),
        group: ProviderGroup::Domestic,
        supports_auto_models: true,
        default_model: Some("qwen/qwen2.5-coder-32b-instruct"),
    },
    ProviderOption {
        id: CUSTOM_PROVIDER_ID,
        label: "自定义提供商",
        env_key: None,
        group: ProviderGroup::Domestic,
        supports_auto_models: false,
        default_model: None,
    },
];

/// All providers, in display order.
pub fn known_providers() -> &'static [ProviderOption] {
    PROVIDERS
}

/// Look up a provider by id.
pub fn lookup(id: &str) -> Option<&'static ProviderOption> {
    PROVIDERS.iter().find(|p| p.id == id)
}

/// Providers belonging to `group`, in display order.
pub fn by_group(group: ProviderGroup) -> impl Iterator<Item = &'static ProviderOption> {
    PROVIDERS.iter().filter(move |p| p.group == group)
}

pub fn is_custom(id: &str) -> bool {
    id == CUSTOM_PROVIDER_ID
}
