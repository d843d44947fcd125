//! Scenario generation and translation through external text-generation
//! APIs, with a deterministic fallback.
//!
//! RULE: AI unavailability never blocks gameplay. Every failure on the
//! external path (missing key, HTTP error, timeout, unusable output)
//! degrades to the fixed fallback record or the untranslated text.

pub mod extract;
pub mod prompt;
pub mod providers;

use crate::{
    config::{AiConfig, ResourceValue},
    error::{GameError, GameResult},
    scenario::{fallback_scenario, ScenarioRecord},
    types::Money,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Duration};

pub const SYSTEM_PROMPT: &str = "You are a rural business education expert. Return only valid JSON.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::OpenAi, Self::HuggingFace, Self::Anthropic];

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::HuggingFace => "huggingface",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown AI provider '{s}'"))
    }
}

/// What a generation call is for. Translation runs cooler and shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Scenario,
    Translation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub purpose:     Purpose,
    pub temperature: f64,
    pub max_tokens:  u32,
    pub system:      Option<&'static str>,
    /// Overrides the provider's configured timeout.
    pub timeout:     Option<Duration>,
}

impl GenerationParams {
    pub fn scenario() -> Self {
        Self {
            purpose:     Purpose::Scenario,
            temperature: 0.7,
            max_tokens:  1000,
            system:      Some(SYSTEM_PROMPT),
            timeout:     None,
        }
    }

    pub fn translation() -> Self {
        Self {
            purpose:     Purpose::Translation,
            temperature: 0.3,
            max_tokens:  500,
            system:      None,
            timeout:     Some(Duration::from_secs(30)),
        }
    }
}

/// One text-generation backend.
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn generate(&self, prompt: &str, params: &GenerationParams) -> GameResult<String>;
}

/// The business facts a scenario prompt is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub business_type:   String,
    pub location:        String,
    pub capital:         Money,
    pub resources:       BTreeMap<String, ResourceValue>,
    pub employment_mode: String,
    pub round:           u32,
}

impl BusinessContext {
    /// The fixed context used to probe a provider.
    pub fn connection_test() -> Self {
        Self {
            business_type:   "Dairy Farming".into(),
            location:        "Test Village".into(),
            capital:         50_000,
            resources:       BTreeMap::new(),
            employment_mode: "Self-operated".into(),
            round:           1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedScenario {
    pub record: ScenarioRecord,
    pub source: ScenarioSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub provider:      ProviderKind,
    pub credential:    bool,
    pub source:        ScenarioSource,
    /// Why the external path was not used, when it wasn't.
    pub error:         Option<String>,
    pub record:        ScenarioRecord,
}

pub struct ScenarioProvider {
    kind:          ProviderKind,
    generator:     Option<Box<dyn TextGenerator>>,
    base_language: String,
}

impl ScenarioProvider {
    /// Resolve the credential for `kind` from its environment variable.
    /// No key (or no config for `kind`) means fallback-only.
    pub fn from_env(ai: &AiConfig, kind: ProviderKind, base_language: &str) -> Self {
        let Some(config) = ai.providers.get(&kind) else {
            log::warn!("ai: no configuration for provider {kind}; using fallback scenarios");
            return Self::fallback_only(kind, base_language);
        };
        let key = std::env::var(&config.env_key)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let Some(key) = key else {
            log::info!("ai: {} not set; {kind} will use fallback scenarios", config.env_key);
            return Self::fallback_only(kind, base_language);
        };
        match providers::build(kind, config, key) {
            Ok(generator) => Self::with_generator(generator, base_language),
            Err(e) => {
                log::warn!("ai: cannot build {kind} client: {e}");
                Self::fallback_only(kind, base_language)
            }
        }
    }

    pub fn fallback_only(kind: ProviderKind, base_language: &str) -> Self {
        Self {
            kind,
            generator: None,
            base_language: base_language.to_string(),
        }
    }

    pub fn with_generator(generator: Box<dyn TextGenerator>, base_language: &str) -> Self {
        Self {
            kind: generator.provider(),
            generator: Some(generator),
            base_language: base_language.to_string(),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn has_credential(&self) -> bool {
        self.generator.is_some()
    }

    /// A scenario for `ctx`. Never fails.
    pub fn generate(&self, ctx: &BusinessContext) -> GeneratedScenario {
        if self.generator.is_none() {
            return Self::fallback(ctx);
        }
        match self.try_generate(ctx) {
            Ok(record) => GeneratedScenario { record, source: ScenarioSource::Ai },
            Err(e) => {
                log::warn!("ai: {} scenario generation failed: {e}; using fallback", self.kind);
                Self::fallback(ctx)
            }
        }
    }

    fn fallback(ctx: &BusinessContext) -> GeneratedScenario {
        GeneratedScenario {
            record: fallback_scenario(&ctx.business_type),
            source: ScenarioSource::Fallback,
        }
    }

    /// The external path only: prompt, call, extract, validate.
    pub fn try_generate(&self, ctx: &BusinessContext) -> GameResult<ScenarioRecord> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| GameError::Other(anyhow::anyhow!("no credential for {}", self.kind)))?;
        let prompt = prompt::scenario_prompt(ctx);
        log::debug!("ai: {} scenario prompt for round {} ({} chars)", self.kind, ctx.round, prompt.len());
        let text = generator.generate(&prompt, &GenerationParams::scenario())?;
        let record: ScenarioRecord = extract::extract_json(&text)?;
        record
            .validate()
            .map_err(crate::error::ValidationError::InvalidScenario)?;
        Ok(record)
    }

    /// Translate `text` into `language`. Returns the input unchanged for
    /// the base language, without a credential, or on any failure.
    pub fn translate(&self, text: &str, language: &str) -> String {
        if language == self.base_language || text.trim().is_empty() {
            return text.to_string();
        }
        let Some(generator) = self.generator.as_ref() else {
            return text.to_string();
        };
        let prompt = prompt::translation_prompt(text, language);
        match generator.generate(&prompt, &GenerationParams::translation()) {
            Ok(translated) if !translated.trim().is_empty() => translated.trim().to_string(),
            Ok(_) => text.to_string(),
            Err(e) => {
                log::warn!("ai: translation to {language} failed: {e}");
                text.to_string()
            }
        }
    }

    /// Generate for the fixed test context and report which path answered.
    pub fn test_connection(&self) -> ConnectionReport {
        let ctx = BusinessContext::connection_test();
        let (record, source, error) = if self.generator.is_none() {
            (fallback_scenario(&ctx.business_type), ScenarioSource::Fallback, Some("no API key configured".to_string()))
        } else {
            match self.try_generate(&ctx) {
                Ok(record) => (record, ScenarioSource::Ai, None),
                Err(e) => (fallback_scenario(&ctx.business_type), ScenarioSource::Fallback, Some(e.to_string())),
            }
        };
        log::info!("ai: connection test for {} answered by {source:?}", self.kind);
        ConnectionReport {
            provider: self.kind,
            credential: self.generator.is_some(),
            source,
            error,
            record,
        }
    }
}
