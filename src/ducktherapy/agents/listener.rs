//! Emotion-analysis agent.
//!
//! The listener always runs the rule-based analyzer and, when the gateway is
//! reachable, merges the model's reading on top of it.  A dead gateway or an
//! unparsable reply therefore degrades quality, never availability.

use crate::agent::{fill_template, AgentContext, AgentError, AgentOutcome, TherapyAgent};
use crate::client_wrapper::{GenerateOptions, Provider};
use crate::config::{AgentConfig, EmotionRules, TaskTemplate};
use crate::emotion::{extract_from_text, extract_json, merge, RuleAnalyzer};
use crate::gateway::LlmGateway;
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ListenerInput {
    text: String,
    #[serde(default)]
    context: Option<String>,
}

pub struct ListenerAgent {
    name: String,
    gateway: Arc<LlmGateway>,
    provider: Provider,
    template: TaskTemplate,
    system_prompt: String,
    options: GenerateOptions,
    analyzer: RuleAnalyzer,
}

impl ListenerAgent {
    pub fn new(
        name: &str,
        config: &AgentConfig,
        template: TaskTemplate,
        rules: EmotionRules,
        gateway: Arc<LlmGateway>,
    ) -> Self {
        let provider = config
            .provider
            .unwrap_or(gateway.settings().primary_provider);
        ListenerAgent {
            name: name.to_string(),
            provider,
            template,
            system_prompt: format!("你是{}。{}\n目标：{}", config.role, config.backstory, config.goal),
            options: GenerateOptions {
                system_prompt: None,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            analyzer: RuleAnalyzer::new(rules),
            gateway,
        }
    }

    fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            system_prompt: Some(self.system_prompt.clone()),
            ..self.options.clone()
        }
    }
}

#[async_trait]
impl TherapyAgent for ListenerAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, _ctx: &AgentContext, input: &Value) -> Result<AgentOutcome, AgentError> {
        let input: ListenerInput = serde_json::from_value(input.clone())
            .map_err(|err| AgentError::Validation(format!("bad listener input: {}", err)))?;
        if input.text.trim().is_empty() {
            return Err(AgentError::Validation("text must not be empty".to_string()));
        }

        // The rule path runs unconditionally so a model failure still leaves
        // a complete analysis behind.
        let rule_analysis = self.analyzer.analyze(&input.text);

        let prompt = fill_template(
            &self.template.description,
            &[
                ("user_message", input.text.as_str()),
                ("context", input.context.as_deref().unwrap_or("无")),
            ],
        );

        match self.gateway.generate(self.provider, &prompt, &self.generate_options()).await {
            Ok(generation) => {
                let raw = extract_json(&generation.text)
                    .or_else(|| extract_from_text(&generation.text, self.analyzer.rules()));
                let analysis = match raw {
                    Some(raw) => merge(&raw, &rule_analysis),
                    None => {
                        warn!("{}: model reply had no usable analysis, keeping rule result", self.name);
                        rule_analysis
                    }
                };
                let data = serde_json::to_value(&analysis)
                    .map_err(|err| AgentError::BadModelOutput(err.to_string()))?;
                Ok(AgentOutcome::with_provider(data, generation.provider, generation.model))
            }
            Err(err) => {
                warn!("{}: gateway unavailable ({}), falling back to rule-based analysis", self.name, err);
                let data = serde_json::to_value(&rule_analysis)
                    .map_err(|inner| AgentError::BadModelOutput(format!("{} (after gateway error: {})", inner, err)))?;
                Ok(AgentOutcome::new(data))
            }
        }
    }
}
