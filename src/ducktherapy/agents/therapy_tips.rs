//! Self-help suggestion agent, dispatched only for intense emotions.

use crate::agent::{fill_template, AgentContext, AgentError, AgentOutcome, TherapyAgent};
use crate::client_wrapper::{GenerateOptions, Provider};
use crate::config::{AgentConfig, TaskTemplate};
use crate::gateway::LlmGateway;
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct TherapyTipsInput {
    #[serde(default)]
    emotion_analysis: Value,
}

pub struct TherapyTipsAgent {
    name: String,
    gateway: Arc<LlmGateway>,
    provider: Provider,
    template: TaskTemplate,
    system_prompt: String,
    options: GenerateOptions,
}

impl TherapyTipsAgent {
    pub fn new(
        name: &str,
        config: &AgentConfig,
        template: TaskTemplate,
        gateway: Arc<LlmGateway>,
    ) -> Self {
        let provider = config
            .provider
            .unwrap_or(gateway.settings().primary_provider);
        TherapyTipsAgent {
            name: name.to_string(),
            provider,
            template,
            system_prompt: format!("你是{}。{}\n目标：{}", config.role, config.backstory, config.goal),
            options: GenerateOptions {
                system_prompt: None,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            gateway,
        }
    }

    fn static_suggestions(primary_emotion: Option<&str>) -> Vec<Value> {
        let picks: &[(&str, &str)] = match primary_emotion {
            Some("焦虑") => &[
                ("4-7-8 呼吸练习", "吸气4秒，屏住7秒，呼气8秒，重复三轮"),
                ("写下担心清单", "把担心的事情列出来，圈出今天能做一小步的那件"),
            ],
            Some("悲伤") => &[
                ("允许自己难过十分钟", "定个闹钟，这十分钟里不评判自己的任何感受"),
                ("给情绪起个名字", "试着用一句话描述现在的感觉，再轻轻放下它"),
            ],
            Some("愤怒") => &[
                ("离开现场三分钟", "喝口水、洗把脸，让身体先降温"),
                ("用力写再撕掉", "把想说的话写在纸上，然后撕掉它"),
            ],
            _ => &[
                ("身体扫描放松", "从头到脚依次放松每个部位，各停留三秒"),
                ("五感着陆练习", "说出你看到的5样、听到的4样、摸到的3样东西"),
            ],
        };
        picks
            .iter()
            .map(|(title, steps)| json!({ "title": title, "steps": steps }))
            .collect()
    }

    fn parse_suggestions(text: &str) -> Option<Vec<Value>> {
        let start = text.find('[')?;
        let end = text.rfind(']')?;
        if end <= start {
            return None;
        }
        let items: Vec<Value> = serde_json::from_str(&text[start..=end]).ok()?;
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}

#[async_trait]
impl TherapyAgent for TherapyTipsAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe_input(&self) -> Value {
        json!({ "emotion_analysis": { "primary_emotions": ["焦虑"], "urgency_level": 3 } })
    }

    async fn process(&self, _ctx: &AgentContext, input: &Value) -> Result<AgentOutcome, AgentError> {
        let input: TherapyTipsInput = serde_json::from_value(input.clone())
            .map_err(|err| AgentError::Validation(format!("bad suggestion input: {}", err)))?;

        let emotions: Vec<String> = input
            .emotion_analysis
            .get("primary_emotions")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(String::from).collect())
            .unwrap_or_default();
        let urgency_level = input
            .emotion_analysis
            .get("urgency_level")
            .and_then(Value::as_u64)
            .unwrap_or(1);

        let emotions_text = if emotions.is_empty() {
            "未知".to_string()
        } else {
            emotions.join("、")
        };
        let urgency_text = urgency_level.to_string();
        let prompt = fill_template(
            &self.template.description,
            &[
                ("emotions", emotions_text.as_str()),
                ("urgency_level", urgency_text.as_str()),
            ],
        );
        let options = GenerateOptions {
            system_prompt: Some(self.system_prompt.clone()),
            ..self.options.clone()
        };

        let primary = emotions.first().map(String::as_str);
        match self.gateway.generate(self.provider, &prompt, &options).await {
            Ok(generation) => {
                let suggestions = Self::parse_suggestions(&generation.text)
                    .unwrap_or_else(|| Self::static_suggestions(primary));
                Ok(AgentOutcome::with_provider(
                    json!({
                        "suggestions": suggestions,
                        "urgency_level": urgency_level,
                    }),
                    generation.provider,
                    generation.model,
                ))
            }
            Err(err) => {
                warn!("{}: gateway unavailable ({}), using rule-table suggestions", self.name, err);
                Ok(AgentOutcome::new(json!({
                    "suggestions": Self::static_suggestions(primary),
                    "urgency_level": urgency_level,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anxiety_gets_breathing_exercises() {
        let suggestions = TherapyTipsAgent::static_suggestions(Some("焦虑"));
        assert!(suggestions[0]["title"].as_str().unwrap().contains("呼吸"));
    }

    #[test]
    fn unknown_emotions_still_get_suggestions() {
        assert!(!TherapyTipsAgent::static_suggestions(None).is_empty());
        assert!(!TherapyTipsAgent::static_suggestions(Some("惊讶")).is_empty());
    }
}
