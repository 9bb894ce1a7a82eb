//! Comfort-content recommendation agent (enhanced flow only).

use crate::agent::{fill_template, AgentContext, AgentError, AgentOutcome, TherapyAgent};
use crate::client_wrapper::{GenerateOptions, Provider};
use crate::config::{AgentConfig, TaskTemplate};
use crate::emotion::{normalize_sentiment, Sentiment};
use crate::gateway::LlmGateway;
use async_trait::async_trait;
use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct ContentRecallInput {
    #[serde(default)]
    emotion_analysis: Value,
}

pub struct ContentRecallAgent {
    name: String,
    gateway: Arc<LlmGateway>,
    provider: Provider,
    template: TaskTemplate,
    system_prompt: String,
    options: GenerateOptions,
}

impl ContentRecallAgent {
    pub fn new(
        name: &str,
        config: &AgentConfig,
        template: TaskTemplate,
        gateway: Arc<LlmGateway>,
    ) -> Self {
        let provider = config
            .provider
            .unwrap_or(gateway.settings().primary_provider);
        ContentRecallAgent {
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

    fn static_recommendations(sentiment: Sentiment) -> Vec<Value> {
        let picks: &[(&str, &str)] = match sentiment {
            Sentiment::Negative => &[
                ("一段白噪音歌单", "轻柔的声音可以陪你安静一会儿"),
                ("写三行小日记", "把心里的话放到纸上会轻松一点"),
            ],
            Sentiment::Positive => &[
                ("把今天的好事记进开心清单", "开心的瞬间值得收藏起来"),
                ("分享给一个想到的朋友", "快乐分享出去会变成双份"),
            ],
            Sentiment::Neutral => &[
                ("出门散步十分钟", "换换空气，让脑袋放空一下"),
                ("泡一杯热热的茶", "小小的仪式感也很治愈"),
            ],
        };
        picks
            .iter()
            .map(|(title, reason)| json!({ "title": title, "reason": reason }))
            .collect()
    }

    fn parse_recommendations(text: &str) -> Option<Vec<Value>> {
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
impl TherapyAgent for ContentRecallAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe_input(&self) -> Value {
        json!({ "emotion_analysis": { "sentiment": "neutral" } })
    }

    async fn process(&self, _ctx: &AgentContext, input: &Value) -> Result<AgentOutcome, AgentError> {
        let input: ContentRecallInput = serde_json::from_value(input.clone())
            .map_err(|err| AgentError::Validation(format!("bad content input: {}", err)))?;

        let sentiment = input
            .emotion_analysis
            .get("sentiment")
            .and_then(Value::as_str)
            .map(normalize_sentiment)
            .unwrap_or(Sentiment::Neutral);

        let summary = if input.emotion_analysis.is_null() {
            "无".to_string()
        } else {
            input.emotion_analysis.to_string()
        };
        let prompt = fill_template(&self.template.description, &[("emotion_summary", summary.as_str())]);
        let options = GenerateOptions {
            system_prompt: Some(self.system_prompt.clone()),
            ..self.options.clone()
        };

        match self.gateway.generate(self.provider, &prompt, &options).await {
            Ok(generation) => {
                let recommendations = Self::parse_recommendations(&generation.text)
                    .unwrap_or_else(|| Self::static_recommendations(sentiment));
                Ok(AgentOutcome::with_provider(
                    json!({
                        "recommendations": recommendations,
                        "based_on_emotion": sentiment,
                    }),
                    generation.provider,
                    generation.model,
                ))
            }
            Err(err) => {
                warn!("{}: gateway unavailable ({}), using static recommendations", self.name, err);
                Ok(AgentOutcome::new(json!({
                    "recommendations": Self::static_recommendations(sentiment),
                    "based_on_emotion": sentiment,
                })))
            }
        }
    }
}
