//! Persona-styling agent.
//!
//! Turns a raw reply into "鸭鸭" voice.  Safety screening runs before
//! anything else: a crisis or medical match answers immediately with the
//! configured fixed response and never reaches the gateway.

use crate::agent::{fill_template, AgentContext, AgentError, AgentOutcome, TherapyAgent};
use crate::client_wrapper::{GenerateOptions, Provider};
use crate::config::{AgentConfig, ConfigError, PersonalityRules, TaskTemplate};
use crate::emotion::{normalize_sentiment, Sentiment};
use crate::gateway::LlmGateway;
use async_trait::async_trait;
use log::{info, warn};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct DuckStyleInput {
    user_message: String,
    #[serde(default)]
    emotion_analysis: Value,
    #[serde(default)]
    response_style: Option<String>,
}

/// What the styling step knows about the user's state.  Built leniently from
/// the emotion payload; a failed analysis step hands over `{}` and every
/// accessor falls back to neutral.
struct EmotionView {
    sentiment: Sentiment,
    primary_emotions: Vec<String>,
}

impl EmotionView {
    fn from_value(value: &Value) -> Self {
        let sentiment = value
            .get("sentiment")
            .and_then(Value::as_str)
            .map(normalize_sentiment)
            .unwrap_or(Sentiment::Neutral);
        let primary_emotions = value
            .get("primary_emotions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        EmotionView {
            sentiment,
            primary_emotions,
        }
    }
}

pub struct DuckStyleAgent {
    name: String,
    gateway: Arc<LlmGateway>,
    provider: Provider,
    template: TaskTemplate,
    system_prompt: String,
    options: GenerateOptions,
    personality: PersonalityRules,
    crisis_patterns: Vec<Regex>,
    medical_patterns: Vec<Regex>,
    crisis_response: String,
    medical_response: String,
    whitespace_re: Regex,
    punct_re: Regex,
}

impl DuckStyleAgent {
    pub fn new(
        name: &str,
        config: &AgentConfig,
        template: TaskTemplate,
        gateway: Arc<LlmGateway>,
    ) -> Result<Self, ConfigError> {
        let personality = config
            .personality
            .clone()
            .ok_or_else(|| ConfigError::Invalid(format!("{} has no personality block", name)))?;
        let safety = config
            .safety
            .clone()
            .ok_or_else(|| ConfigError::Invalid(format!("{} has no safety block", name)))?;

        let compile = |patterns: &[String]| -> Result<Vec<Regex>, ConfigError> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|err| {
                        ConfigError::Invalid(format!("bad safety pattern {:?}: {}", p, err))
                    })
                })
                .collect()
        };

        let provider = config
            .provider
            .unwrap_or(gateway.settings().primary_provider);

        Ok(DuckStyleAgent {
            name: name.to_string(),
            provider,
            template,
            system_prompt: format!(
                "你是{}。{}\n目标：{}\n语气：{}\n表达方式：{}",
                config.role, config.backstory, config.goal, personality.tone, personality.expression_style
            ),
            options: GenerateOptions {
                system_prompt: None,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
            crisis_patterns: compile(&safety.crisis_patterns)?,
            medical_patterns: compile(&safety.medical_patterns)?,
            crisis_response: safety.crisis_response,
            medical_response: safety.medical_response,
            // \s+ collapse and duplicated Chinese punctuation; compiled once.
            whitespace_re: Regex::new(r"\s+").map_err(|e| ConfigError::Invalid(e.to_string()))?,
            punct_re: Regex::new(r"[，。]{2,}").map_err(|e| ConfigError::Invalid(e.to_string()))?,
            personality,
            gateway,
        })
    }

    /// Crisis patterns first, medical second.  Returns the fixed response
    /// and the reason tag on a match.
    fn screen(&self, message: &str) -> Option<(&'static str, &str)> {
        if self.crisis_patterns.iter().any(|re| re.is_match(message)) {
            return Some(("crisis", self.crisis_response.as_str()));
        }
        if self.medical_patterns.iter().any(|re| re.is_match(message)) {
            return Some(("medical", self.medical_response.as_str()));
        }
        None
    }

    fn has_any(text: &str, phrases: &[String]) -> bool {
        phrases.iter().any(|p| text.contains(p.as_str()))
    }

    /// The duck-voice enhancement pipeline, applied to the raw model reply.
    fn enhance(&self, raw: &str, view: &EmotionView, style: Option<&str>) -> String {
        let mut text = raw.trim().to_string();

        if view.sentiment == Sentiment::Negative && !Self::has_any(&text, &self.personality.empathy_phrases) {
            if let Some(opener) = self.personality.empathy_phrases.first() {
                text = format!("{}{}", opener, text);
            }
        }

        if view.primary_emotions.iter().any(|e| e == "悲伤")
            && !Self::has_any(&text, &self.personality.comfort_phrases)
        {
            if let Some(comfort) = self.personality.comfort_phrases.first() {
                text = format!("{}。{}", text.trim_end_matches('。'), comfort);
            }
        }

        if !text.contains("鸭鸭") {
            text = if text.contains('我') {
                text.replacen('我', "鸭鸭", 1)
            } else {
                format!("鸭鸭想说：{}", text)
            };
        }

        match style {
            Some("brief") => {
                let sentences: Vec<&str> = text
                    .split(|c| c == '。' || c == '！' || c == '？')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect();
                if sentences.len() > 2 {
                    text = format!("{}。{}", sentences[0], sentences[sentences.len() - 1]);
                }
            }
            Some("detailed") => {
                if let Some(emotion) = view.primary_emotions.first() {
                    if !text.contains("能感受到") {
                        text = format!("鸭鸭能感受到你的{}，{}", emotion, text);
                    }
                }
            }
            _ => {}
        }

        if !Self::has_any(&text, &self.personality.endings) {
            let ending = if text.chars().count() > self.personality.brief_threshold {
                self.personality.endings.first()
            } else {
                self.personality.endings.last()
            };
            if let Some(ending) = ending {
                text = format!("{}{}", text, ending);
            }
        }

        self.cleanup(&text)
    }

    fn cleanup(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for phrase in &self.personality.analytical_phrases {
            cleaned = cleaned.replace(phrase.as_str(), "");
        }
        cleaned = self.whitespace_re.replace_all(&cleaned, " ").into_owned();
        cleaned = self.punct_re.replace_all(&cleaned, "。").into_owned();
        let mut cleaned = cleaned
            .trim()
            .trim_start_matches(|c| c == '，' || c == '。')
            .trim()
            .to_string();

        if cleaned.chars().count() > self.personality.max_response_length {
            let sentences: Vec<&str> = cleaned
                .split(|c| c == '。' || c == '！' || c == '？')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            cleaned = sentences.iter().take(2).cloned().collect::<Vec<_>>().join("。");
        }

        if !cleaned.ends_with(|c| c == '。' || c == '！' || c == '？' || c == '～') {
            cleaned.push('。');
        }
        cleaned
    }

    /// Canned duck-voice replies keyed by the emotional read, used when the
    /// gateway is unreachable.
    fn fallback_response(&self, view: &EmotionView) -> String {
        let has = |emotion: &str| view.primary_emotions.iter().any(|e| e == emotion);
        let body = match view.sentiment {
            Sentiment::Negative if has("悲伤") => {
                "鸭鸭看到你难过的样子，心里也软软地疼。想哭就哭一会儿吧，鸭鸭在这里陪着你"
            }
            Sentiment::Negative if has("焦虑") => {
                "别慌别慌，鸭鸭陪你慢慢捋一捋。先跟鸭鸭一起深呼吸一下好不好"
            }
            Sentiment::Negative => "听起来今天真的不容易，辛苦你了。鸭鸭想给你一个大大的抱抱",
            Sentiment::Positive => "哇，鸭鸭听了也跟着开心起来啦！要把这份好心情好好收藏哦",
            Sentiment::Neutral => "鸭鸭在认真听呢，愿意再跟鸭鸭多说一点吗",
        };
        let ending = self.personality.endings.last().map(String::as_str).unwrap_or("");
        format!("{}。{}", body, ending)
    }
}

#[async_trait]
impl TherapyAgent for DuckStyleAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe_input(&self) -> Value {
        json!({ "user_message": "你好呀" })
    }

    async fn process(&self, _ctx: &AgentContext, input: &Value) -> Result<AgentOutcome, AgentError> {
        let input: DuckStyleInput = serde_json::from_value(input.clone())
            .map_err(|err| AgentError::Validation(format!("bad styling input: {}", err)))?;
        if input.user_message.trim().is_empty() {
            return Err(AgentError::Validation("user_message must not be empty".to_string()));
        }

        if let Some((reason, response)) = self.screen(&input.user_message) {
            info!("{}: safety gate triggered ({})", self.name, reason);
            return Ok(AgentOutcome::new(json!({
                "response_text": response,
                "safety_triggered": true,
                "safety_reason": reason,
                "fallback_used": false,
            })));
        }

        let view = EmotionView::from_value(&input.emotion_analysis);
        let emotion_context = if input.emotion_analysis.is_null() {
            "无".to_string()
        } else {
            input.emotion_analysis.to_string()
        };
        let prompt = fill_template(
            &self.template.description,
            &[
                ("user_message", input.user_message.as_str()),
                ("emotion_context", emotion_context.as_str()),
            ],
        );
        let options = GenerateOptions {
            system_prompt: Some(self.system_prompt.clone()),
            ..self.options.clone()
        };

        match self.gateway.generate(self.provider, &prompt, &options).await {
            Ok(generation) => {
                let styled = self.enhance(&generation.text, &view, input.response_style.as_deref());
                Ok(AgentOutcome::with_provider(
                    json!({
                        "response_text": styled,
                        "safety_triggered": false,
                        "fallback_used": false,
                    }),
                    generation.provider,
                    generation.model,
                ))
            }
            Err(err) => {
                warn!("{}: gateway unavailable ({}), using canned duck reply", self.name, err);
                Ok(AgentOutcome::new(json!({
                    "response_text": self.fallback_response(&view),
                    "safety_triggered": false,
                    "fallback_used": true,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_personality_rules, builtin_safety_rules, AgentConfig, TaskTemplate};
    use crate::config::Settings;

    fn agent() -> DuckStyleAgent {
        let config = AgentConfig {
            role: "治愈系小鸭子".to_string(),
            goal: "温暖回复".to_string(),
            backstory: "一只小鸭子".to_string(),
            provider: None,
            model: None,
            temperature: None,
            max_tokens: None,
            emotion_rules: None,
            personality: Some(builtin_personality_rules()),
            safety: Some(builtin_safety_rules()),
        };
        let template = TaskTemplate {
            description: "{user_message} / {emotion_context}".to_string(),
            expected_output: "回复".to_string(),
            agent: "duck_style_agent".to_string(),
        };
        DuckStyleAgent::new(
            "duck_style_agent",
            &config,
            template,
            Arc::new(LlmGateway::new(Settings::default())),
        )
        .unwrap()
    }

    #[test]
    fn crisis_patterns_win_over_medical_ones() {
        let agent = agent();
        let (reason, _) = agent.screen("我不想活了，是不是得了抑郁症").unwrap();
        assert_eq!(reason, "crisis");
        let (reason, _) = agent.screen("我是不是得了抑郁症").unwrap();
        assert_eq!(reason, "medical");
        assert!(agent.screen("今天天气不错").is_none());
    }

    #[test]
    fn enhance_adds_duck_reference_and_ending() {
        let agent = agent();
        let view = EmotionView {
            sentiment: Sentiment::Neutral,
            primary_emotions: vec![],
        };
        let styled = agent.enhance("我在听你说", &view, None);
        assert!(styled.contains("鸭鸭"));
        assert!(agent.personality.endings.iter().any(|e| styled.contains(e.as_str())));
    }

    #[test]
    fn enhance_prepends_empathy_for_negative_sentiment() {
        let agent = agent();
        let view = EmotionView {
            sentiment: Sentiment::Negative,
            primary_emotions: vec!["悲伤".to_string()],
        };
        let styled = agent.enhance("慢慢来，不着急", &view, None);
        assert!(agent.personality.empathy_phrases.iter().any(|p| styled.contains(p.trim_end_matches('，'))));
        assert!(agent.personality.comfort_phrases.iter().any(|p| styled.contains(p.as_str())));
    }

    #[test]
    fn cleanup_strips_analytical_phrases_and_fixes_punctuation() {
        let agent = agent();
        let cleaned = agent.cleanup("从心理学角度来看，，。你做得很好");
        assert!(!cleaned.contains("从心理学角度"));
        assert!(!cleaned.contains("，，"));
        assert!(cleaned.ends_with('。'));
    }

    #[test]
    fn brief_style_keeps_first_and_last_sentence() {
        let agent = agent();
        let view = EmotionView {
            sentiment: Sentiment::Neutral,
            primary_emotions: vec![],
        };
        let styled = agent.enhance("鸭鸭第一句。鸭鸭第二句。鸭鸭第三句。", &view, Some("brief"));
        assert!(styled.contains("第一句"));
        assert!(styled.contains("第三句"));
        assert!(!styled.contains("第二句"));
    }
}
