//! Typed configuration for agents, task templates and workflows.
//!
//! Everything the agents consult at runtime — emotion vocabulary, persona
//! rules, safety patterns, prompt templates, workflow step lists — lives in a
//! [`ConfigStore`].  A store is either built from the in-code defaults
//! ([`ConfigStore::builtin`]) or loaded from `agents.yaml` + `tasks.yaml`
//! ([`ConfigStore::load`]).  Loading validates everything up front and fails
//! fast: there is no such thing as a partially-valid store, and lookups after
//! a successful load can only fail for names that were never configured.

use crate::client_wrapper::Provider;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

pub const LISTENER_AGENT: &str = "listener_agent";
pub const DUCK_STYLE_AGENT: &str = "duck_style_agent";
pub const CONTENT_RECALL_AGENT: &str = "content_recall_agent";
pub const THERAPY_TIPS_AGENT: &str = "therapy_tips_agent";

pub const EMOTION_ANALYSIS_TASK: &str = "emotion_analysis_task";
pub const DUCK_STYLE_TASK: &str = "duck_style_task";
pub const CONTENT_RECOMMENDATION_TASK: &str = "content_recommendation_task";
pub const THERAPY_SUGGESTION_TASK: &str = "therapy_suggestion_task";

pub const BASIC_CHAT_FLOW: &str = "basic_chat_flow";
pub const ENHANCED_CHAT_FLOW: &str = "enhanced_chat_flow";

/// Reply stored in the session ledger when the styling step produced nothing.
pub const DEFAULT_FALLBACK_REPLY: &str = "鸭鸭暂时无法回复，请稍后再试哦～";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Missing { kind: &'static str, name: String },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config I/O error: {}", err),
            ConfigError::Parse(err) => write!(f, "config parse error: {}", err),
            ConfigError::Missing { kind, name } => write!(f, "{} not configured: {}", kind, name),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Credentials and model selection for a hosted OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedProviderSettings {
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        OllamaSettings {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
        }
    }
}

/// Provider routing knobs for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub primary_provider: Provider,
    pub fallback_provider: Provider,
    pub enable_fallback: bool,
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub openai: Option<HostedProviderSettings>,
    #[serde(default)]
    pub anthropic: Option<HostedProviderSettings>,
    #[serde(default)]
    pub ollama: OllamaSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            primary_provider: Provider::OpenAi,
            fallback_provider: Provider::Ollama,
            enable_fallback: true,
            request_timeout_secs: 30,
            openai: None,
            anthropic: None,
            ollama: OllamaSettings::default(),
        }
    }
}

impl Settings {
    /// Build settings from the process environment.  Hosted providers are
    /// only configured when their API key variable is present.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            settings.openai = Some(HostedProviderSettings {
                api_key: key,
                model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                base_url: None,
            });
        }
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            settings.anthropic = Some(HostedProviderSettings {
                api_key: key,
                model: std::env::var("ANTHROPIC_MODEL")
                    .unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
                base_url: None,
            });
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            settings.ollama.base_url = url;
        }
        if let Ok(model) = std::env::var("OLLAMA_MODEL") {
            settings.ollama.model = model;
        }
        if let Ok(provider) = std::env::var("DUCK_PRIMARY_PROVIDER") {
            if let Ok(parsed) = provider.parse() {
                settings.primary_provider = parsed;
            }
        }
        if let Ok(provider) = std::env::var("DUCK_FALLBACK_PROVIDER") {
            if let Ok(parsed) = provider.parse() {
                settings.fallback_provider = parsed;
            }
        }
        settings
    }
}

/// Intensity scoring rules for the rule-based analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntensityRules {
    pub default: f32,
    /// Marks checked with `contains`; each present mark adds its boost once.
    pub punctuation_boosts: Vec<(String, f32)>,
    pub multiple_emotions_boost: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyRules {
    pub crisis_keywords: Vec<String>,
    pub high_urgency_keywords: Vec<String>,
    pub crisis_level: u8,
    pub high_level: u8,
    pub elevated_level: u8,
    pub baseline_level: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRules {
    pub confidence: f32,
    pub default_emotions: Vec<String>,
    pub default_topics: Vec<String>,
}

/// Vocabulary and scoring tables driving the rule-based emotion analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionRules {
    pub emotion_keywords: HashMap<String, Vec<String>>,
    pub positive_indicators: Vec<String>,
    pub negative_indicators: Vec<String>,
    pub intensity: IntensityRules,
    pub urgency: UrgencyRules,
    pub needs_mapping: HashMap<String, Vec<String>>,
    pub support_mapping: HashMap<String, String>,
    pub fallback: FallbackRules,
}

/// Persona rules for the duck styling agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityRules {
    pub tone: String,
    pub expression_style: String,
    /// Phrases that read like a clinical report; stripped from responses.
    pub analytical_phrases: Vec<String>,
    pub empathy_phrases: Vec<String>,
    pub comfort_phrases: Vec<String>,
    /// Warm closing phrases.  The first entry is used for longer replies,
    /// the last for short ones.
    pub endings: Vec<String>,
    /// Character count separating "short" from "long" replies.
    pub brief_threshold: usize,
    pub max_response_length: usize,
}

/// Crisis and medical screening rules.  Patterns are regular expressions
/// matched against the raw user message before any model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyRules {
    pub crisis_patterns: Vec<String>,
    pub medical_patterns: Vec<String>,
    pub crisis_response: String,
    pub medical_response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub emotion_rules: Option<EmotionRules>,
    #[serde(default)]
    pub personality: Option<PersonalityRules>,
    #[serde(default)]
    pub safety: Option<SafetyRules>,
}

/// A prompt template.  `description` carries `{placeholder}` slots filled at
/// dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub description: String,
    pub expected_output: String,
    pub agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub description: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AgentsFile {
    agents: HashMap<String, AgentConfig>,
}

#[derive(Debug, Deserialize)]
struct TasksFile {
    task_templates: HashMap<String, TaskTemplate>,
    workflows: HashMap<String, WorkflowConfig>,
}

/// Immutable, validated configuration snapshot.
pub struct ConfigStore {
    settings: Settings,
    agents: HashMap<String, AgentConfig>,
    task_templates: HashMap<String, TaskTemplate>,
    workflows: HashMap<String, WorkflowConfig>,
}

impl ConfigStore {
    /// Load `agents.yaml` and `tasks.yaml` from `dir` and validate the result.
    pub fn load(dir: &Path, settings: Settings) -> Result<Self, ConfigError> {
        let agents_raw = fs::read_to_string(dir.join("agents.yaml"))?;
        let tasks_raw = fs::read_to_string(dir.join("tasks.yaml"))?;
        let agents_file: AgentsFile = serde_yaml::from_str(&agents_raw)?;
        let tasks_file: TasksFile = serde_yaml::from_str(&tasks_raw)?;

        let store = ConfigStore {
            settings,
            agents: agents_file.agents,
            task_templates: tasks_file.task_templates,
            workflows: tasks_file.workflows,
        };
        store.validate()?;
        info!(
            "configuration loaded from {}: {} agents, {} task templates, {} workflows",
            dir.display(),
            store.agents.len(),
            store.task_templates.len(),
            store.workflows.len()
        );
        Ok(store)
    }

    /// The complete in-code default configuration.  Always valid.
    pub fn builtin(settings: Settings) -> Self {
        let store = ConfigStore {
            settings,
            agents: builtin_agents(),
            task_templates: builtin_task_templates(),
            workflows: builtin_workflows(),
        };
        debug_assert!(store.validate().is_ok());
        store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn agent_config(&self, name: &str) -> Result<&AgentConfig, ConfigError> {
        self.agents.get(name).ok_or(ConfigError::Missing {
            kind: "agent",
            name: name.to_string(),
        })
    }

    pub fn task_template(&self, name: &str) -> Result<&TaskTemplate, ConfigError> {
        self.task_templates.get(name).ok_or(ConfigError::Missing {
            kind: "task template",
            name: name.to_string(),
        })
    }

    pub fn workflow(&self, name: &str) -> Result<&WorkflowConfig, ConfigError> {
        self.workflows.get(name).ok_or(ConfigError::Missing {
            kind: "workflow",
            name: name.to_string(),
        })
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.keys().map(|k| k.as_str()).collect()
    }

    pub fn workflow_names(&self) -> Vec<&str> {
        self.workflows.keys().map(|k| k.as_str()).collect()
    }

    /// Structural and referential validation.  Called once at load time.
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, workflow) in &self.workflows {
            if workflow.steps.is_empty() {
                return Err(ConfigError::Invalid(format!("workflow {} has no steps", name)));
            }
            for step in &workflow.steps {
                if !self.task_templates.contains_key(step) {
                    return Err(ConfigError::Invalid(format!(
                        "workflow {} references unknown task template {}",
                        name, step
                    )));
                }
            }
        }

        for (name, template) in &self.task_templates {
            if !self.agents.contains_key(&template.agent) {
                return Err(ConfigError::Invalid(format!(
                    "task template {} references unknown agent {}",
                    name, template.agent
                )));
            }
            if template.description.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("task template {} has an empty description", name)));
            }
        }

        for (task, placeholder) in &[
            (EMOTION_ANALYSIS_TASK, "{user_message}"),
            (DUCK_STYLE_TASK, "{user_message}"),
        ] {
            if let Some(template) = self.task_templates.get(*task) {
                if !template.description.contains(placeholder) {
                    return Err(ConfigError::Invalid(format!(
                        "task template {} is missing the {} placeholder",
                        task, placeholder
                    )));
                }
            }
        }

        if let Some(listener) = self.agents.get(LISTENER_AGENT) {
            let rules = listener.emotion_rules.as_ref().ok_or_else(|| {
                ConfigError::Invalid(format!("{} has no emotion_rules block", LISTENER_AGENT))
            })?;
            if rules.emotion_keywords.is_empty() {
                return Err(ConfigError::Invalid("emotion keyword table is empty".to_string()));
            }
            if rules.intensity.max < rules.intensity.default {
                return Err(ConfigError::Invalid(
                    "intensity max must not be below the default".to_string(),
                ));
            }
        }

        if let Some(duck) = self.agents.get(DUCK_STYLE_AGENT) {
            let safety = duck.safety.as_ref().ok_or_else(|| {
                ConfigError::Invalid(format!("{} has no safety block", DUCK_STYLE_AGENT))
            })?;
            for pattern in safety.crisis_patterns.iter().chain(safety.medical_patterns.iter()) {
                regex::Regex::new(pattern).map_err(|err| {
                    ConfigError::Invalid(format!("bad safety pattern {:?}: {}", pattern, err))
                })?;
            }
            if duck.personality.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "{} has no personality block",
                    DUCK_STYLE_AGENT
                )));
            }
        }

        Ok(())
    }
}

pub fn builtin_emotion_rules() -> EmotionRules {
    let mut emotion_keywords = HashMap::new();
    emotion_keywords.insert(
        "开心".to_string(),
        vec!["开心", "高兴", "快乐", "愉快", "兴奋", "喜悦", "满足", "幸福"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    emotion_keywords.insert(
        "悲伤".to_string(),
        vec!["悲伤", "难过", "伤心", "痛苦", "失落", "沮丧", "想哭", "绝望"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    emotion_keywords.insert(
        "焦虑".to_string(),
        vec!["焦虑", "紧张", "担心", "不安", "害怕", "恐惧", "慌张", "压力"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    emotion_keywords.insert(
        "愤怒".to_string(),
        vec!["愤怒", "生气", "恼火", "烦躁", "气愤", "讨厌", "不爽"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    emotion_keywords.insert(
        "疲惫".to_string(),
        vec!["疲惫", "好累", "疲劳", "困", "无力", "倦怠"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    emotion_keywords.insert(
        "孤独".to_string(),
        vec!["孤独", "寂寞", "孤单", "没人理解", "一个人"]
            .into_iter()
            .map(String::from)
            .collect(),
    );

    let mut needs_mapping = HashMap::new();
    needs_mapping.insert("悲伤".to_string(), vec!["被安慰".to_string(), "被倾听".to_string()]);
    needs_mapping.insert("焦虑".to_string(), vec!["安全感".to_string(), "被支持".to_string()]);
    needs_mapping.insert("愤怒".to_string(), vec!["被理解".to_string(), "情绪宣泄".to_string()]);
    needs_mapping.insert("孤独".to_string(), vec!["陪伴".to_string(), "归属感".to_string()]);
    needs_mapping.insert("开心".to_string(), vec!["被分享".to_string(), "被认可".to_string()]);
    needs_mapping.insert("疲惫".to_string(), vec!["休息".to_string(), "被关心".to_string()]);

    let mut support_mapping = HashMap::new();
    support_mapping.insert("悲伤".to_string(), "安慰陪伴".to_string());
    support_mapping.insert("焦虑".to_string(), "安抚疏导".to_string());
    support_mapping.insert("愤怒".to_string(), "倾听理解".to_string());
    support_mapping.insert("孤独".to_string(), "温暖陪伴".to_string());
    support_mapping.insert("开心".to_string(), "分享喜悦".to_string());
    support_mapping.insert("疲惫".to_string(), "轻松安抚".to_string());

    EmotionRules {
        emotion_keywords,
        positive_indicators: vec![
            "开心", "高兴", "快乐", "满意", "喜欢", "棒", "好", "赞", "爱", "幸福", "哈哈",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        negative_indicators: vec![
            "难过", "悲伤", "痛苦", "讨厌", "烦", "累", "哭", "糟糕", "失望", "绝望", "压力", "焦虑",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        intensity: IntensityRules {
            default: 0.5,
            punctuation_boosts: vec![
                ("！！".to_string(), 0.15),
                ("！".to_string(), 0.1),
                ("……".to_string(), 0.05),
                ("？？".to_string(), 0.05),
            ],
            multiple_emotions_boost: 0.1,
            max: 1.0,
        },
        urgency: UrgencyRules {
            crisis_keywords: vec!["自杀", "不想活", "活不下去", "结束生命", "自残", "伤害自己", "轻生"]
                .into_iter()
                .map(String::from)
                .collect(),
            high_urgency_keywords: vec!["崩溃", "撑不住", "受不了", "救救我"]
                .into_iter()
                .map(String::from)
                .collect(),
            crisis_level: 5,
            high_level: 4,
            elevated_level: 3,
            baseline_level: 1,
        },
        needs_mapping,
        support_mapping,
        fallback: FallbackRules {
            confidence: 0.6,
            default_emotions: vec!["平静".to_string()],
            default_topics: vec!["日常分享".to_string()],
        },
    }
}

pub fn builtin_personality_rules() -> PersonalityRules {
    PersonalityRules {
        tone: "温暖、可爱、治愈".to_string(),
        expression_style: "第一人称小鸭子口吻，句子短，多用语气词".to_string(),
        analytical_phrases: vec![
            "从心理学角度",
            "根据分析",
            "数据显示",
            "建议你采取以下步骤",
            "综上所述",
            "经过评估",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        empathy_phrases: vec!["鸭鸭听到你的话了，", "鸭鸭能感受到你的心情，", "抱抱你，"]
            .into_iter()
            .map(String::from)
            .collect(),
        comfort_phrases: vec![
            "没关系的，一切都会慢慢好起来的",
            "鸭鸭会一直陪着你的",
            "你已经很努力了",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        endings: vec!["鸭鸭会一直在这里陪着你哦～", "有鸭鸭在呢～", "抱抱你～"]
            .into_iter()
            .map(String::from)
            .collect(),
        brief_threshold: 50,
        max_response_length: 200,
    }
}

pub fn builtin_safety_rules() -> SafetyRules {
    SafetyRules {
        crisis_patterns: vec![
            "自杀",
            "不想活",
            "活不下去",
            "结束.{0,4}生命",
            "自残",
            "伤害自己",
            "轻生",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        medical_patterns: vec![
            "抑郁症",
            "焦虑症",
            "双相",
            "精神分裂",
            "吃.{0,6}药",
            "要不要.{0,4}就医",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
        crisis_response: "鸭鸭很担心你现在的状态，你的感受非常重要。请一定要联系专业的心理援助：全国24小时心理援助热线 400-161-9995。鸭鸭会一直陪着你，你并不孤单。".to_string(),
        medical_response: "鸭鸭很关心你的健康，不过这类问题需要专业医生来解答哦。建议你咨询正规医院的心理科或精神科医生。鸭鸭会一直在这里陪伴你～".to_string(),
    }
}

fn builtin_agents() -> HashMap<String, AgentConfig> {
    let mut agents = HashMap::new();
    agents.insert(
        LISTENER_AGENT.to_string(),
        AgentConfig {
            role: "倾听者".to_string(),
            goal: "理解用户消息中的情绪状态，输出结构化的情绪分析".to_string(),
            backstory: "一位安静细致的倾听者，擅长从字里行间读出情绪的强度和需求".to_string(),
            provider: None,
            model: None,
            temperature: Some(0.3),
            max_tokens: Some(512),
            emotion_rules: Some(builtin_emotion_rules()),
            personality: None,
            safety: None,
        },
    );
    agents.insert(
        DUCK_STYLE_AGENT.to_string(),
        AgentConfig {
            role: "治愈系小鸭子".to_string(),
            goal: "把回复转换成温暖可爱的鸭鸭口吻，给用户陪伴感".to_string(),
            backstory: "一只住在暖黄色小窝里的治愈系小鸭子，说话软软的，从不讲大道理".to_string(),
            provider: None,
            model: None,
            temperature: Some(0.8),
            max_tokens: Some(512),
            emotion_rules: None,
            personality: Some(builtin_personality_rules()),
            safety: Some(builtin_safety_rules()),
        },
    );
    agents.insert(
        CONTENT_RECALL_AGENT.to_string(),
        AgentConfig {
            role: "内容推荐官".to_string(),
            goal: "根据用户当前情绪推荐能带来安慰或共鸣的内容".to_string(),
            backstory: "记得很多温暖的故事、歌单和散步路线的小助手".to_string(),
            provider: None,
            model: None,
            temperature: Some(0.7),
            max_tokens: Some(512),
            emotion_rules: None,
            personality: None,
            safety: None,
        },
    );
    agents.insert(
        THERAPY_TIPS_AGENT.to_string(),
        AgentConfig {
            role: "自助练习向导".to_string(),
            goal: "针对当前情绪强度给出轻量的自我调节练习".to_string(),
            backstory: "熟悉呼吸练习、书写练习等温和自助方法的向导".to_string(),
            provider: None,
            model: None,
            temperature: Some(0.5),
            max_tokens: Some(512),
            emotion_rules: None,
            personality: None,
            safety: None,
        },
    );
    agents
}

fn builtin_task_templates() -> HashMap<String, TaskTemplate> {
    let mut templates = HashMap::new();
    templates.insert(
        EMOTION_ANALYSIS_TASK.to_string(),
        TaskTemplate {
            description: "分析下面这条用户消息的情绪状态。\n\
                          用户消息：{user_message}\n\
                          上下文：{context}\n\
                          请只输出一个 JSON 对象，字段包括：\n\
                          sentiment（positive/negative/neutral）、intensity（0-1）、confidence（0-1）、\
                          primary_emotions、secondary_emotions、keywords、topics、\
                          psychological_needs、urgency_level（1-5）、support_type。"
                .to_string(),
            expected_output: "一个 JSON 格式的情绪分析对象".to_string(),
            agent: LISTENER_AGENT.to_string(),
        },
    );
    templates.insert(
        DUCK_STYLE_TASK.to_string(),
        TaskTemplate {
            description: "请以鸭鸭的口吻回复用户。\n\
                          用户消息：{user_message}\n\
                          情绪分析：{emotion_context}\n\
                          要求：温暖、具体、不说教，不使用任何分析报告式的语言。"
                .to_string(),
            expected_output: "一段温暖的鸭鸭口吻回复".to_string(),
            agent: DUCK_STYLE_AGENT.to_string(),
        },
    );
    templates.insert(
        CONTENT_RECOMMENDATION_TASK.to_string(),
        TaskTemplate {
            description: "用户当前的情绪分析如下：{emotion_summary}\n\
                          请推荐 2-3 条能带来安慰或共鸣的内容（文章、音乐、小活动），\
                          以 JSON 数组输出，每项包含 title 和 reason。"
                .to_string(),
            expected_output: "JSON 数组形式的内容推荐".to_string(),
            agent: CONTENT_RECALL_AGENT.to_string(),
        },
    );
    templates.insert(
        THERAPY_SUGGESTION_TASK.to_string(),
        TaskTemplate {
            description: "用户当前的主要情绪：{emotions}，紧急程度：{urgency_level}。\n\
                          请给出 1-2 个轻量的自我调节练习，以 JSON 数组输出，\
                          每项包含 title 和 steps。"
                .to_string(),
            expected_output: "JSON 数组形式的自助练习建议".to_string(),
            agent: THERAPY_TIPS_AGENT.to_string(),
        },
    );
    templates
}

fn builtin_workflows() -> HashMap<String, WorkflowConfig> {
    let mut workflows = HashMap::new();
    workflows.insert(
        BASIC_CHAT_FLOW.to_string(),
        WorkflowConfig {
            description: "情绪分析后直接生成鸭鸭回复".to_string(),
            steps: vec![EMOTION_ANALYSIS_TASK.to_string(), DUCK_STYLE_TASK.to_string()],
        },
    );
    workflows.insert(
        ENHANCED_CHAT_FLOW.to_string(),
        WorkflowConfig {
            description: "情绪分析后并行补充内容推荐与自助建议，再生成鸭鸭回复".to_string(),
            steps: vec![
                EMOTION_ANALYSIS_TASK.to_string(),
                CONTENT_RECOMMENDATION_TASK.to_string(),
                THERAPY_SUGGESTION_TASK.to_string(),
                DUCK_STYLE_TASK.to_string(),
            ],
        },
    );
    workflows
}
