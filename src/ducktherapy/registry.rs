//! Agent registry: an immutable snapshot of the wired-up agents.
//!
//! The workflow engine holds the current snapshot behind an `Arc` and swaps
//! it atomically on reload, so in-flight workflows keep the set they started
//! with and a failed reload leaves the previous snapshot serving.

use crate::agent::TherapyAgent;
use crate::agents::{ContentRecallAgent, DuckStyleAgent, ListenerAgent, TherapyTipsAgent};
use crate::config::{
    ConfigError, ConfigStore, CONTENT_RECALL_AGENT, CONTENT_RECOMMENDATION_TASK, DUCK_STYLE_AGENT,
    DUCK_STYLE_TASK, EMOTION_ANALYSIS_TASK, LISTENER_AGENT, THERAPY_SUGGESTION_TASK,
    THERAPY_TIPS_AGENT,
};
use crate::gateway::LlmGateway;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn TherapyAgent>>,
}

impl AgentRegistry {
    pub fn empty() -> Self {
        AgentRegistry::default()
    }

    /// Wire up the full agent set from a validated config store.
    pub fn from_config(config: &ConfigStore, gateway: &Arc<LlmGateway>) -> Result<Self, ConfigError> {
        let mut registry = AgentRegistry::empty();

        let listener_config = config.agent_config(LISTENER_AGENT)?;
        let rules = listener_config.emotion_rules.clone().ok_or_else(|| {
            ConfigError::Invalid(format!("{} has no emotion_rules block", LISTENER_AGENT))
        })?;
        registry.insert(Arc::new(ListenerAgent::new(
            LISTENER_AGENT,
            listener_config,
            config.task_template(EMOTION_ANALYSIS_TASK)?.clone(),
            rules,
            Arc::clone(gateway),
        )));

        registry.insert(Arc::new(DuckStyleAgent::new(
            DUCK_STYLE_AGENT,
            config.agent_config(DUCK_STYLE_AGENT)?,
            config.task_template(DUCK_STYLE_TASK)?.clone(),
            Arc::clone(gateway),
        )?));

        registry.insert(Arc::new(ContentRecallAgent::new(
            CONTENT_RECALL_AGENT,
            config.agent_config(CONTENT_RECALL_AGENT)?,
            config.task_template(CONTENT_RECOMMENDATION_TASK)?.clone(),
            Arc::clone(gateway),
        )));

        registry.insert(Arc::new(TherapyTipsAgent::new(
            THERAPY_TIPS_AGENT,
            config.agent_config(THERAPY_TIPS_AGENT)?,
            config.task_template(THERAPY_SUGGESTION_TASK)?.clone(),
            Arc::clone(gateway),
        )));

        info!("agent registry built: {}", registry.names().join(", "));
        Ok(registry)
    }

    /// Register an agent under its own name, replacing any previous one.
    pub fn insert(&mut self, agent: Arc<dyn TherapyAgent>) {
        self.agents.insert(agent.name().to_string(), agent);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn TherapyAgent>> {
        self.agents.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TherapyAgent>> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn builtin_config_builds_the_full_agent_set() {
        let config = ConfigStore::builtin(Settings::default());
        let gateway = Arc::new(LlmGateway::new(Settings::default()));
        let registry = AgentRegistry::from_config(&config, &gateway).unwrap();
        assert_eq!(registry.len(), 4);
        assert!(registry.get(LISTENER_AGENT).is_some());
        assert!(registry.get(DUCK_STYLE_AGENT).is_some());
    }
}
