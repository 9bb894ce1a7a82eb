//! Aggregate system health.

use crate::agent::AgentHealth;
use crate::client_wrapper::Provider;
use crate::gateway::{LlmGateway, ProviderHealth};
use crate::registry::AgentRegistry;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub agents: HashMap<String, AgentHealth>,
    pub providers: HashMap<Provider, ProviderHealth>,
    pub checked_at: DateTime<Utc>,
}

/// Probe every agent and provider in parallel and fold the agent readings
/// into one status: healthy only when every agent is, degraded when some
/// are, unhealthy when none are.  Provider results are reported alongside
/// but do not shift the overall status on their own — an agent that depends
/// on a dead provider shows up as unhealthy itself.
pub async fn check_system(registry: &AgentRegistry, gateway: &LlmGateway) -> SystemHealth {
    let agent_probes = registry.iter().map(|agent| agent.health_check());
    let (agent_results, providers) = tokio::join!(join_all(agent_probes), gateway.check_all());

    let agents: HashMap<String, AgentHealth> = agent_results
        .into_iter()
        .map(|health| (health.agent_name.clone(), health))
        .collect();

    let healthy = agents.values().filter(|h| h.healthy).count();
    let status = if agents.is_empty() || healthy == 0 {
        HealthStatus::Unhealthy
    } else if healthy == agents.len() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    SystemHealth {
        status,
        agents,
        providers,
        checked_at: Utc::now(),
    }
}
