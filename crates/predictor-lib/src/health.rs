//! Health of the bot's two moving parts: the model registry loaded at
//! startup and the chat transport it answers on.

use crate::predictor::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still answering chat, with something missing
    Degraded,
    Unhealthy,
}

/// Tracked parts of the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    ModelRegistry,
    ChatTransport,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::ModelRegistry => write!(f, "model_registry"),
            Component::ChatTransport => write!(f, "chat_transport"),
        }
    }
}

/// One component's last reported health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }

    /// Health of a loaded model registry
    ///
    /// Unhealthy without the preprocessor, degraded when any other
    /// configured entry failed to load or no classifier is available.
    pub fn for_registry(registry: &ModelRegistry) -> Self {
        if !registry.has_preprocessor() {
            return Self::unhealthy(format!(
                "Preprocessor '{}' not loaded",
                registry.preprocessor_name()
            ));
        }

        if registry.classifier_names().is_empty() {
            return Self::degraded("No classifiers loaded");
        }

        let failed: Vec<&str> = registry.failures().map(|r| r.name.as_str()).collect();
        if failed.is_empty() {
            Self::healthy()
        } else {
            Self::degraded(format!("Models failed to load: {}", failed.join(", ")))
        }
    }
}

/// Body of `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<Component, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components
    pub fn compute_status(components: &BTreeMap<Component, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|health| health.status)
            .max_by_key(|status| match status {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shared health state, written by startup and the chat loop, read by the API
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<BTreeMap<Component, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    /// Both components start unhealthy until startup reports on them
    pub fn new() -> Self {
        let components = BTreeMap::from([
            (
                Component::ModelRegistry,
                ComponentHealth::unhealthy("Models not loaded yet"),
            ),
            (
                Component::ChatTransport,
                ComponentHealth::unhealthy("Chat transport not connected"),
            ),
        ]);
        Self {
            components: Arc::new(RwLock::new(components)),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn update(&self, component: Component, health: ComponentHealth) {
        self.components.write().await.insert(component, health);
    }

    /// Record the outcome of loading the model registry
    pub async fn record_registry(&self, registry: &ModelRegistry) {
        self.update(Component::ModelRegistry, ComponentHealth::for_registry(registry))
            .await;
    }

    pub async fn transport_connected(&self) {
        self.update(Component::ChatTransport, ComponentHealth::healthy())
            .await;
    }

    pub async fn transport_closed(&self) {
        self.update(
            Component::ChatTransport,
            ComponentHealth::unhealthy("Chat transport closed"),
        )
        .await;
    }

    pub async fn transport_failed(&self, error: &dyn fmt::Display) {
        self.update(
            Component::ChatTransport,
            ComponentHealth::unhealthy(format!("Chat transport failed: {}", error)),
        )
        .await;
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once startup finished and no component is unhealthy
    ///
    /// The reason names the first unhealthy component and its message.
    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse {
                ready: false,
                reason: Some("Bot not yet initialized".to_string()),
            };
        }

        let components = self.components.read().await;
        let unhealthy = components
            .iter()
            .find(|(_, health)| health.status == ComponentStatus::Unhealthy);

        match unhealthy {
            Some((component, health)) => ReadinessResponse {
                ready: false,
                reason: Some(match &health.message {
                    Some(message) => format!("{}: {}", component, message),
                    None => component.to_string(),
                }),
            },
            None => ReadinessResponse {
                ready: true,
                reason: None,
            },
        }
    }
}
