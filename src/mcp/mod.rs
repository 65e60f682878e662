//! External tool providers.
//!
//! A provider is an opaque source of extra capabilities discovered at
//! connect time: list what you have, invoke one by name. Each listed tool
//! is wrapped as a regular registry entry that proxies execution back to
//! the provider. Provider errors are foreign and unstructured, so they
//! surface as error text for the model, not as typed failures.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::tools::{Tool, ToolError};

/// One tool as advertised by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// The surface the runtime needs from an external tool source.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Identifies the provider in logs and error text.
    fn server_name(&self) -> &str;

    async fn list_tools(&self) -> Vec<ProviderToolSpec>;

    async fn invoke(&self, tool: &str, input: Value) -> anyhow::Result<String>;
}

/// Adapter presenting one provider tool through the capability contract.
pub struct ProviderTool {
    provider: Arc<dyn ToolProvider>,
    spec: ProviderToolSpec,
}

impl ProviderTool {
    pub fn new(provider: Arc<dyn ToolProvider>, spec: ProviderToolSpec) -> Self {
        Self { provider, spec }
    }
}

#[async_trait]
impl Tool for ProviderTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn input_schema(&self) -> Value {
        self.spec.input_schema.clone()
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        match self.provider.invoke(&self.spec.name, input).await {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!(
                    server = self.provider.server_name(),
                    tool = %self.spec.name,
                    "provider invocation failed: {e}"
                );
                Ok(format!(
                    "Error from provider \"{}\": {e}",
                    self.provider.server_name()
                ))
            }
        }
    }
}
