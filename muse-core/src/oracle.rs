//! The text-synthesis oracle seam.
//!
//! Every generation step in the engine goes through the [`Oracle`] trait:
//! a system instruction plus a user prompt in, free text out. The trait
//! exists so curators, the memory store, and the writer pipeline can be
//! exercised with scripted responses in tests; production wires in
//! [`ClaudeOracle`]. Callers must treat the returned text as untrusted
//! prose - the bounded-store clamp sits between the oracle and any
//! invariant-bearing state.

use crate::error::{OracleError, OracleResult};
use async_trait::async_trait;
use claude::{Claude, Message, Request};

/// A single oracle invocation.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// System instruction framing the oracle's role.
    pub system: String,

    /// The user prompt.
    pub prompt: String,

    /// Sampling temperature for this call.
    pub temperature: f32,

    /// Maximum tokens the oracle may generate.
    pub max_tokens: usize,
}

impl OracleRequest {
    /// Create a request with default temperature and token cap.
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// External text-synthesis capability.
///
/// Synchronous from the caller's point of view: each invocation blocks
/// its pipeline stage or curator cycle until the oracle answers or fails.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Invoke the oracle and return its raw text response.
    async fn invoke(&self, request: OracleRequest) -> OracleResult<String>;
}

/// Oracle implementation backed by the Claude Messages API.
pub struct ClaudeOracle {
    client: Claude,
    model: Option<String>,
}

impl ClaudeOracle {
    /// Create an oracle over an existing client.
    pub fn new(client: Claude) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Create an oracle from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> OracleResult<Self> {
        Ok(Self::new(Claude::from_env()?))
    }

    /// Override the model for all invocations.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait]
impl Oracle for ClaudeOracle {
    async fn invoke(&self, request: OracleRequest) -> OracleResult<String> {
        let mut api_request = Request::new(vec![Message::user(request.prompt)])
            .with_system(request.system)
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);

        if let Some(ref model) = self.model {
            api_request = api_request.with_model(model);
        }

        let response = self.client.complete(api_request).await?;

        if response.text.trim().is_empty() {
            return Err(OracleError::Empty);
        }

        Ok(response.text)
    }
}
