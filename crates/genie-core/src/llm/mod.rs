//! Inference providers and the resilient client that chains them.
//!
//! Provides a provider abstraction over the hosted LLM backends (Gemini,
//! Groq, Grok) and a client that tries them in priority order, retrying
//! rate-limited providers with backoff before falling back.

pub(crate) mod client;
pub(crate) mod gemini;
pub(crate) mod grok;
pub(crate) mod groq;
pub mod json;
pub(crate) mod openai_compat;
pub(crate) mod provider;
pub mod retry;

pub use client::{Completion, Content, ResilientInferenceClient};
pub use provider::{
    resolve_env_var, ImageInput, InferenceProvider, InferenceRequest, InferenceResponse,
    ProviderFactory,
};
pub use retry::RetryPolicy;
