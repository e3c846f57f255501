pub mod chat;

use crate::errors::CitationError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a text-generation model.
///
/// The citation service only needs a single completion per request, so the
/// interface is a system prompt plus a user prompt.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CitationError>;
}

dyn_clone::clone_trait_object!(AiProvider);
