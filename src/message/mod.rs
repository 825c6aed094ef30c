//! Greeting message generation.

mod generator;
mod prompt;
mod provider;
pub mod providers;

pub use generator::{MessageGenerator, DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL};
pub use prompt::{build_prompt, effective_wish, DEFAULT_WISH};
pub use provider::{ContentRequest, MessageModel};

#[cfg(test)]
pub(crate) use generator::tests as testing;
