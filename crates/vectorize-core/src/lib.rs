//! Batch text embedding over interchangeable providers.
//!
//! Records (`{content, origin, ...}`) are loaded from JSON, embedded through
//! an [`embedding::EmbeddingProvider`] picked from the
//! [`registry::ProviderRegistry`], and written back out with an `embedding`
//! field. [`dispatch::process`] decides between one call for everything and
//! fixed-size chunks based on the provider's [`embedding::ModelInfo`].

pub mod config;
pub mod dispatch;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod registry;
