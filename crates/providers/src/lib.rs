//! Model provider implementations for Notewright.
//!
//! All providers implement the `notewright_core::Provider` trait.

pub mod gemini;

pub use gemini::GeminiProvider;

use std::sync::Arc;
use notewright_config::AppConfig;
use notewright_core::error::ProviderError;
use notewright_core::provider::Provider;

/// Build the configured provider.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "No API key configured. Set NOTEWRIGHT_API_KEY or run `notewright onboard`.".into(),
        )
    })?;
    let provider = GeminiProvider::new(
        &config.provider.api_url,
        &config.provider.upload_url,
        api_key,
        &config.default_model,
        config.provider.timeout_secs,
    )?;
    Ok(Arc::new(provider))
}
