use std::sync::Arc;

use anyhow::{bail, Context};
use media_provider::MediaGateway;
use media_provider_gemini::{GeminiGateway, GeminiGatewayConfig, GEMINI_PROVIDER_ID};
use media_provider_mock::{MockGateway, MOCK_PROVIDER_ID};

use crate::config::{EnvConfig, GeminiFileConfig, API_KEY_ENV_VAR};

pub const DEFAULT_PROVIDER_ID: &str = GEMINI_PROVIDER_ID;

pub fn gateway_from_env(env: &EnvConfig) -> anyhow::Result<Arc<dyn MediaGateway>> {
    gateway_for_id(
        env.provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID),
        env,
    )
}

pub fn gateway_for_id(provider_id: &str, env: &EnvConfig) -> anyhow::Result<Arc<dyn MediaGateway>> {
    match provider_id {
        GEMINI_PROVIDER_ID => Ok(Arc::new(gemini_gateway(env)?)),
        MOCK_PROVIDER_ID => Ok(Arc::new(MockGateway::default())),
        unknown => bail!(
            "Unsupported provider '{unknown}'. Available providers: {GEMINI_PROVIDER_ID}, {MOCK_PROVIDER_ID}"
        ),
    }
}

fn gemini_gateway(env: &EnvConfig) -> anyhow::Result<GeminiGateway> {
    let mut config = GeminiGatewayConfig::new(env.api_key.clone());
    if let Some(path) = env.gemini_config_path.as_deref() {
        config = GeminiFileConfig::load(path)?.apply(config);
        tracing::debug!(path = %path.display(), "applied gemini config file");
    }

    let gateway = GeminiGateway::new(config).context("initializing gemini gateway")?;
    if !gateway.is_authenticated() {
        tracing::warn!("{API_KEY_ENV_VAR} is not set; generation requests will fail until it is");
    }
    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn gateway_for_id_supports_mock() {
        let gateway = gateway_for_id("mock", &EnvConfig::default()).expect("mock gateway");
        assert_eq!(gateway.profile().provider_id, "mock");
    }

    #[test]
    fn gemini_without_a_key_starts_unauthenticated() {
        let gateway = gateway_for_id("gemini", &EnvConfig::default()).expect("gemini gateway");
        let profile = gateway.profile();

        assert_eq!(profile.provider_id, "gemini");
        assert!(!profile.authenticated);
    }

    #[test]
    fn gemini_applies_the_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"image_model": "custom-image"}}"#).expect("write config");
        let env = EnvConfig {
            api_key: Some("key".to_string()),
            gemini_config_path: Some(file.path().to_path_buf()),
            ..EnvConfig::default()
        };

        let profile = gateway_for_id("gemini", &env).expect("gemini gateway").profile();
        assert_eq!(profile.image_model, "custom-image");
        assert!(profile.authenticated);
    }

    #[test]
    fn gateway_for_id_rejects_unknown_provider() {
        let error = match gateway_for_id("custom", &EnvConfig::default()) {
            Ok(_) => panic!("unknown providers should fail"),
            Err(error) => error,
        };

        assert!(error.to_string().contains("Unsupported provider 'custom'"));
    }
}
