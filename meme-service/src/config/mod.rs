use crate::services::providers::openai::OpenAiConfig;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default timeout for a single gateway round trip.
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 60;

/// Default upload limit (25MB): ten base64 images plus JSON overhead.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct MemeConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub openai: OpenAiSettings,
    pub models: ModelConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model for text-to-image generation (e.g., dall-e-3)
    pub image_model: String,
    pub image_size: String,
    /// Model for image variations (e.g., dall-e-2)
    pub variation_model: String,
    pub variation_size: String,
    /// Vision model for tags and descriptions (e.g., gpt-4o-mini)
    pub vision_model: String,
    /// Text model for sentiment (e.g., gpt-4o-mini)
    pub text_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub gateway_timeout_secs: u64,
    /// Side of the square images are resized to before analysis or variation.
    pub normalize_size: u32,
    pub default_num_tags: usize,
    pub max_num_tags: usize,
    pub default_content_length: usize,
    pub max_content_length: usize,
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            gateway_timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
            normalize_size: 512,
            default_num_tags: 10,
            max_num_tags: 50,
            default_content_length: 200,
            max_content_length: 500,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl LimitsConfig {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }
}

impl MemeConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = LimitsConfig::default();

        Ok(MemeConfig {
            common: common_config,
            openai: OpenAiSettings {
                api_key: Secret::new(get_env("OPENAI_API_KEY", None, is_prod)?),
                base_url: get_env("OPENAI_BASE_URL", Some("https://api.openai.com/v1"), is_prod)?,
            },
            models: ModelConfig {
                image_model: get_env("MEME_IMAGE_MODEL", Some("dall-e-3"), is_prod)?,
                image_size: get_env("MEME_IMAGE_SIZE", Some("1024x1024"), is_prod)?,
                variation_model: get_env("MEME_VARIATION_MODEL", Some("dall-e-2"), is_prod)?,
                variation_size: get_env("MEME_VARIATION_SIZE", Some("1024x1024"), is_prod)?,
                vision_model: get_env("MEME_VISION_MODEL", Some("gpt-4o-mini"), is_prod)?,
                text_model: get_env("MEME_TEXT_MODEL", Some("gpt-4o-mini"), is_prod)?,
            },
            limits: LimitsConfig {
                gateway_timeout_secs: get_parsed(
                    "MEME_GATEWAY_TIMEOUT_SECS",
                    defaults.gateway_timeout_secs,
                )?,
                normalize_size: get_parsed("MEME_NORMALIZE_SIZE", defaults.normalize_size)?,
                default_num_tags: get_parsed("MEME_DEFAULT_NUM_TAGS", defaults.default_num_tags)?,
                max_num_tags: get_parsed("MEME_MAX_NUM_TAGS", defaults.max_num_tags)?,
                default_content_length: get_parsed(
                    "MEME_DEFAULT_CONTENT_LENGTH",
                    defaults.default_content_length,
                )?,
                max_content_length: get_parsed(
                    "MEME_MAX_CONTENT_LENGTH",
                    defaults.max_content_length,
                )?,
                max_upload_bytes: get_parsed("MEME_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            },
        })
    }

    /// Gateway settings for the OpenAI backend.
    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.openai.api_key.clone(),
            base_url: self.openai.base_url.clone(),
            image_model: self.models.image_model.clone(),
            image_size: self.models.image_size.clone(),
            variation_model: self.models.variation_model.clone(),
            variation_size: self.models.variation_size.clone(),
            vision_model: self.models.vision_model.clone(),
            text_model: self.models.text_model.clone(),
            request_timeout: self.limits.gateway_timeout(),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Numeric setting with a default; a present but unparseable value is an error.
fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_falls_back_to_default_outside_prod() {
        let value = get_env("MEME_TEST_UNSET_WITH_DEFAULT", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_keys_without_default() {
        let err = get_env("MEME_TEST_UNSET_REQUIRED", None, false).unwrap_err();
        assert!(err.to_string().contains("MEME_TEST_UNSET_REQUIRED"));

        let err = get_env("MEME_TEST_UNSET_REQUIRED", Some("ignored"), true).unwrap_err();
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn get_parsed_rejects_garbage() {
        std::env::set_var("MEME_TEST_PARSED_GARBAGE", "ten");
        assert!(get_parsed::<usize>("MEME_TEST_PARSED_GARBAGE", 10).is_err());
        std::env::remove_var("MEME_TEST_PARSED_GARBAGE");
    }

    #[test]
    fn get_parsed_uses_default_when_unset() {
        assert_eq!(get_parsed::<u64>("MEME_TEST_PARSED_UNSET", 60).unwrap(), 60);
    }

    #[test]
    fn default_limits_match_batch_contract() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.normalize_size, 512);
        assert_eq!(limits.default_num_tags, 10);
        assert!(limits.max_num_tags >= limits.default_num_tags);
        assert_eq!(limits.gateway_timeout(), Duration::from_secs(60));
    }
}
