use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use lumina_gateway::{GatewayConfig, ProviderType, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, GEMINI_API_BASE};
use lumina_schema::default_style;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "lumina.yaml";

fn default_provider() -> ProviderType {
    ProviderType::Gemini
}

fn default_api_key() -> Option<String> {
    Some("${GEMINI_API_KEY}".to_string())
}

fn default_api_base() -> String {
    GEMINI_API_BASE.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_style_label() -> String {
    default_style().label.to_string()
}

fn default_copy_feedback_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: default_api_key(),
            api_base: default_api_base(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioSettings {
    #[serde(default = "default_style_label")]
    pub default_style: String,
    #[serde(default = "default_copy_feedback_ms")]
    pub copy_feedback_ms: u64,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            default_style: default_style_label(),
            copy_feedback_ms: default_copy_feedback_ms(),
        }
    }
}

impl StudioSettings {
    pub fn copy_feedback_window(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LuminaConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub studio: StudioSettings,
}

impl LuminaConfig {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            provider: self.gateway.provider,
            api_key: self.gateway.api_key.clone().filter(|key| !key.is_empty()),
            api_base: self.gateway.api_base.clone(),
            text_model: self.gateway.text_model.clone(),
            image_model: self.gateway.image_model.clone(),
            timeout: Duration::from_secs(self.gateway.timeout_secs),
        }
    }
}

pub fn resolve_env_var(raw: &str) -> String {
    let mut output = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);

        let candidate = &rest[start + 2..];
        let Some(end) = candidate.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        let key = &candidate[..end];
        output.push_str(&std::env::var(key).unwrap_or_default());
        rest = &candidate[end + 1..];
    }

    output.push_str(rest);
    output
}

/// Reads `<dir>/lumina.yaml`, resolves `${VAR}` placeholders and validates.
pub fn load_config(dir: &Path) -> Result<LuminaConfig> {
    let mut config: LuminaConfig = read_yaml_file(&dir.join(CONFIG_FILE))?;
    resolve_config_env(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Reads `<dir>/lumina.yaml` when present, defaults otherwise. Placeholders
/// are resolved; the result is not validated.
pub fn read_config(dir: &Path) -> Result<LuminaConfig> {
    let path = dir.join(CONFIG_FILE);
    let mut config = if path.exists() {
        read_yaml_file(&path)?
    } else {
        tracing::debug!(dir = %dir.display(), "no config file, using defaults");
        LuminaConfig::default()
    };
    resolve_config_env(&mut config);
    Ok(config)
}

pub fn validate_config(config: &LuminaConfig) -> Result<()> {
    if config.gateway.provider == ProviderType::Gemini {
        let has_key = config
            .gateway
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            return Err(anyhow!(
                "gateway.api_key is empty; set GEMINI_API_KEY or use the stub provider"
            ));
        }
    }

    if config.gateway.timeout_secs == 0 {
        return Err(anyhow!("gateway.timeout_secs must be positive"));
    }

    if config.studio.default_style.trim().is_empty() {
        return Err(anyhow!("studio.default_style must not be empty"));
    }

    Ok(())
}

/// Writes the default config with the key left as a placeholder.
pub fn write_default_config(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create config dir: {}", dir.display()))?;
    let path = dir.join(CONFIG_FILE);
    let content = serde_yaml::to_string(&LuminaConfig::default())
        .context("failed to serialize default config")?;
    fs::write(&path, content)
        .with_context(|| format!("failed to write config file: {}", path.display()))
}

fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}

fn resolve_config_env(config: &mut LuminaConfig) {
    let gateway = &mut config.gateway;
    gateway.api_key = gateway.api_key.as_deref().map(resolve_env_var);
    gateway.api_base = resolve_env_var(&gateway.api_base);
    gateway.text_model = resolve_env_var(&gateway.text_model);
    gateway.image_model = resolve_env_var(&gateway.image_model);
    config.studio.default_style = resolve_env_var(&config.studio.default_style);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn fixture_config_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
    }

    #[test]
    fn load_config_from_workspace_fixture() {
        let config = load_config(&fixture_config_root()).unwrap();
        assert_eq!(config.gateway.provider, ProviderType::Stub);
        assert_eq!(config.gateway.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.gateway.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.studio.default_style, "Modern & Minimalist");
        assert_eq!(config.studio.copy_feedback_window(), Duration::from_secs(2));
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "gateway:\n  provider: stub\n  timeout_secs: 30\n",
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.gateway.timeout_secs, 30);
        assert_eq!(config.gateway.api_base, GEMINI_API_BASE);
        assert_eq!(config.studio.copy_feedback_ms, 2000);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("unrelated.yaml"), "x: 1").unwrap();

        let config = read_config(dir.path()).unwrap();
        assert_eq!(config.gateway.provider, ProviderType::Gemini);
        assert_eq!(config.gateway.api_base, GEMINI_API_BASE);
        assert_eq!(config.gateway.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.gateway.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.gateway.timeout_secs, 120);
        assert_eq!(config.studio.default_style, "Modern & Minimalist");
        assert_eq!(config.studio.copy_feedback_ms, 2000);
        let expected_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        assert_eq!(config.gateway.api_key.as_deref(), Some(expected_key.as_str()));
    }

    #[test]
    fn missing_file_with_stub_provider_validates() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = read_config(dir.path()).unwrap();
        config.gateway.provider = ProviderType::Stub;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn read_config_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "gateway:\n  api_key: \"\"\n").unwrap();

        let mut config = read_config(dir.path()).unwrap();
        assert_eq!(config.gateway.api_key.as_deref(), Some(""));
        assert!(validate_config(&config).is_err());

        config.gateway.provider = ProviderType::Stub;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn validate_rejects_gemini_without_key() {
        let mut config = LuminaConfig::default();
        config.gateway.api_key = Some("   ".into());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("api_key"));

        config.gateway.provider = ProviderType::Stub;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn validate_rejects_zero_timeout_and_blank_style() {
        let mut config = LuminaConfig::default();
        config.gateway.provider = ProviderType::Stub;
        config.gateway.timeout_secs = 0;
        assert!(validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("timeout_secs"));

        config.gateway.timeout_secs = 10;
        config.studio.default_style = " ".into();
        assert!(validate_config(&config)
            .unwrap_err()
            .to_string()
            .contains("default_style"));
    }

    #[test]
    fn gateway_config_maps_settings() {
        let mut config = LuminaConfig::default();
        config.gateway.api_key = Some("secret".into());
        config.gateway.timeout_secs = 45;
        let gateway = config.gateway_config();
        assert_eq!(gateway.api_key.as_deref(), Some("secret"));
        assert_eq!(gateway.timeout, Duration::from_secs(45));
        assert_eq!(gateway.provider, ProviderType::Gemini);

        config.gateway.api_key = Some(String::new());
        assert!(config.gateway_config().api_key.is_none());
    }

    #[test]
    fn written_default_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        write_default_config(dir.path()).unwrap();
        let content = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(content.contains("${GEMINI_API_KEY}"));

        let mut parsed: LuminaConfig = serde_yaml::from_str(&content).unwrap();
        parsed.gateway.provider = ProviderType::Stub;
        assert!(validate_config(&parsed).is_ok());
    }

    #[test]
    fn resolve_env_var_replaces_env_placeholder() {
        let expected = std::env::var("PATH").unwrap();
        assert_eq!(resolve_env_var("${PATH}"), expected);
    }

    #[test]
    fn resolve_env_var_returns_raw_when_not_placeholder() {
        assert_eq!(resolve_env_var("plain-value"), "plain-value");
    }

    #[test]
    fn resolve_env_var_keeps_unterminated_placeholder() {
        assert_eq!(resolve_env_var("key=${OPEN"), "key=${OPEN");
    }
}
