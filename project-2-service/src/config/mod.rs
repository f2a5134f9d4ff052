use hub_core::config as core_config;
use hub_core::error::AppError;
use serde::Deserialize;
use std::env;

pub const SERVICE_NAME: &str = "project_2_rag";

const DEFAULT_GPU_TYPE: &str = "NVIDIA L4";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project2Config {
    #[serde(flatten)]
    pub common: core_config::Config,
    /// Read from `GPU_ENABLED` / `GPU_TYPE` only.
    #[serde(skip)]
    pub gpu: GpuConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpuConfig {
    pub enabled: bool,
    pub gpu_type: String,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gpu_type: DEFAULT_GPU_TYPE.to_string(),
        }
    }
}

impl GpuConfig {
    /// Build from `GPU_ENABLED` and `GPU_TYPE`; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut gpu = GpuConfig::default();

        if let Some(val) = lookup("GPU_ENABLED") {
            gpu.enabled = val.trim().parse::<bool>().map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!("Invalid GPU_ENABLED value: {}", val))
            })?;
        }
        if let Some(val) = lookup("GPU_TYPE").filter(|v| !v.trim().is_empty()) {
            gpu.gpu_type = val;
        }

        Ok(gpu)
    }
}

impl Project2Config {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        let gpu = GpuConfig::from_lookup(|key| env::var(key).ok())?;

        Ok(Project2Config { common, gpu })
    }

    pub fn service_name(&self) -> &str {
        self.common.observability.service_name_or(SERVICE_NAME)
    }
}
