use hub_core::config as core_config;
use hub_core::error::AppError;
use serde::Deserialize;

/// Name used to tag every log record and metric unless overridden by
/// `APP__OBSERVABILITY__SERVICE_NAME`.
pub const SERVICE_NAME: &str = "project_1";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project1Config {
    #[serde(flatten)]
    pub common: core_config::Config,
}

impl Project1Config {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;
        Ok(Project1Config { common })
    }

    pub fn service_name(&self) -> &str {
        self.common.observability.service_name_or(SERVICE_NAME)
    }
}
