use hub_core::config as core_config;
use hub_core::error::AppError;
use serde::Deserialize;

pub const SERVICE_NAME: &str = "project_3";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Project3Config {
    #[serde(flatten)]
    pub common: core_config::Config,
}

impl Project3Config {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Ok(Project3Config { common })
    }

    pub fn service_name(&self) -> &str {
        self.common.observability.service_name_or(SERVICE_NAME)
    }
}
