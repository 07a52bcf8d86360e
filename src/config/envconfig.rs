use std::{collections::HashMap, path::Path};

use ::config as config_rs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Environment-backed configuration: `APP_<SECTION>__<KEY>` maps onto
/// `section.key` of the implementing struct.
pub trait EnvConfig: Sized + DeserializeOwned {
    const PREFIX: &'static str = "APP";
    const SEPARATOR: &'static str = "__";

    fn load_dotenv() {
        // crate root first, then the working directory
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        let _ = dotenvy::from_filename(manifest_dir.join(".env")).or_else(|_| dotenvy::dotenv());
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn from_env() -> Result<Self> {
        Self::load_dotenv();
        Self::from_source(None)
    }

    /// Reads from `vars` instead of the process environment. Keys keep the
    /// `APP_` prefix.
    fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::from_source(Some(vars))
    }

    fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = config_rs::Environment::with_prefix(Self::PREFIX)
            .prefix_separator("_")
            .separator(Self::SEPARATOR)
            .try_parsing(true)
            .source(vars);

        let settings = config_rs::Config::builder()
            .add_source(environment)
            .build()
            .context("failed to read environment variables for config")?;

        let cfg = settings
            .try_deserialize::<Self>()
            .context("failed to deserialize environment into config")?;

        cfg.validate()?;
        Ok(cfg)
    }
}
