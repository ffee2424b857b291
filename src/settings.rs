use std::path::PathBuf;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::scraper::{DriverSource, Pacing};

/// Run settings: struct defaults, then `brreg.toml` if present, then `BRREG_*` variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub registry_url: String,
    pub output_dir: PathBuf,
    pub table_file: String,
    pub error_file: String,
    pub log_file: PathBuf,
    pub db_path: PathBuf,
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub exclude: Vec<String>,
    pub include_country_code: bool,
    pub use_local_browser: bool,
    pub local_browser_path: PathBuf,
    pub headless: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: "https://www.brreg.no/".into(),
            output_dir: "output".into(),
            table_file: "scraped_data.csv".into(),
            error_file: "error_log.json".into(),
            log_file: "scrape-log.log".into(),
            db_path: "data/brreg.sqlite".into(),
            min_delay_secs: 0,
            max_delay_secs: 3,
            exclude: Vec::new(),
            include_country_code: false,
            use_local_browser: false,
            local_browser_path: "webdrivers/chrome".into(),
            headless: true,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name("brreg").required(false))
            .add_source(
                Environment::with_prefix("BRREG")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("exclude"),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_delay_secs > self.max_delay_secs {
            bail!(
                "min_delay_secs ({}) exceeds max_delay_secs ({})",
                self.min_delay_secs,
                self.max_delay_secs
            );
        }
        if self.registry_url.is_empty() {
            bail!("registry_url is empty");
        }
        Ok(())
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            min_secs: self.min_delay_secs,
            max_secs: self.max_delay_secs,
        }
    }

    pub fn driver(&self) -> DriverSource {
        if self.use_local_browser {
            DriverSource::Local(self.local_browser_path.clone())
        } else {
            DriverSource::Managed
        }
    }

    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(&self.table_file)
    }

    pub fn error_path(&self) -> PathBuf {
        self.output_dir.join(&self.error_file)
    }
}
