use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::parser::country::CountryStrategy;
use crate::parser::occupation::{ClassifierInput, ClassifierVariant};

pub const DEFAULT_INPUT: &str = "Trivia Draft - Wikipedia_Full_20240414.tsv";
pub const DEFAULT_OUTPUT: &str = "updated_dataset.tsv";
pub const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org";

/// Run settings: defaults, then `bio_enricher.toml`, then `ENRICH_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub input: String,
    pub output: String,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub country_strategy: CountryStrategy,
    pub classifier_input: ClassifierInput,
    pub variant: ClassifierVariant,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("input", DEFAULT_INPUT)?
            .set_default("output", DEFAULT_OUTPUT)?
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default(
                "user_agent",
                concat!("bio_enricher/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("timeout_secs", 30)?
            .set_default("concurrency", 4)?
            .set_default("country_strategy", "infobox-row")?
            .set_default("classifier_input", "summary")?
            .set_default("variant", "two-tier")?
            .add_source(File::with_name("bio_enricher").required(false))
            .add_source(Environment::with_prefix("ENRICH"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
