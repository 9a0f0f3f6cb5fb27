// src/config.rs

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::error::{Error, Result};
use crate::process::EntryPolicy;

/// Beijing-Tianjin-Hebei prefecture-level cities.
pub const BTH_CITIES: [&str; 13] = [
    "Beijing",
    "Tianjin",
    "Shijiazhuang",
    "Tangshan",
    "Qinhuangdao",
    "Handan",
    "Xingtai",
    "Baoding",
    "Zhangjiakou",
    "Chengde",
    "Cangzhou",
    "Langfang",
    "Hengshui",
];

const CEADS_CITY_PAGE: &str = "https://www.ceads.net/data/city/";
/// Last dataset version known to exist. Does not track new releases.
const CEADS_FALLBACK_ZIP: &str = "https://www.ceads.net/data/CEADs_city_CO2_1997-2019_v2022.zip";

/// Everything the emissions pipeline needs, passed in at the entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmissionsConfig {
    pub index_url: String,
    pub fallback_url: String,
    /// Substring a dataset link must contain.
    pub link_marker: String,
    pub cities: Vec<String>,
    pub window_years: i32,
    pub entry_policy: EntryPolicy,
    pub output: PathBuf,
    pub index_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for EmissionsConfig {
    fn default() -> Self {
        Self {
            index_url: CEADS_CITY_PAGE.to_string(),
            fallback_url: CEADS_FALLBACK_ZIP.to_string(),
            link_marker: "city_CO2".to_string(),
            cities: BTH_CITIES.iter().map(|c| c.to_string()).collect(),
            window_years: 10,
            entry_policy: EntryPolicy::default(),
            output: PathBuf::from("bth_emissions_last_decade.csv"),
            index_timeout_secs: 30,
            download_timeout_secs: 300,
        }
    }
}

impl EmissionsConfig {
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(Error::Config("city list is empty".into()));
        }
        if self.window_years < 0 {
            return Err(Error::Config(format!(
                "window_years must be non-negative, got {}",
                self.window_years
            )));
        }
        for (field, value) in [("index_url", &self.index_url), ("fallback_url", &self.fallback_url)] {
            url::Url::parse(value)
                .map_err(|e| Error::Config(format!("{field} `{value}`: {e}")))?;
        }
        Ok(())
    }
}

/// A statistics-bureau region code and its display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCode {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GdpConfig {
    pub api_url: String,
    pub cities: Vec<CityCode>,
    pub years: Vec<i32>,
    pub indicator: String,
    pub db_code: String,
    pub output: PathBuf,
    pub timeout_secs: u64,
    pub delay_ms: u64,
    pub user_agent: String,
}

impl Default for GdpConfig {
    fn default() -> Self {
        let cities = [("110000", "北京市"), ("310000", "上海市"), ("440100", "广州市")]
            .into_iter()
            .map(|(code, name)| CityCode {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect();
        Self {
            api_url: "https://data.stats.gov.cn/easyquery.htm".to_string(),
            cities,
            years: (2019..2024).collect(),
            indicator: "A020101".to_string(),
            db_code: "fsnd".to_string(),
            output: PathBuf::from("gdp_data.csv"),
            timeout_secs: 10,
            delay_ms: 500,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

impl GdpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&text)
        .map_err(|e| Error::Config(format!("parsing {}: {}", path.display(), e)))
}

/// Load from `path` if given, else the built-in defaults.
pub fn load_emissions(path: Option<&Path>) -> Result<EmissionsConfig> {
    let cfg = match path {
        Some(p) => read_yaml(p)?,
        None => EmissionsConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_gdp(path: Option<&Path>) -> Result<GdpConfig> {
    match path {
        Some(p) => read_yaml(p),
        None => Ok(GdpConfig::default()),
    }
}
