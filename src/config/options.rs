// src/config/options.rs
use std::{error::Error, fs, path::{Path, PathBuf}, time::Duration};

use chrono::NaiveDate;
use serde::Deserialize;

use super::consts::*;

/// Everything a cycle needs to know. Every field is optional in the TOML file;
/// missing ones fall back to `consts`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppOptions {
    pub target: TargetOptions,
    pub session: SessionOptions,
    pub store: StoreOptions,
}

impl AppOptions {
    /// Load from a TOML file. A missing section or key keeps its default.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
        let opts: AppOptions = toml::from_str(&text)
            .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
        Ok(opts)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetOptions {
    pub base_url: String,
    pub area_id: u32,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            area_id: AREA_ID,
        }
    }
}

impl TargetOptions {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// JSON endpoint holding the area tree.
    pub fn api_url(&self) -> String {
        format!("{}{}{}", self.base(), API_PATH, self.area_id)
    }

    /// Human-facing page for `date`; doubles as the Referer of the API call.
    pub fn page_url(&self, date: NaiveDate) -> String {
        format!(
            "{}{}{}/day/{}",
            self.base(), PAGE_PATH, self.area_id, date.format(DATE_FORMAT)
        )
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionOptions {
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub browser: BrowserOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            user_agent: s!(USER_AGENT),
            fetch_timeout_secs: FETCH_TIMEOUT_SECS,
            browser: BrowserOptions::default(),
        }
    }
}

impl SessionOptions {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserOptions {
    /// Off means the fallback strategy always reports `SessionError::Disabled`.
    pub enabled: bool,
    /// Driver binary (chromedriver, geckodriver, ...). When unset an
    /// already-running driver on `port` is assumed.
    pub driver_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub browser_name: String,
    pub headless: bool,
    pub page_load_timeout_secs: u64,
    pub driver_start_timeout_secs: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            driver_path: None,
            host: s!(WEBDRIVER_HOST),
            port: WEBDRIVER_PORT,
            browser_name: s!(BROWSER_NAME),
            headless: true,
            page_load_timeout_secs: PAGE_LOAD_TIMEOUT_SECS,
            driver_start_timeout_secs: DRIVER_START_TIMEOUT_SECS,
        }
    }
}

impl BrowserOptions {
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
    pub fn driver_start_timeout(&self) -> Duration {
        Duration::from_secs(self.driver_start_timeout_secs)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreOptions {
    pub dir: PathBuf,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { dir: PathBuf::from(STORE_DIR) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let opts: AppOptions = toml::from_str(
            "[target]\narea_id = 12\n[session.browser]\nenabled = false\n",
        )
        .unwrap();
        assert_eq!(opts.target.area_id, 12);
        assert_eq!(opts.target.base_url, BASE_URL);
        assert!(!opts.session.browser.enabled);
        assert_eq!(opts.session.browser.port, WEBDRIVER_PORT);
        assert_eq!(opts.store.dir, PathBuf::from(STORE_DIR));
    }

    #[test]
    fn urls_follow_area_and_date() {
        let t = TargetOptions { base_url: s!("http://example.test/"), area_id: 95 };
        let d = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(t.api_url(), "http://example.test/api.php/v3areas/95");
        assert_eq!(t.page_url(d), "http://example.test/web/seat2/area/95/day/2025-09-01");
    }
}
