use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Configuration {
    pub application: ApplicationSettings,
    pub credentials: CredentialSettings,
    pub openai: OpenaiSettings,
    pub storage: StorageSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub webdriver_url: String,
    pub headless: bool,
}

#[derive(Deserialize, Clone)]
pub struct CredentialSettings {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Clone)]
pub struct OpenaiSettings {
    pub api_key: String,
    pub model: String,
    pub resume_path: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub session_file: PathBuf,
    pub settings_file: PathBuf,
}

/// Operational configuration is trusted input: a missing or malformed
/// `configuration.yaml` is a hard startup error.
pub fn get_configuration() -> Result<Configuration, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    let settings = config::Config::builder()
        .add_source(config::File::from(base_path.join("configuration.yaml")))
        .add_source(
            config::Environment::with_prefix("PURSUIT")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Configuration>()
}

/// User search settings, read once at startup and immutable for the run.
/// A missing file falls back to defaults; a malformed one is fatal.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub job_keywords: Vec<String>,
    pub locations: Vec<String>,
    pub date_posted_filter: Option<DatePostedFilter>,
    pub custom_message: String,
    pub my_needs: String,
    pub rescore_duplicates: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            job_keywords: vec![],
            locations: vec![],
            date_posted_filter: None,
            custom_message: String::new(),
            my_needs: String::new(),
            // Reference behavior: a repeated identity inside one run is
            // re-saved and re-scored rather than skipped.
            rescore_duplicates: true,
        }
    }
}

impl SearchSettings {
    pub fn load(path: &Path) -> Result<SearchSettings, serde_json::Error> {
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text),
            Err(_) => {
                log::warn!(
                    "Settings file {} not found. Using default settings.",
                    path.display()
                );
                Ok(SearchSettings::default())
            }
        }
    }

    /// Keywords joined with the AND operator, the way the feed's search
    /// box expects them.
    pub fn search_query(&self) -> String {
        self.job_keywords.join(" AND ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePostedFilter {
    Past24Hours,
    PastWeek,
    PastMonth,
    AnyTime,
}

impl DatePostedFilter {
    /// XPath of the radio input for this option in the date-posted dropdown.
    pub fn option_xpath(&self) -> &'static str {
        match self {
            DatePostedFilter::Past24Hours => "//input[@id='timePostedRange-r86400']",
            DatePostedFilter::PastWeek => "//input[@id='timePostedRange-r604800']",
            DatePostedFilter::PastMonth => "//input[@id='timePostedRange-r2592000']",
            DatePostedFilter::AnyTime => "//input[@id='timePostedRange-']",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DatePostedFilter, SearchSettings};

    #[test]
    fn missing_settings_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SearchSettings::load(&dir.path().join("settings.json")).unwrap();

        assert!(settings.job_keywords.is_empty());
        assert!(settings.locations.is_empty());
        assert!(settings.rescore_duplicates);
    }

    #[test]
    fn malformed_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(SearchSettings::load(&path).is_err());
    }

    #[test]
    fn settings_parse_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "job_keywords": ["rust", "backend"],
                "locations": ["Berlin"],
                "date_posted_filter": "past_week"
            }"#,
        )
        .unwrap();

        let settings = SearchSettings::load(&path).unwrap();
        assert_eq!(settings.search_query(), "rust AND backend");
        assert_eq!(
            settings.date_posted_filter,
            Some(DatePostedFilter::PastWeek)
        );
        assert!(settings.rescore_duplicates);
    }
}
