//! Configuration for tokenizer and detokenizer construction

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Annotation serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationFormat {
    /// JSON array of per-line chart objects
    #[default]
    Json,
    /// `::line N ::s ...` / `::span s-e ::type T ...` text form
    DoubleColon,
}

/// Processing configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Selected language codes (ISO 639-3), most specific first.
    /// Empty means universal rules only (plus the shared eng-global set).
    pub(crate) lang_codes: Vec<String>,
    /// Resource data directory; `None` uses the crate's bundled `data/`
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) first_token_is_line_id: bool,
    /// Suppress attach-tag markup (`@-@` etc.) in surface output
    pub(crate) simple: bool,
    pub(crate) annotation_format: AnnotationFormat,
    /// Retain charts even when no annotation output was requested
    pub(crate) chart: bool,
    pub(crate) verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lang_codes: Vec::new(),
            data_dir: None,
            first_token_is_line_id: false,
            simple: false,
            annotation_format: AnnotationFormat::default(),
            chart: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Primary language code, if any
    pub fn lang_code(&self) -> Option<&str> {
        self.lang_codes.first().map(String::as_str)
    }

    pub fn lang_codes(&self) -> &[String] {
        &self.lang_codes
    }

    pub fn simple(&self) -> bool {
        self.simple
    }

    pub fn chart(&self) -> bool {
        self.chart
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn first_token_is_line_id(&self) -> bool {
        self.first_token_is_line_id
    }

    pub fn annotation_format(&self) -> AnnotationFormat {
        self.annotation_format
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for code in &self.lang_codes {
            if !(2..=3).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(Error::Configuration(format!(
                    "'{code}' is not a plausible ISO 639-3 language code"
                )));
            }
        }
        if let Some(dir) = &self.data_dir {
            if !dir.is_dir() {
                return Err(Error::Configuration(format!(
                    "data directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Fluent builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    lang_code: Option<String>,
    data_dir: Option<PathBuf>,
    first_token_is_line_id: bool,
    simple: bool,
    annotation_format: Option<AnnotationFormat>,
    chart: bool,
    verbose: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language by code. Accepts a comma- or semicolon-separated
    /// list, e.g. `"spa, cat"`; the first code is primary.
    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.lang_code = Some(code.into());
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn first_token_is_line_id(mut self, yes: bool) -> Self {
        self.first_token_is_line_id = yes;
        self
    }

    pub fn simple(mut self, yes: bool) -> Self {
        self.simple = yes;
        self
    }

    pub fn annotation_format(mut self, format: AnnotationFormat) -> Self {
        self.annotation_format = Some(format);
        self
    }

    pub fn chart(mut self, yes: bool) -> Self {
        self.chart = yes;
        self
    }

    pub fn verbose(mut self, yes: bool) -> Self {
        self.verbose = yes;
        self
    }

    pub fn build(self) -> Result<Config> {
        let mut config = Config::default();
        if let Some(codes) = self.lang_code {
            config.lang_codes = codes
                .split([',', ';'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config.data_dir = self.data_dir;
        config.first_token_is_line_id = self.first_token_is_line_id;
        config.simple = self.simple;
        if let Some(format) = self.annotation_format {
            config.annotation_format = format;
        }
        config.chart = self.chart;
        config.verbose = self.verbose;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.lang_code().is_none());
        assert!(!config.simple);
    }

    #[test]
    fn builder_splits_language_lists() {
        let config = Config::builder().language("spa, cat").build().unwrap();
        assert_eq!(config.lang_code(), Some("spa"));
        assert_eq!(config.lang_codes(), ["spa", "cat"]);
    }

    #[test]
    fn builder_rejects_bad_language_codes() {
        assert!(Config::builder().language("english").build().is_err());
        assert!(Config::builder().language("EN").build().is_err());
        assert!(Config::builder().language("eng").build().is_ok());
    }

    #[test]
    fn builder_sets_flags() {
        let config = Config::builder()
            .simple(true)
            .chart(true)
            .first_token_is_line_id(true)
            .annotation_format(AnnotationFormat::DoubleColon)
            .build()
            .unwrap();
        assert!(config.simple);
        assert!(config.chart);
        assert!(config.first_token_is_line_id);
        assert_eq!(config.annotation_format, AnnotationFormat::DoubleColon);
    }
}
