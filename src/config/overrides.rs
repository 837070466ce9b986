use crate::config::parser::read_config;
use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Values supplied on the command line
///
/// `None` (or `false` for switches) leaves the file or default value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub start_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub delay_seconds: Option<f64>,
    pub max_pages: Option<u32>,
    pub max_depth: Option<u32>,
    pub min_size_kb: Option<u64>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub no_duplicates: bool,
    pub image_workers: Option<usize>,
    pub summary_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Applies the overrides on top of an existing configuration
    pub fn apply(self, config: &mut Config) {
        if let Some(url) = self.start_url {
            config.crawler.start_url = Some(url);
        }
        if let Some(dir) = self.output_dir {
            config.output.directory = dir;
        }
        if let Some(delay) = self.delay_seconds {
            config.crawler.delay_seconds = delay;
        }
        if let Some(pages) = self.max_pages {
            config.crawler.max_pages = pages;
        }
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        if let Some(size) = self.min_size_kb {
            config.filter.min_size_kb = size;
        }
        if let Some(width) = self.min_width {
            config.filter.min_width = width;
        }
        if let Some(height) = self.min_height {
            config.filter.min_height = height;
        }
        if self.no_duplicates {
            config.filter.no_duplicates = true;
        }
        if let Some(workers) = self.image_workers {
            config.crawler.image_workers = workers;
        }
        if let Some(summary) = self.summary_path {
            config.output.summary_path = Some(summary);
        }
    }
}

/// Builds the effective configuration: defaults, then the optional TOML file,
/// then command-line overrides, then validation
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => Config::default(),
    };

    overrides.apply(&mut config);
    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_file_values() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[crawler]\nstart-url = \"https://file.example/\"\nmax-pages = 50\nmax-depth = 4\n")
            .unwrap();
        file.flush().unwrap();

        let overrides = ConfigOverrides {
            max_depth: Some(1),
            no_duplicates: true,
            ..Default::default()
        };

        let config = resolve_config(Some(file.path()), overrides).unwrap();
        assert_eq!(config.crawler.max_pages, 50);
        assert_eq!(config.crawler.max_depth, 1);
        assert!(config.filter.no_duplicates);
        assert_eq!(
            config.crawler.start_url.as_deref(),
            Some("https://file.example/")
        );
    }

    #[test]
    fn test_resolve_without_file() {
        let overrides = ConfigOverrides {
            start_url: Some("http://example.com".to_string()),
            delay_seconds: Some(0.25),
            ..Default::default()
        };

        let config = resolve_config(None, overrides).unwrap();
        assert_eq!(config.crawler.delay_seconds, 0.25);
        assert_eq!(config.filter.min_size_kb, 10);
    }

    #[test]
    fn test_resolve_rejects_invalid_override() {
        let overrides = ConfigOverrides {
            start_url: Some("http://example.com".to_string()),
            max_pages: Some(0),
            ..Default::default()
        };

        assert!(matches!(
            resolve_config(None, overrides),
            Err(ConfigError::Validation(_))
        ));
    }
}
