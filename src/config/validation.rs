use crate::config::types::{
    BrowserConfig, Config, CrawlTarget, ExtractionConfig, FetcherConfig, OutputConfig,
};
use crate::extract::MAX_TOTAL_PAGES;
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    validate_extraction_config(&config.extraction)?;
    if let Some(browser) = &config.browser {
        validate_browser_config(browser)?;
    }
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 1000ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if let Some(referer) = &config.referer {
        Url::parse(referer)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output root cannot be empty".to_string(),
        ));
    }

    if !config.save_html && !config.save_text {
        return Err(ConfigError::Validation(
            "at least one of save_html and save_text must be enabled".to_string(),
        ));
    }

    if !(8..=200).contains(&config.max_filename_length) {
        return Err(ConfigError::Validation(format!(
            "max_filename_length must be between 8 and 200, got {}",
            config.max_filename_length
        )));
    }

    Ok(())
}

/// Validates extraction selectors
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    validate_selector("entry_container", &config.entry_container)?;

    for selector in &config.content_selectors {
        validate_selector("content_selectors", selector)?;
    }

    if matches!(&config.document_path, Some(path) if path.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "document_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if let Some(debug_url) = &config.debug_url {
        let url = Url::parse(debug_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid debug_url: {}", e)))?;
        if !matches!(url.scheme(), "ws" | "wss" | "http") {
            return Err(ConfigError::Validation(format!(
                "debug_url '{}' must be a ws:// or http:// DevTools endpoint",
                debug_url
            )));
        }
    }

    if matches!(&config.chrome_executable, Some(path) if path.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "chrome_executable cannot be empty when set".to_string(),
        ));
    }

    validate_selector("ready_marker", &config.ready_marker)?;

    if config.poll_interval_ms == 0 || config.poll_interval_ms > config.wait_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be between 1 and wait_timeout_ms ({}), got {}",
            config.wait_timeout_ms, config.poll_interval_ms
        )));
    }

    Ok(())
}

/// Validates crawl targets
fn validate_targets(targets: &[CrawlTarget]) -> Result<(), ConfigError> {
    if targets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[target]] is required".to_string(),
        ));
    }

    let mut groups = HashSet::new();
    for target in targets {
        validate_group_name(&target.group)?;

        if !groups.insert(target.group.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate target group '{}'",
                target.group
            )));
        }

        let seed = Url::parse(&target.seed).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", target.seed, e))
        })?;

        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                target.seed
            )));
        }

        if let Some(total) = target.default_total_pages {
            if !(1..=MAX_TOTAL_PAGES).contains(&total) {
                return Err(ConfigError::Validation(format!(
                    "default_total_pages for '{}' must be between 1 and {}, got {}",
                    target.group, MAX_TOTAL_PAGES, total
                )));
            }
        }
    }

    Ok(())
}

/// Group names become directory names under the output root
fn validate_group_name(group: &str) -> Result<(), ConfigError> {
    if group.trim().is_empty() {
        return Err(ConfigError::Validation(
            "target group cannot be empty".to_string(),
        ));
    }

    if group.contains('/') || group.contains('\\') || group == "." || group.contains("..") {
        return Err(ConfigError::Validation(format!(
            "target group '{}' must be a single directory name",
            group
        )));
    }

    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!("Invalid CSS selector for {}: '{}' ({})", field, selector, e))
    })
}
