//! Configuration validation logic.

use crate::config::loader::Config;
use crate::config::modes::HarvestTarget;
use crate::error::{Error, Result};
use regex::Regex;

/// Maximum screen name length.
const MAX_USERNAME_LENGTH: usize = 15;

/// Maximum search query length accepted by the search endpoint.
const MAX_QUERY_LENGTH: usize = 500;

/// Largest page the listing endpoints return.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Longest accepted base delay between page requests (10 minutes).
pub const MAX_PAGE_DELAY_MS: u64 = 600_000;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_token(&config.account.bearer_token)?;
    validate_page_size(config.options.page_size)?;
    validate_page_delay(config.options.page_delay_ms)?;

    match config.target()? {
        HarvestTarget::User(name) => validate_username(&name)?,
        HarvestTarget::Search(query) => validate_search_query(&query)?,
    }

    Ok(())
}

/// Validate the bearer token.
pub fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(Error::MissingConfig("bearer_token".to_string()));
    }

    // Check for placeholder values
    let token_lower = token.to_lowercase();
    if ["replaceme", "your_token", "your_bearer_token"]
        .iter()
        .any(|p| token_lower.contains(p))
    {
        return Err(Error::ConfigValidation {
            field: "bearer_token".to_string(),
            message: "Token appears to be a placeholder. Please provide your actual bearer token."
                .to_string(),
        });
    }

    Ok(())
}

/// Validate a (normalized) screen name.
pub fn validate_username(username: &str) -> Result<()> {
    let username_pattern = Regex::new(r"^[A-Za-z0-9_]+$")?;

    if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
        return Err(Error::ConfigValidation {
            field: "username".to_string(),
            message: format!(
                "Username '{}' must be 1 to {} characters",
                username, MAX_USERNAME_LENGTH
            ),
        });
    }

    if !username_pattern.is_match(username) {
        return Err(Error::ConfigValidation {
            field: "username".to_string(),
            message: format!(
                "Username '{}' contains invalid characters. Only letters, digits and underscores allowed.",
                username
            ),
        });
    }

    Ok(())
}

/// Validate a search query.
pub fn validate_search_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::MissingConfig("search".to_string()));
    }

    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(Error::ConfigValidation {
            field: "search".to_string(),
            message: format!("Search query exceeds {} characters", MAX_QUERY_LENGTH),
        });
    }

    Ok(())
}

/// Validate the page size.
pub fn validate_page_size(page_size: u32) -> Result<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::ConfigValidation {
            field: "page_size".to_string(),
            message: format!("Page size must be between 1 and {}", MAX_PAGE_SIZE),
        });
    }

    Ok(())
}

/// Validate the base delay between page requests.
pub fn validate_page_delay(delay_ms: u64) -> Result<()> {
    if delay_ms > MAX_PAGE_DELAY_MS {
        return Err(Error::ConfigValidation {
            field: "page_delay_ms".to_string(),
            message: format!("Page delay must be at most {} ms", MAX_PAGE_DELAY_MS),
        });
    }

    Ok(())
}

/// Extract a screen name from `@name`, a bare name, or a profile URL.
pub fn parse_username(input: &str) -> Result<String> {
    let input = input.trim();

    // If it's a URL, extract the first path segment
    if input.starts_with("http://") || input.starts_with("https://") {
        let profile_pattern =
            Regex::new(r"^https?://(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/@?([A-Za-z0-9_]+)/?")?;

        if let Some(name) = profile_pattern.captures(input).and_then(|c| c.get(1)) {
            return Ok(name.as_str().to_string());
        }

        return Err(Error::ConfigValidation {
            field: "username".to_string(),
            message: format!("Could not extract username from URL: {}", input),
        });
    }

    let name = input.trim_start_matches('@').to_string();
    validate_username(&name)?;
    Ok(name)
}
