//! Robots.txt parser implementation
//!
//! This module provides functionality for parsing robots.txt content using the robotstxt crate.

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// Longest `Crawl-delay` honored; larger values are clamped to it
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(3600);

/// Parsed robots.txt data
///
/// This is a wrapper around the robotstxt crate's types, providing a simplified
/// interface for checking if URLs are allowed.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is used as the default when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true when this instance permits every URL unconditionally
    #[cfg(test)]
    pub fn is_allow_all(&self) -> bool {
        self.allow_all
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The user agent token (e.g. `*`)
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
    }

    /// Gets the crawl delay declared for a user agent
    ///
    /// Groups are delimited the usual way: consecutive `User-agent` lines
    /// share one group, and a `User-agent` line after any other directive
    /// starts a new one. A group naming the agent wins over the `*` group.
    /// Negative or unparseable values are ignored, and values above
    /// [`MAX_CRAWL_DELAY`] are clamped to it.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut for_agent: Option<f64> = None;
        let mut for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            // Strip trailing comments
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !in_agent_lines {
                        group.clear();
                        in_agent_lines = true;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_agent_lines = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if agent != "*" && group.iter().any(|ua| ua == &agent) {
                        for_agent.get_or_insert(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard.get_or_insert(delay);
                    }
                }
                _ => in_agent_lines = false,
            }
        }

        let delay = for_agent.or(for_wildcard)?;
        if delay > MAX_CRAWL_DELAY.as_secs_f64() {
            tracing::warn!(
                "robots.txt Crawl-delay of {}s exceeds {}s, clamping",
                delay,
                MAX_CRAWL_DELAY.as_secs()
            );
            return Some(MAX_CRAWL_DELAY);
        }
        Duration::try_from_secs_f64(delay).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse("https://example.com").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_allow_all());
        assert!(robots.is_allowed(&url("/any/path"), "*"));
        assert!(robots.is_allowed(&url("/admin"), "*"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed(&url("/"), "*"));
        assert!(!robots.is_allowed(&url("/page"), "*"));
    }

    #[test]
    fn test_parse_disallow_directory() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private/");
        assert!(robots.is_allowed(&url("/"), "*"));
        assert!(robots.is_allowed(&url("/public/page"), "*"));
        assert!(!robots.is_allowed(&url("/private/page"), "*"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let robots = ParsedRobots::from_content(content);
        assert!(!robots.is_allowed(&url("/private"), "*"));
        assert!(robots.is_allowed(&url("/private/public"), "*"));
    }

    #[test]
    fn test_rules_for_other_agents_do_not_apply() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed(&url("/page"), "*"));
    }

    #[test]
    fn test_invalid_and_empty_content_allow() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed(&url("/any/path"), "*"));

        let robots = ParsedRobots::from_content("");
        assert!(robots.is_allowed(&url("/any/path"), "*"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let content = "User-agent: *\nCrawl-delay: 10\nDisallow: /admin";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("*"), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_crawl_delay_other_group_ignored() {
        let content = "User-agent: SlowBot\nCrawl-delay: 30\n\nUser-agent: *\nDisallow: /x";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("*"), None);
    }

    #[test]
    fn test_crawl_delay_group_boundaries() {
        let content = "User-agent: *\nDisallow: /x\nUser-agent: SlowBot\nCrawl-delay: 30";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("*"), None);
        assert_eq!(robots.crawl_delay("slowbot"), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_crawl_delay_decimal_and_comments() {
        let content = "User-agent: * # everyone\nCrawl-delay: 2.5 # seconds";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("*"), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_crawl_delay_invalid_values() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: soon");
        assert_eq!(robots.crawl_delay("*"), None);

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: -3");
        assert_eq!(robots.crawl_delay("*"), None);

        assert_eq!(ParsedRobots::allow_all().crawl_delay("*"), None);
    }

    #[test]
    fn test_crawl_delay_huge_values_are_clamped() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 1e20");
        assert_eq!(robots.crawl_delay("*"), Some(MAX_CRAWL_DELAY));

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 1e15");
        assert_eq!(robots.crawl_delay("*"), Some(MAX_CRAWL_DELAY));

        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 3600");
        assert_eq!(robots.crawl_delay("*"), Some(Duration::from_secs(3600)));
    }
}
