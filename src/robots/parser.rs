//! Robots.txt rules
//!
//! Allow/disallow matching is delegated to the robotstxt crate (Google's
//! matcher); Crawl-delay is not part of that matcher and is parsed here.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt rules for one origin
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt body; `None` allows everything
    content: Option<String>,
}

impl ParsedRobots {
    /// Creates rules from a robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
        }
    }

    /// Creates a permissive rule set
    ///
    /// Used when robots.txt is missing, unreachable, or compliance is off.
    pub fn allow_all() -> Self {
        Self { content: None }
    }

    /// Returns true when no rules restrict crawling
    pub fn is_allow_all(&self) -> bool {
        self.content.as_deref().map_or(true, |c| c.trim().is_empty())
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// `url` may be absolute or a bare path. The group is picked with
    /// [`group_agent`], so a browser user agent is governed by a
    /// `User-agent: Chrome` group as well as by `*`.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        let content = match self.content.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => return true,
        };

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(content, group_agent(content, user_agent), url)
    }

    /// Gets the Crawl-delay in seconds for a user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let content = self.content.as_deref()?;
        let agent = group_agent(content, user_agent).to_ascii_lowercase();

        let mut group_agents: Vec<String> = Vec::new();
        let mut in_agent_lines = false;
        let mut wildcard_delay = None;
        let mut agent_delay = None;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            if key == "user-agent" {
                // Consecutive user-agent lines share one group
                if !in_agent_lines {
                    group_agents.clear();
                }
                let name = if value == "*" { value } else { product_token(value) };
                group_agents.push(name.to_ascii_lowercase());
                in_agent_lines = true;
                continue;
            }
            in_agent_lines = false;

            if key != "crawl-delay" {
                continue;
            }
            let Ok(delay) = value.parse::<f64>() else {
                continue;
            };
            if delay.is_sign_negative() || !delay.is_finite() {
                continue;
            }

            if !agent.is_empty() && group_agents.iter().any(|ua| *ua == agent) {
                agent_delay = Some(delay);
            } else if group_agents.iter().any(|ua| ua == "*") {
                wildcard_delay = Some(delay);
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

/// Name of the robots.txt group that governs `user_agent`
///
/// The first `User-agent` line whose name occurs anywhere in the full user
/// agent string (ignoring case) wins. Without such a line the user agent's
/// own product token is used, which leaves only the `*` group to match.
pub fn group_agent<'a>(content: &'a str, user_agent: &'a str) -> &'a str {
    let full = user_agent.to_ascii_lowercase();

    content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next()?.trim();
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("user-agent")
                .then(|| product_token(value.trim()))
        })
        .find(|name| !name.is_empty() && full.contains(&name.to_ascii_lowercase()))
        .unwrap_or_else(|| product_token(user_agent))
}

/// Leading product token of a user agent string
pub fn product_token(user_agent: &str) -> &str {
    let end = user_agent
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(user_agent.len());
    &user_agent[..end]
}
