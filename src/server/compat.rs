// Client compatibility policies: which clients need exact byte ranges back.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use serde::Deserialize;

/// Request properties a policy may look at.
#[derive(Debug, Clone, Default)]
pub struct ClientHints {
    pub user_agent: Option<String>,
}

impl ClientHints {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            user_agent: headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

pub trait CompatPolicy: Send + Sync {
    /// Whether this client must get exactly the bytes it asked for rather
    /// than the whole aligned chunk.
    fn wants_exact_range(&self, client: &ClientHints) -> bool;
}

/// Always answer with the aligned chunk.
pub struct AlignedChunks;

impl CompatPolicy for AlignedChunks {
    fn wants_exact_range(&self, _client: &ClientHints) -> bool {
        false
    }
}

/// Always slice down to the requested span.
pub struct ExactRanges;

impl CompatPolicy for ExactRanges {
    fn wants_exact_range(&self, _client: &ClientHints) -> bool {
        true
    }
}

/// Slice for user agents containing any `include` token and no `exclude`
/// token, compared case-insensitively.
pub struct UserAgentRule {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl UserAgentRule {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.iter().map(|s| s.to_ascii_lowercase()).collect(),
            exclude: exclude.iter().map(|s| s.to_ascii_lowercase()).collect(),
        }
    }
}

impl CompatPolicy for UserAgentRule {
    fn wants_exact_range(&self, client: &ClientHints) -> bool {
        let Some(ua) = client.user_agent.as_deref() else {
            return false;
        };
        let ua = ua.to_ascii_lowercase();
        self.include.iter().any(|t| ua.contains(t.as_str()))
            && !self.exclude.iter().any(|t| ua.contains(t.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CompatConfig {
    Aligned,
    Exact,
    UserAgent {
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl Default for CompatConfig {
    /// Matches WebKit agents. Chromium-based agents also carry "Safari" in
    /// their user agent and are excluded.
    fn default() -> Self {
        CompatConfig::UserAgent {
            include: vec!["safari".into()],
            exclude: vec!["chrome".into(), "chromium".into(), "android".into()],
        }
    }
}

impl CompatConfig {
    pub fn build(&self) -> Arc<dyn CompatPolicy> {
        match self {
            CompatConfig::Aligned => Arc::new(AlignedChunks),
            CompatConfig::Exact => Arc::new(ExactRanges),
            CompatConfig::UserAgent { include, exclude } => {
                Arc::new(UserAgentRule::new(include, exclude))
            }
        }
    }
}
