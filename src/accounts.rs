use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Characters of a query string shown in logs.
const PREVIEW_LEN: usize = 24;

/// Opaque init-data query string for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// 1-based position among the non-blank lines of the query file.
    pub account: usize,
    query: String,
}

impl Credential {
    pub fn new(account: usize, query: impl Into<String>) -> Self {
        Self {
            account,
            query: query.into(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Truncated query string, safe to put in a log line.
    pub fn preview(&self) -> String {
        let mut preview: String = self.query.chars().take(PREVIEW_LEN).collect();
        if self.query.chars().count() > PREVIEW_LEN {
            preview.push_str("...");
        }
        preview
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .field("query", &self.preview())
            .finish()
    }
}

/// Parse query file contents: one credential per line, blank lines skipped.
pub fn parse_credentials(contents: &str) -> Vec<Credential> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, line)| Credential::new(idx + 1, line))
        .collect()
}

/// Read all credentials from the query file at `path`.
pub fn load_credentials(path: &Path) -> Result<Vec<Credential>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let credentials = parse_credentials(&contents);
    info!(
        "Loaded {} account(s) from {}",
        credentials.len(),
        path.display()
    );
    Ok(credentials)
}
