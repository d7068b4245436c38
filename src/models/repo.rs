use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

static REPOSITORY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([\w-]+)/([\w.-]+)/?$").expect("repository url pattern")
});

/// A validated `owner/name` pair on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Parses `https://github.com/owner/repo[/]`, ignoring surrounding whitespace.
    pub fn parse(url: &str) -> Result<Self, AnalysisError> {
        let trimmed = url.trim();
        let captures = REPOSITORY_URL.captures(trimmed).ok_or_else(|| {
            AnalysisError::InvalidInput(
                "Invalid GitHub URL. Format: https://github.com/username/repository".to_string(),
            )
        })?;

        Ok(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Repository identity used by every cache: the normalized URL.
    pub fn key(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Top-level listing of the default branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStructure {
    pub folders: usize,
    pub files: usize,
    pub file_names: Vec<String>,
}

/// Repository metadata as returned by the code-hosting service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoData {
    pub name: String,
    pub description: String,
    pub url: String,
    pub languages: BTreeMap<String, u64>,
    pub readme: String,
    pub license: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub contributors: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub default_branch: String,
    /// Size in KiB as reported by the host; zero means an empty repository.
    pub size: u64,
    pub file_structure: FileStructure,
}

impl RepoData {
    /// Language with the most bytes; ties go to the alphabetically first name.
    pub fn primary_language(&self) -> Option<&str> {
        self.languages
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, _)| name.as_str())
    }
}
