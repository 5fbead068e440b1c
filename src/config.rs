use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Title prefix that always excludes a page from rendering, matched
/// case-insensitively.
pub const WIP_TITLE_PREFIX: &str = "wip";

/// The declarative part of a run: which roots to walk and which titles to
/// exclude. Loaded once at startup, immutable for the run's duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub roots: Vec<RootMapping>,
    #[serde(default)]
    pub excluded_title_keywords: Vec<String>,
}

/// One configured root: a source page subtree and the name of the
/// destination folder all of its retained descendants land in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootMapping {
    pub page_id: String,
    pub folder_name: String,
}

impl SyncConfig {
    /// A page is excluded when its title starts with [`WIP_TITLE_PREFIX`]
    /// (case-insensitive) or contains any configured keyword as a substring.
    /// Exclusion suppresses rendering and upload only; children of an
    /// excluded page are still visited.
    pub fn is_excluded(&self, title: &str) -> bool {
        if title.to_lowercase().starts_with(WIP_TITLE_PREFIX) {
            return true;
        }
        self.excluded_title_keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()))
    }

    pub fn trace_loaded(&self) {
        info!(
            roots = self.roots.len(),
            excluded_keywords = self.excluded_title_keywords.len(),
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_keywords(keywords: &[&str]) -> SyncConfig {
        SyncConfig {
            roots: vec![],
            excluded_title_keywords: keywords.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn wip_prefix_excludes_case_insensitively() {
        let config = config_with_keywords(&[]);
        assert!(config.is_excluded("WIP draft"));
        assert!(config.is_excluded("wip notes"));
        assert!(config.is_excluded("Wip"));
        assert!(!config.is_excluded("Work in progress overview"));
    }

    #[test]
    fn keyword_matches_as_substring_not_whole_word() {
        let config = config_with_keywords(&["2024"]);
        assert!(config.is_excluded("Budget 2024 final"));
        assert!(config.is_excluded("2024予算"));
        assert!(!config.is_excluded("Budget 2025 final"));
    }

    #[test]
    fn non_matching_titles_are_retained() {
        let config = config_with_keywords(&["2023予算"]);
        assert!(config.is_excluded("2023予算 detail"));
        assert!(!config.is_excluded("Keep me"));
    }
}
