//! Public URLs for stored objects.

use quill_shared::config::{CdnConfig, StorageProvider};

use super::error::StorageError;

/// Maps storage keys to CDN mirror URLs.
///
/// Pure string work: `https://{origin}/{owner}/{repo}/{branch}/{path}`. The URL
/// is valid as soon as the object is committed; it never waits on the edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnResolver {
    prefix: String,
}

impl CdnResolver {
    /// Create a resolver.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if any part is empty.
    pub fn new(origin: &str, owner: &str, repo: &str, branch: &str) -> Result<Self, StorageError> {
        let origin = origin
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_matches('/');
        let parts = [
            ("origin", origin),
            ("owner", owner.trim().trim_matches('/')),
            ("repo", repo.trim().trim_matches('/')),
            ("branch", branch.trim().trim_matches('/')),
        ];
        if let Some((name, _)) = parts.iter().find(|(_, value)| value.is_empty()) {
            return Err(StorageError::configuration(format!(
                "cdn mirror requires `{name}`"
            )));
        }

        let [origin, owner, repo, branch] = parts.map(|(_, value)| value);
        Ok(Self {
            prefix: format!("https://{origin}/{owner}/{repo}/{branch}"),
        })
    }

    /// Create a resolver from configuration, filling owner/repo/branch from
    /// the storage provider when the CDN section leaves them out.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` if any part is missing.
    pub fn from_config(cdn: &CdnConfig, provider: &StorageProvider) -> Result<Self, StorageError> {
        let (owner, repo, branch) = cdn.segments(provider);
        Self::new(&cdn.origin, &owner, &repo, &branch)
    }

    /// Public URL for a storage key.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        format!("{}/{}", self.prefix, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_resolve() {
        let cdn = CdnResolver::new("cdn.jsdelivr.net/gh", "alice", "assets", "main").unwrap();
        assert_eq!(
            cdn.resolve("posts/42-20260115/abc.png"),
            "https://cdn.jsdelivr.net/gh/alice/assets/main/posts/42-20260115/abc.png"
        );
    }

    #[rstest]
    #[case("https://cdn.example.com/")]
    #[case("cdn.example.com")]
    #[case("  http://cdn.example.com  ")]
    fn test_origin_normalization(#[case] origin: &str) {
        let cdn = CdnResolver::new(origin, "o", "r", "b").unwrap();
        assert_eq!(cdn.resolve("/site/x.png"), "https://cdn.example.com/o/r/b/site/x.png");
    }

    #[rstest]
    #[case("", "o", "r", "b", "origin")]
    #[case("cdn", "", "r", "b", "owner")]
    #[case("cdn", "o", " ", "b", "repo")]
    #[case("cdn", "o", "r", "/", "branch")]
    fn test_missing_part_is_configuration_error(
        #[case] origin: &str,
        #[case] owner: &str,
        #[case] repo: &str,
        #[case] branch: &str,
        #[case] missing: &str,
    ) {
        let err = CdnResolver::new(origin, owner, repo, branch).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(ref m) if m.contains(missing)));
    }

    #[test]
    fn test_from_config_without_github_requires_segments() {
        let cdn = CdnConfig {
            origin: "cdn.example.com".into(),
            ..CdnConfig::default()
        };
        assert!(CdnResolver::from_config(&cdn, &StorageProvider::Memory).is_err());

        let cdn = CdnConfig {
            origin: "cdn.example.com".into(),
            owner: Some("o".into()),
            repo: Some("r".into()),
            branch: Some("main".into()),
        };
        let resolver = CdnResolver::from_config(&cdn, &StorageProvider::Memory).unwrap();
        assert_eq!(resolver.resolve("a.png"), "https://cdn.example.com/o/r/main/a.png");
    }
}
