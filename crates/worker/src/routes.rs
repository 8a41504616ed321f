//! Path rules: which navigations may be served offline, and which API paths
//! name a novel resource the structured store can answer.

use regex::RegexSet;

/// Allow-list of navigation paths that may be served from cache offline.
#[derive(Debug, Clone)]
pub struct OfflineRoutes {
    set: RegexSet,
}

impl OfflineRoutes {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let set = RegexSet::new(patterns.iter().map(|p| p.as_ref()))?;
        Ok(Self { set })
    }

    pub fn is_offline_capable(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// A novel resource under the API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NovelResource {
    /// `/novels`
    Library,
    /// `/novels/:id`
    Novel(String),
    /// `/novels/:id/chapters`
    Chapters(String),
    /// `/novels/:id/chapters/:chapter`, by chapter id or number.
    Chapter { novel_id: String, chapter: String },
}

impl NovelResource {
    /// Parse a request path. Returns `None` for anything that is not a novel resource.
    pub fn parse(api_prefix: &str, path: &str) -> Option<Self> {
        let rest = path.strip_prefix(api_prefix)?;
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["novels"] => Some(Self::Library),
            ["novels", id] => Some(Self::Novel(decode(id))),
            ["novels", id, "chapters"] => Some(Self::Chapters(decode(id))),
            ["novels", id, "chapters", chapter] => {
                Some(Self::Chapter { novel_id: decode(id), chapter: decode(chapter) })
            }
            _ => None,
        }
    }

    pub fn novel_id(&self) -> Option<&str> {
        match self {
            Self::Library => None,
            Self::Novel(id) | Self::Chapters(id) => Some(id),
            Self::Chapter { novel_id, .. } => Some(novel_id),
        }
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelsa_core::AppConfig;

    fn default_routes() -> OfflineRoutes {
        OfflineRoutes::new(&AppConfig::default().offline_routes).unwrap()
    }

    #[test]
    fn test_offline_routes() {
        let routes = default_routes();
        assert_eq!(routes.len(), 5);
        assert!(routes.is_offline_capable("/offline-library"));
        assert!(routes.is_offline_capable("/offline-library/recent"));
        assert!(routes.is_offline_capable("/offline"));
        assert!(routes.is_offline_capable("/offline-reader/n1"));
        assert!(routes.is_offline_capable("/offline-novel/n1"));
        assert!(routes.is_offline_capable("/offline-favorites"));

        assert!(!routes.is_offline_capable("/offline/extra"));
        assert!(!routes.is_offline_capable("/offline-reader/n1/c2"));
        assert!(!routes.is_offline_capable("/novels/n1"));
        assert!(!routes.is_offline_capable("/"));
    }

    #[test]
    fn test_parse_novel_resources() {
        assert_eq!(NovelResource::parse("/api", "/api/novels"), Some(NovelResource::Library));
        assert_eq!(NovelResource::parse("/api", "/api/novels/n1"), Some(NovelResource::Novel("n1".into())));
        assert_eq!(
            NovelResource::parse("/api", "/api/novels/n1/chapters/"),
            Some(NovelResource::Chapters("n1".into()))
        );
        assert_eq!(
            NovelResource::parse("/api", "/api/novels/n1/chapters/c7"),
            Some(NovelResource::Chapter { novel_id: "n1".into(), chapter: "c7".into() })
        );
    }

    #[test]
    fn test_parse_rejects_other_paths() {
        assert_eq!(NovelResource::parse("/api", "/api/auth/login"), None);
        assert_eq!(NovelResource::parse("/api", "/api/novels/n1/comments"), None);
        assert_eq!(NovelResource::parse("/api", "/novels/n1"), None);
    }

    #[test]
    fn test_parse_decodes_segments() {
        let resource = NovelResource::parse("/api", "/api/novels/a%20b").unwrap();
        assert_eq!(resource.novel_id(), Some("a b"));
    }
}
