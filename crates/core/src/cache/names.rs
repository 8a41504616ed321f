//! Cache generation naming.

use serde::{Deserialize, Serialize};

/// The three cache names belonging to one interception layer version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNames {
    pub shell: String,
    pub images: String,
    pub api: String,
}

impl CacheNames {
    pub fn for_version(version: &str) -> Self {
        Self { shell: format!("shell-{version}"), images: format!("images-{version}"), api: format!("api-{version}") }
    }

    /// Every name in this generation; anything else is stale on activation.
    pub fn all(&self) -> Vec<String> {
        vec![self.shell.clone(), self.images.clone(), self.api.clone()]
    }
}
