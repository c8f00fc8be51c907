// Per-service configuration

use super::constants::DEFAULT_PAGE_LIMIT;
use crate::domain::{Populate, UniqueKey};
use serde::{Deserialize, Serialize};

/// Defaults injected into one [`super::CrudService`] instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOptions {
    /// Key used by upsert/resert when the call gives none
    #[serde(default)]
    pub unique_key: Option<UniqueKey>,

    /// Relations resolved on read when the call gives none
    #[serde(default)]
    pub populate: Option<Populate>,

    /// Page size for `find_paged` without an explicit limit
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u64,
}

fn default_page_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            unique_key: None,
            populate: None,
            default_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ServiceOptions {
    pub fn with_unique_key(mut self, unique_key: UniqueKey) -> Self {
        self.unique_key = Some(unique_key);
        self
    }

    pub fn with_populate(mut self, populate: Populate) -> Self {
        self.populate = Some(populate);
        self
    }

    pub fn with_default_page_limit(mut self, limit: u64) -> Self {
        self.default_page_limit = limit;
        self
    }
}
