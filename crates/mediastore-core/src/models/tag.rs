use serde::{Deserialize, Serialize};

use super::media::slugify;

/// Label attached to media items, tracked with a usage count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub slug: String,
    pub usage_count: u64,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            name,
            slug,
            usage_count: 0,
        }
    }
}
