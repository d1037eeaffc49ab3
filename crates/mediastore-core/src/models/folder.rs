//! Folder models
//!
//! Folders form a tree with a materialized path and one-level aggregate
//! counters. `item_count`/`total_size` cover directly-contained items only,
//! never descendants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::media::slugify;

/// Folder for organizing media files hierarchically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    /// URL-safe slug, unique among siblings
    pub slug: String,
    pub description: Option<String>,
    /// Parent folder; None = root level
    pub parent_id: Option<Uuid>,
    /// Materialized path: ancestor slugs joined with '/', ending in this slug
    pub path: String,
    /// 0 for root-level folders, parent.depth + 1 otherwise
    pub depth: u32,
    /// Count of directly-contained items (one level, not recursive)
    pub item_count: u64,
    /// Total bytes of directly-contained items (one level, not recursive)
    pub total_size: u64,
    /// System folders cannot be deleted or renamed
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: impl Into<String>, parent_id: Option<Uuid>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name,
            path: slug.clone(),
            slug,
            description: None,
            parent_id,
            depth: 0,
            item_count: 0,
            total_size: 0,
            is_system: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Request DTO for creating a new folder
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFolderRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Folder name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request DTO for updating a folder
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFolderRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Folder name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Folder tree node for hierarchical representation
#[derive(Debug, Clone, Serialize)]
pub struct FolderTreeNode {
    pub folder: Folder,
    pub children: Vec<FolderTreeNode>,
}

impl FolderTreeNode {
    /// Item count including all descendants. `folder.item_count` is one-level;
    /// this is the recursive reading most UIs expect for "folder size".
    pub fn recursive_item_count(&self) -> u64 {
        self.folder.item_count
            + self
                .children
                .iter()
                .map(|c| c.recursive_item_count())
                .sum::<u64>()
    }

    /// Total bytes including all descendants.
    pub fn recursive_total_size(&self) -> u64 {
        self.folder.total_size
            + self
                .children
                .iter()
                .map(|c| c.recursive_total_size())
                .sum::<u64>()
    }
}

/// Breadcrumb entry from root to a folder
#[derive(Debug, Clone, Serialize)]
pub struct FolderBreadcrumb {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
