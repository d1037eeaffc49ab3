//! Folder hierarchy management
//!
//! Folders form a tree addressed by materialized paths. Structural mutations
//! (create, rename, move, delete) hold the state write lock for their whole
//! duration so paths, depths, and aggregate stats never go stale mid-change.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mediastore_core::models::{
    slugify, CreateFolderRequest, Folder, FolderBreadcrumb, FolderTreeNode, UpdateFolderRequest,
};
use mediastore_core::{AppError, AppResult};
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::catalog::{CatalogState, MediaCatalog};

/// What happens to contained items when a folder is force-deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Items are soft-deleted and detached from the removed folder
    Soft,
    /// Items are erased from storage and the catalog
    Hard,
}

/// Folder tree service
#[derive(Clone)]
pub struct FolderManager {
    state: Arc<RwLock<CatalogState>>,
    catalog: MediaCatalog,
}

impl FolderManager {
    pub fn new(state: Arc<RwLock<CatalogState>>, catalog: MediaCatalog) -> Self {
        Self { state, catalog }
    }

    /// Create a folder under an optional parent.
    ///
    /// The slug must be unique among siblings; the materialized path and
    /// depth derive from the parent.
    #[tracing::instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(&self, request: CreateFolderRequest) -> AppResult<Folder> {
        request.validate()?;

        let mut state = self.state.write().await;

        let mut folder = Folder::new(request.name, request.parent_id);
        folder.description = request.description;

        if let Some(parent_id) = request.parent_id {
            let parent = state
                .folders
                .get(&parent_id)
                .ok_or_else(|| AppError::NotFound(format!("Parent folder not found: {}", parent_id)))?;
            folder.path = format!("{}/{}", parent.path, folder.slug);
            folder.depth = parent.depth + 1;
        }

        if sibling_slug_taken(&state, request.parent_id, &folder.slug, None) {
            return Err(AppError::Conflict(format!(
                "A folder named '{}' already exists here",
                folder.slug
            )));
        }

        tracing::info!(folder_id = %folder.id, path = %folder.path, "Folder created");
        state.folders.insert(folder.id, folder.clone());

        Ok(folder)
    }

    /// Get a folder by id
    pub async fn get(&self, id: Uuid) -> AppResult<Folder> {
        let state = self.state.read().await;
        state
            .folders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Folder not found: {}", id)))
    }

    /// Rename a folder or update its description.
    ///
    /// Renaming changes the slug, so the whole subtree's paths are rebuilt
    /// in the same write-lock hold.
    pub async fn update(&self, id: Uuid, request: UpdateFolderRequest) -> AppResult<Folder> {
        request.validate()?;

        let mut state = self.state.write().await;

        let folder = state
            .folders
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Folder not found: {}", id)))?;

        if folder.is_system && request.name.is_some() {
            return Err(AppError::Conflict("System folders cannot be renamed".to_string()));
        }
        let parent_id = folder.parent_id;

        if let Some(ref name) = request.name {
            let slug = slugify(name);
            if sibling_slug_taken(&state, parent_id, &slug, Some(id)) {
                return Err(AppError::Conflict(format!(
                    "A folder named '{}' already exists here",
                    slug
                )));
            }

            let folder = state.folders.get_mut(&id).expect("folder checked above");
            folder.name = name.clone();
            folder.slug = slug;
            rebuild_subtree_paths(&mut state, id);
        }

        let folder = state.folders.get_mut(&id).expect("folder checked above");
        if let Some(description) = request.description {
            folder.description = Some(description);
        }
        folder.updated_at = Utc::now();

        Ok(folder.clone())
    }

    /// Move a folder under a new parent (None = root level).
    ///
    /// Moving into the folder's own subtree would orphan it from the tree,
    /// so that is rejected.
    #[tracing::instrument(skip(self), fields(folder_id = %id))]
    pub async fn move_folder(&self, id: Uuid, new_parent_id: Option<Uuid>) -> AppResult<Folder> {
        let mut state = self.state.write().await;

        let folder = state
            .folders
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Folder not found: {}", id)))?;
        if folder.is_system {
            return Err(AppError::Conflict("System folders cannot be moved".to_string()));
        }
        let slug = folder.slug.clone();

        if let Some(parent_id) = new_parent_id {
            if parent_id == id {
                return Err(AppError::InvalidInput(
                    "A folder cannot be its own parent".to_string(),
                ));
            }
            if !state.folders.contains_key(&parent_id) {
                return Err(AppError::NotFound(format!("Parent folder not found: {}", parent_id)));
            }
            if subtree_ids(&state, id).contains(&parent_id) {
                return Err(AppError::InvalidInput(
                    "Cannot move a folder into its own subtree".to_string(),
                ));
            }
        }

        if sibling_slug_taken(&state, new_parent_id, &slug, Some(id)) {
            return Err(AppError::Conflict(format!(
                "A folder named '{}' already exists in the destination",
                slug
            )));
        }

        let folder = state.folders.get_mut(&id).expect("folder checked above");
        folder.parent_id = new_parent_id;
        folder.updated_at = Utc::now();
        rebuild_subtree_paths(&mut state, id);

        Ok(state.folders.get(&id).cloned().expect("folder checked above"))
    }

    /// Delete a folder.
    ///
    /// An empty subtree (no items anywhere beneath) is removed outright.
    /// A non-empty one requires `force`; contained items are then either
    /// soft-deleted and detached or hard-deleted per `mode`, and the whole
    /// subtree of folder rows goes away.
    #[tracing::instrument(skip(self), fields(folder_id = %id))]
    pub async fn delete(&self, id: Uuid, force: bool, mode: DeleteMode) -> AppResult<()> {
        let item_ids = {
            let state = self.state.read().await;
            let folder = state
                .folders
                .get(&id)
                .ok_or_else(|| AppError::NotFound(format!("Folder not found: {}", id)))?;
            if folder.is_system {
                return Err(AppError::Conflict("System folders cannot be deleted".to_string()));
            }

            let subtree = subtree_ids(&state, id);
            let item_ids: Vec<Uuid> = state
                .items
                .values()
                .filter(|m| m.folder_id.map(|f| subtree.contains(&f)).unwrap_or(false))
                .map(|m| m.id)
                .collect();

            if !item_ids.is_empty() && !force {
                return Err(AppError::FolderNotEmpty(format!(
                    "Folder contains {} items; pass force to delete them",
                    item_ids.len()
                )));
            }

            item_ids
        };

        match mode {
            DeleteMode::Hard => {
                // Each hard delete takes its own lock; storage I/O must not
                // happen under ours
                for item_id in &item_ids {
                    if let Err(e) = self.catalog.hard_delete(*item_id).await {
                        tracing::warn!(
                            media_id = %item_id,
                            error = %e,
                            "Failed to hard-delete item during folder cascade"
                        );
                    }
                }
            }
            DeleteMode::Soft => {
                let mut state = self.state.write().await;
                let now = Utc::now();
                for item_id in &item_ids {
                    if let Some(item) = state.items.get_mut(item_id) {
                        // The folder row is going away, so detach the item
                        item.folder_id = None;
                        if item.deleted_at.is_none() {
                            item.deleted_at = Some(now);
                        }
                        item.updated_at = now;
                    }
                }
            }
        }

        let mut state = self.state.write().await;
        // The subtree may have grown while the cascade ran: folders created
        // under it mid-cascade would otherwise survive with a dangling parent.
        // Recompute under the write lock and remove everything found.
        let subtree = subtree_ids(&state, id);
        for folder_id in &subtree {
            state.folders.remove(folder_id);
        }
        // Items ingested into the subtree while the cascade ran
        for item in state.items.values_mut() {
            if item.folder_id.map(|f| subtree.contains(&f)).unwrap_or(false) {
                item.folder_id = None;
            }
        }

        tracing::info!(
            folder_id = %id,
            folders_removed = subtree.len(),
            items_affected = item_ids.len(),
            "Folder deleted"
        );

        Ok(())
    }

    /// All folders, sorted by path
    pub async fn list(&self) -> Vec<Folder> {
        let state = self.state.read().await;
        let mut folders: Vec<Folder> = state.folders.values().cloned().collect();
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        folders
    }

    /// Direct children of a folder (None = root level), sorted by name
    pub async fn children(&self, parent_id: Option<Uuid>) -> Vec<Folder> {
        let state = self.state.read().await;
        let mut folders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.parent_id == parent_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        folders
    }

    /// Full folder tree from the roots down
    pub async fn tree(&self) -> Vec<FolderTreeNode> {
        let state = self.state.read().await;

        let mut by_parent: HashMap<Option<Uuid>, Vec<Folder>> = HashMap::new();
        for folder in state.folders.values() {
            by_parent.entry(folder.parent_id).or_default().push(folder.clone());
        }
        for folders in by_parent.values_mut() {
            folders.sort_by(|a, b| a.name.cmp(&b.name));
        }

        fn build(parent: Option<Uuid>, by_parent: &HashMap<Option<Uuid>, Vec<Folder>>) -> Vec<FolderTreeNode> {
            by_parent
                .get(&parent)
                .map(|folders| {
                    folders
                        .iter()
                        .map(|f| FolderTreeNode {
                            children: build(Some(f.id), by_parent),
                            folder: f.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        build(None, &by_parent)
    }

    /// Every folder beneath a folder, sorted by path
    pub async fn descendants(&self, id: Uuid) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        if !state.folders.contains_key(&id) {
            return Err(AppError::NotFound(format!("Folder not found: {}", id)));
        }

        let mut folders: Vec<Folder> = subtree_ids(&state, id)
            .into_iter()
            .filter(|f| *f != id)
            .filter_map(|f| state.folders.get(&f).cloned())
            .collect();
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(folders)
    }

    /// Breadcrumb trail from the root down to a folder
    pub async fn breadcrumbs(&self, id: Uuid) -> AppResult<Vec<FolderBreadcrumb>> {
        let state = self.state.read().await;

        let mut trail = Vec::new();
        let mut current = Some(id);

        while let Some(folder_id) = current {
            let folder = state
                .folders
                .get(&folder_id)
                .ok_or_else(|| AppError::NotFound(format!("Folder not found: {}", folder_id)))?;
            trail.push(FolderBreadcrumb {
                id: folder.id,
                name: folder.name.clone(),
                slug: folder.slug.clone(),
            });
            current = folder.parent_id;
        }

        trail.reverse();
        Ok(trail)
    }
}

fn sibling_slug_taken(
    state: &CatalogState,
    parent_id: Option<Uuid>,
    slug: &str,
    exclude: Option<Uuid>,
) -> bool {
    state
        .folders
        .values()
        .any(|f| f.parent_id == parent_id && f.slug == slug && Some(f.id) != exclude)
}

/// The folder's id plus every descendant's, discovered breadth-first
fn subtree_ids(state: &CatalogState, root: Uuid) -> Vec<Uuid> {
    let mut ids = vec![root];
    let mut frontier = vec![root];

    while let Some(parent) = frontier.pop() {
        for folder in state.folders.values() {
            if folder.parent_id == Some(parent) {
                ids.push(folder.id);
                frontier.push(folder.id);
            }
        }
    }

    ids
}

/// Recompute path and depth for a folder and all its descendants
fn rebuild_subtree_paths(state: &mut CatalogState, root: Uuid) {
    let Some(folder) = state.folders.get(&root) else {
        return;
    };

    let (path, depth) = match folder.parent_id.and_then(|p| state.folders.get(&p)) {
        Some(parent) => (format!("{}/{}", parent.path, folder.slug), parent.depth + 1),
        None => (folder.slug.clone(), 0),
    };

    let folder = state.folders.get_mut(&root).expect("folder checked above");
    folder.path = path;
    folder.depth = depth;

    let children: Vec<Uuid> = state
        .folders
        .values()
        .filter(|f| f.parent_id == Some(root))
        .map(|f| f.id)
        .collect();
    for child in children {
        rebuild_subtree_paths(state, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediastore_storage::LocalStorage;
    use tempfile::TempDir;

    async fn folder_manager(dir: &TempDir) -> FolderManager {
        let storage = Arc::new(
            LocalStorage::new(dir.path().to_path_buf(), "/media".to_string())
                .await
                .unwrap(),
        );
        let state = Arc::new(RwLock::new(CatalogState::new()));
        let catalog = MediaCatalog::new(state.clone(), storage);
        FolderManager::new(state, catalog)
    }

    fn create_request(name: &str, parent_id: Option<Uuid>) -> CreateFolderRequest {
        CreateFolderRequest {
            name: name.to_string(),
            parent_id,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_create_nested_paths() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let photos = manager.create(create_request("Photos", None)).await.unwrap();
        let year = manager
            .create(create_request("2024", Some(photos.id)))
            .await
            .unwrap();

        assert_eq!(photos.path, "photos");
        assert_eq!(photos.depth, 0);
        assert_eq!(year.path, "photos/2024");
        assert_eq!(year.depth, 1);
    }

    #[tokio::test]
    async fn test_sibling_slug_conflict() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        manager.create(create_request("Photos", None)).await.unwrap();
        let duplicate = manager.create(create_request("photos", None)).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        // Same slug under a different parent is fine
        let other = manager.create(create_request("Other", None)).await.unwrap();
        assert!(manager
            .create(create_request("Photos", Some(other.id)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rename_rebuilds_subtree_paths() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let photos = manager.create(create_request("Photos", None)).await.unwrap();
        let year = manager
            .create(create_request("2024", Some(photos.id)))
            .await
            .unwrap();

        manager
            .update(
                photos.id,
                UpdateFolderRequest {
                    name: Some("Pictures".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();

        let year = manager.get(year.id).await.unwrap();
        assert_eq!(year.path, "pictures/2024");
    }

    #[tokio::test]
    async fn test_move_into_own_subtree_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let a = manager.create(create_request("A", None)).await.unwrap();
        let b = manager.create(create_request("B", Some(a.id))).await.unwrap();

        let result = manager.move_folder(a.id, Some(b.id)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = manager.move_folder(a.id, Some(a.id)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_move_updates_depth_and_path() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let a = manager.create(create_request("A", None)).await.unwrap();
        let b = manager.create(create_request("B", None)).await.unwrap();
        let c = manager.create(create_request("C", Some(b.id))).await.unwrap();

        manager.move_folder(b.id, Some(a.id)).await.unwrap();

        let b = manager.get(b.id).await.unwrap();
        let c = manager.get(c.id).await.unwrap();
        assert_eq!(b.path, "a/b");
        assert_eq!(b.depth, 1);
        assert_eq!(c.path, "a/b/c");
        assert_eq!(c.depth, 2);
    }

    #[tokio::test]
    async fn test_delete_empty_subtree() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let a = manager.create(create_request("A", None)).await.unwrap();
        let b = manager.create(create_request("B", Some(a.id))).await.unwrap();

        manager.delete(a.id, false, DeleteMode::Soft).await.unwrap();
        assert!(manager.get(a.id).await.is_err());
        assert!(manager.get(b.id).await.is_err());
    }

    #[tokio::test]
    async fn test_breadcrumbs_root_to_leaf() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let a = manager.create(create_request("A", None)).await.unwrap();
        let b = manager.create(create_request("B", Some(a.id))).await.unwrap();
        let c = manager.create(create_request("C", Some(b.id))).await.unwrap();

        let trail = manager.breadcrumbs(c.id).await.unwrap();
        let slugs: Vec<&str> = trail.iter().map(|b| b.slug.as_str()).collect();
        assert_eq!(slugs, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_descendants_sorted_by_path() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let a = manager.create(create_request("A", None)).await.unwrap();
        let b = manager.create(create_request("B", Some(a.id))).await.unwrap();
        manager.create(create_request("C", Some(b.id))).await.unwrap();
        manager.create(create_request("Other", None)).await.unwrap();

        let descendants = manager.descendants(a.id).await.unwrap();
        let paths: Vec<&str> = descendants.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a/b", "a/b/c"]);

        assert!(manager.descendants(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn test_tree_structure() {
        let dir = TempDir::new().unwrap();
        let manager = folder_manager(&dir).await;

        let a = manager.create(create_request("A", None)).await.unwrap();
        manager.create(create_request("B", Some(a.id))).await.unwrap();
        manager.create(create_request("Z", None)).await.unwrap();

        let tree = manager.tree().await;
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].folder.name, "A");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].folder.name, "B");
        assert_eq!(tree[1].children.len(), 0);
    }
}
