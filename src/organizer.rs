//! Files renamed downloads into a per-customer folder tree in the remote
//! document store.
//!
//! The store itself (HTTP client, auth, retries) lives behind [`DocumentStore`].

use crate::config::OrganizerSettings;
use crate::naming::sanitize_name;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Folder used when a keyword has no configured route.
pub const FALLBACK_ROUTE: &str = "/Extra";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("destination path missing: {0}")]
    NotFound(String),

    #[error("invalid local file: {0}")]
    InvalidFile(PathBuf),

    #[error("document store request failed: {0}")]
    Request(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An item (file or folder) in the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub id: String,
    pub name: String,
}

/// The remote document store, addressed by `/`-separated paths.
pub trait DocumentStore: Send + Sync {
    /// Creates the folder at `path` if missing and returns it.
    fn ensure_folder(&self, path: &str) -> Result<FileRef, StoreError>;

    /// Uploads `local_file` to `target_path` (file path including name).
    fn upload_small(&self, target_path: &str, local_file: &Path) -> Result<FileRef, StoreError>;

    fn move_item(
        &self,
        item_id: &str,
        new_parent_id: &str,
        new_name: &str,
    ) -> Result<FileRef, StoreError>;

    fn get_by_path(&self, path: &str) -> Result<Option<FileRef>, StoreError>;
}

pub struct Organizer<'a, S: DocumentStore> {
    settings: &'a OrganizerSettings,
    store: &'a S,
}

impl<'a, S: DocumentStore> Organizer<'a, S> {
    pub fn new(settings: &'a OrganizerSettings, store: &'a S) -> Self {
        Organizer { settings, store }
    }

    /// Store path of a customer's folder.
    pub fn customer_path(&self, customer: &str) -> String {
        format!(
            "{}/{}",
            self.settings.customer_root_path.trim_end_matches('/'),
            sanitize_name(customer)
        )
    }

    /// Customer-relative folder for a keyword acronym, `/Extra` if unrouted.
    pub fn route_keyword(&self, keyword_acr: &str) -> &str {
        self.settings
            .routing
            .get(keyword_acr)
            .map(String::as_str)
            .unwrap_or(FALLBACK_ROUTE)
    }

    /// Makes sure the customer folder and its default subtree exist.
    ///
    /// Returns the subtree folders keyed by their customer-relative path.
    pub fn ensure_customer_tree(&self, customer: &str) -> Result<BTreeMap<String, FileRef>, StoreError> {
        let customer_path = self.customer_path(customer);
        self.ensure_with_parents(&customer_path)?;

        let mut made = BTreeMap::new();
        for sub in &self.settings.create_default_tree {
            let folder = self.ensure_with_parents(&format!("{customer_path}{sub}"))?;
            made.insert(sub.clone(), folder);
        }
        Ok(made)
    }

    /// Moves an already uploaded item into the customer's folder for `keyword_acr`.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the routed folder does not exist
    /// after the tree was ensured, or whatever the store reports.
    pub fn move_uploaded_to_customer(
        &self,
        uploaded: &FileRef,
        customer: &str,
        keyword_acr: &str,
    ) -> Result<FileRef, StoreError> {
        self.ensure_customer_tree(customer)?;

        let dest_path = format!("{}{}", self.customer_path(customer), self.route_keyword(keyword_acr));
        let dest = self
            .store
            .get_by_path(&dest_path)?
            .ok_or(StoreError::NotFound(dest_path))?;

        self.store.move_item(&uploaded.id, &dest.id, &uploaded.name)
    }

    /// Uploads a renamed local file to the downloads staging folder, then
    /// files it under the customer.
    pub fn file_upload(
        &self,
        local_file: &Path,
        customer: &str,
        keyword_acr: &str,
    ) -> Result<FileRef, StoreError> {
        let name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StoreError::InvalidFile(local_file.to_path_buf()))?;

        let target = format!(
            "{}/{}",
            self.settings.downloads_folder_path.trim_end_matches('/'),
            name
        );
        let uploaded = self.store.upload_small(&target, local_file)?;
        let moved = self.move_uploaded_to_customer(&uploaded, customer, keyword_acr)?;

        info!(file = %name, customer, keyword = keyword_acr, "filed upload");
        Ok(moved)
    }

    fn ensure_with_parents(&self, path: &str) -> Result<FileRef, StoreError> {
        let mut current = String::new();
        let mut last = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            last = Some(self.store.ensure_folder(&current)?);
        }
        last.ok_or_else(|| StoreError::NotFound(path.to_owned()))
    }
}
