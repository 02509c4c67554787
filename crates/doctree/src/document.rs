//! Document-service interfaces.
//!
//! Stored documents carry their body as a serialized tree in `state`. Only
//! the shapes and contracts live here; storage, transport and identity are
//! provided by the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::Source;
use crate::service::{DocumentConverter, ExportFormat};
use crate::Result;
use doctree_core::SerializedTree;

/// A stored document owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Serialized tree, absent for documents never edited
    #[serde(default)]
    pub state: Option<Value>,
    /// Free-form metadata kept alongside the document
    #[serde(default)]
    pub extra: Option<Value>,
}

/// Fields accepted when creating a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub title: String,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub extra: Option<Value>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub extra: Option<Value>,
}

impl Document {
    /// Apply a partial update in place
    pub fn apply(&mut self, patch: DocumentPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(state) = patch.state {
            self.state = Some(state);
        }
        if let Some(extra) = patch.extra {
            self.extra = Some(extra);
        }
    }
}

/// A document rendered for download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub id: String,
    pub title: String,
    pub content: String,
}

/// Render a document's body; a document without state exports empty content
pub fn export_document(
    converter: &DocumentConverter,
    document: &Document,
    format: ExportFormat,
) -> Result<ExportedDocument> {
    let content = match &document.state {
        None | Some(Value::Null) => String::new(),
        Some(state) => {
            let serialized = SerializedTree::from_value(state.clone())?;
            converter
                .runtime()
                .with_tree(Source::Serialized(serialized), |session| match format {
                    ExportFormat::Html => session.to_html(),
                    ExportFormat::Markdown => session.to_markdown(),
                })?
        }
    };

    Ok(ExportedDocument {
        id: document.id.clone(),
        title: document.title.clone(),
        content,
    })
}

/// Column a document listing is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// One page of a document listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub order_by: OrderBy,
    pub order: SortOrder,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            order_by: OrderBy::default(),
            order: SortOrder::default(),
        }
    }
}

impl ListRequest {
    /// Number of items to skip; pages below 1 count as the first page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub total: u64,
    pub pages: u64,
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(request: &ListRequest, total: u64, items: Vec<T>) -> Self {
        let pages = if request.page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(request.page_size))
        };
        Self {
            total,
            pages,
            page: request.page,
            page_size: request.page_size,
            items,
        }
    }
}

/// Persistence of documents, always scoped to the owning user.
///
/// Deleted documents are soft-deleted: they stop appearing in every read but
/// are kept by the store.
pub trait DocumentStore {
    type Error: std::error::Error;

    fn create(&self, user_id: &str, draft: DocumentDraft) -> std::result::Result<Document, Self::Error>;

    fn get(&self, id: &str, user_id: &str) -> std::result::Result<Option<Document>, Self::Error>;

    /// Apply a patch; `None` when the document does not exist for this user
    fn update(
        &self,
        id: &str,
        user_id: &str,
        patch: DocumentPatch,
    ) -> std::result::Result<Option<Document>, Self::Error>;

    /// Returns whether a document was deleted
    fn soft_delete(&self, id: &str, user_id: &str) -> std::result::Result<bool, Self::Error>;

    fn list(
        &self,
        user_id: &str,
        request: &ListRequest,
    ) -> std::result::Result<ListResponse<Document>, Self::Error>;

    /// Documents among `ids` owned by the user; missing ids are skipped
    fn get_many(&self, ids: &[String], user_id: &str) -> std::result::Result<Vec<Document>, Self::Error>;
}

/// Failure to establish who is calling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Authorization not provided")]
    CredentialAbsent,

    #[error("Authorization invalid")]
    CredentialInvalid,

    #[error("Users service is not available")]
    ServiceUnavailable,
}

/// Maps a request credential to a user id
pub trait IdentityResolver {
    fn resolve(&self, credential: Option<&str>) -> std::result::Result<String, IdentityError>;
}
