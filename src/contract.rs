//! # contract: trait seams between the synchronizer and its collaborators
//!
//! This module defines the three external capabilities the tree synchronizer
//! calls through narrow interfaces: reading pages from the source system
//! ([`PageFetcher`]), laying content out as a document ([`Renderer`]) and
//! upserting into the destination store ([`Storage`]).
//!
//! ## Interface & Extensibility
//! - Implement [`PageFetcher`] for a new source system, [`Storage`] for a new
//!   destination store.
//! - Async methods return boxed error trait objects at the storage seam; the
//!   fetch seam uses the typed [`FetchError`] so callers can act on status.
//!
//! ## Mocking & Testing
//! - All traits are annotated for `mockall`, so the integration tests drive
//!   the synchronizer with deterministic mocks and no network.

use async_trait::async_trait;

use mockall::automock;

/// Minimal identifier+title view of a source page. The identifier is the
/// durable key; the title is mutable and only used for exclusion matching
/// and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub id: String,
    pub title: String,
}

/// A page's title and normalized plain-text body as returned by the source
/// system. Constructed per visit and consumed immediately by the renderer.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub title: String,
    pub body_text: String,
}

/// Non-success response from the source system. A transport-level failure
/// (no HTTP status available) carries status code 0.
#[derive(Debug, Clone)]
pub struct FetchError {
    pub status_code: u16,
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "source API returned status {}: {}",
            self.status_code, self.message
        )
    }
}

impl std::error::Error for FetchError {}

/// Trait for reading a page's rendered content and its direct child listing
/// from the source system. Recursion is the caller's responsibility; each
/// call does one level of work.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page's title and body, normalized to plain text. An empty
    /// body is replaced by a literal placeholder so downstream rendering
    /// always has non-empty input.
    async fn fetch_page(&self, page_id: &str) -> Result<FetchedPage, FetchError>;

    /// Fetch the page's direct children, in source order. A failure here is
    /// distinct from an empty listing: the caller reports it as a subtree gap
    /// instead of treating the subtree as childless.
    async fn fetch_children(&self, page_id: &str) -> Result<Vec<PageNode>, FetchError>;
}

/// Error type for destination store operations (simple boxed error).
pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// A file already present in the destination store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub file_id: String,
    pub name: String,
    /// The originating page identifier from the file's metadata. Legacy
    /// files written without the link carry `None` and are never matched.
    pub source_page_id: Option<String>,
}

/// The data needed to create a new destination file.
pub struct NewDocument<'a> {
    /// Destination filename, e.g. `"{title}.pdf"`.
    pub name: &'a str,
    /// Destination folder the file is created in.
    pub parent_id: &'a str,
    /// Rendered document bytes.
    pub content: &'a [u8],
    /// Originating page identifier, stored as file metadata. This is the
    /// reconciliation key for later runs.
    pub source_page_id: &'a str,
}

/// Trait for the destination store: folder resolution and identifier-keyed
/// file upsert. Implemented by the real cloud client and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Find a folder by exact name directly under `parent_id`.
    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>, StorageError>;

    /// Create a folder named `name` directly under `parent_id`.
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StorageError>;

    /// Find the document in `parent_id` whose metadata links it to
    /// `source_page_id`. One metadata-keyed lookup, independent of the
    /// file's current name, so renamed pages still reconcile.
    async fn find_document(
        &self,
        source_page_id: &str,
        parent_id: &str,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Create a new document carrying the source page id as metadata.
    async fn create_document<'a>(&self, req: NewDocument<'a>) -> Result<String, StorageError>;

    /// Overwrite an existing document's content and name in place; the file
    /// identifier and metadata are preserved.
    async fn update_document(
        &self,
        file_id: &str,
        name: &str,
        content: &[u8],
    ) -> Result<(), StorageError>;
}

#[derive(Debug)]
pub enum RenderError {
    /// Both title and body were empty; there is nothing to lay out.
    EmptyInput,
    Other(String),
}

/// Trait for rendering a title and plain-text body into a paginated document.
/// Font and styling choices belong to the implementation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Renderer: Send + Sync {
    fn render(&self, title: &str, body_text: &str) -> Result<Vec<u8>, RenderError>;
}
