//! Tree synchronizer: walks each configured root's descendant tree and
//! reconciles rendered documents into the destination store.
//!
//! The walk is depth-first, pre-order: a page is upserted before its children
//! are visited. Every retained descendant of a root lands in that root's
//! single destination folder (the source nesting is flattened). Reconciliation
//! is keyed on the originating page identifier stored as file metadata, never
//! on the filename.
//!
//! # Failure semantics
//! - A page fetch failure truncates that node's subtree and is recorded as a
//!   [`SubtreeGap`]; the run continues with the next sibling/root.
//! - A render or storage failure aborts only that node's upsert; children are
//!   still visited.
//! - A child-listing failure is recorded as a gap, not conflated with "no
//!   children".
//! - Nothing here retries; re-invocation of the whole run is the recovery
//!   mechanism.
//!
//! The walk is fully sequential. The reconciliation step is check-then-act
//! and is not safe under concurrent runs against the same destination folder.

use std::collections::HashSet;

use futures::future::BoxFuture;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{FetchedPage, NewDocument, PageFetcher, Renderer, Storage};

/// Aggregated result of one full synchronisation run.
#[derive(Debug)]
pub struct SyncReport {
    pub roots: Vec<RootReport>,
}

#[derive(Debug)]
pub struct RootReport {
    pub root_page_id: String,
    pub folder_name: String,
    pub folder_id: String,
    pub pages: Vec<PageOutcome>,
    pub gaps: Vec<SubtreeGap>,
}

#[derive(Debug)]
pub struct PageOutcome {
    pub page_id: String,
    pub title: String,
    pub action: PageAction,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PageAction {
    Created,
    Updated,
    Skipped,
    Failed(String),
}

/// A subtree that could not be synchronised; its pages may be stale or
/// absent in the destination until a later run reaches them.
#[derive(Debug)]
pub struct SubtreeGap {
    pub page_id: String,
    pub reason: String,
}

impl RootReport {
    pub fn outcome(&self, page_id: &str) -> Option<&PageOutcome> {
        self.pages.iter().find(|p| p.page_id == page_id)
    }
}

impl SyncReport {
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, PageAction::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, PageAction::Updated))
    }

    pub fn skipped(&self) -> usize {
        self.count(|a| matches!(a, PageAction::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|a| matches!(a, PageAction::Failed(_)))
    }

    pub fn gap_count(&self) -> usize {
        self.roots.iter().map(|r| r.gaps.len()).sum()
    }

    fn count(&self, pred: impl Fn(&PageAction) -> bool) -> usize {
        self.roots
            .iter()
            .flat_map(|r| &r.pages)
            .filter(|p| pred(&p.action))
            .count()
    }
}

/// Entrypoint: synchronise every configured root into the destination store.
/// Authentication happens before this is called; nothing in the walk itself
/// is fatal to the run.
pub async fn synchronise<F, S, R>(
    config: &SyncConfig,
    fetcher: &F,
    storage: &S,
    renderer: &R,
    root_folder_id: &str,
) -> SyncReport
where
    F: PageFetcher,
    S: Storage,
    R: Renderer,
{
    info!(roots = config.roots.len(), "[SYNC] Starting full synchronisation run");

    let mut roots_report = Vec::new();
    for root in &config.roots {
        info!(
            page_id = %root.page_id,
            folder = %root.folder_name,
            "[SYNC] Synchronising root"
        );
        let folder_id = match resolve_folder(storage, &root.folder_name, root_folder_id).await {
            Ok(id) => id,
            Err(e) => {
                error!(
                    folder = %root.folder_name,
                    error = ?e,
                    "[SYNC][ERROR] Failed to resolve destination folder, skipping root"
                );
                roots_report.push(RootReport {
                    root_page_id: root.page_id.clone(),
                    folder_name: root.folder_name.clone(),
                    folder_id: String::new(),
                    pages: Vec::new(),
                    gaps: vec![SubtreeGap {
                        page_id: root.page_id.clone(),
                        reason: format!("destination folder unavailable: {e}"),
                    }],
                });
                continue;
            }
        };

        let ctx = SyncContext {
            config,
            fetcher,
            storage,
            renderer,
        };
        let mut state = RootState {
            folder_id: folder_id.clone(),
            visited: HashSet::new(),
            pages: Vec::new(),
            gaps: Vec::new(),
        };
        ctx.visit(root.page_id.clone(), &mut state).await;

        roots_report.push(RootReport {
            root_page_id: root.page_id.clone(),
            folder_name: root.folder_name.clone(),
            folder_id,
            pages: state.pages,
            gaps: state.gaps,
        });
    }

    let report = SyncReport {
        roots: roots_report,
    };
    info!(
        created = report.created(),
        updated = report.updated(),
        skipped = report.skipped(),
        failed = report.failed(),
        gaps = report.gap_count(),
        "[SYNC] Synchronisation run complete"
    );
    report
}

/// Exact-name lookup under the fixed top-level folder, create when absent.
/// Lookup-then-create is not transactional; concurrent runs could create
/// duplicate folders, so the process must not run concurrently with itself.
async fn resolve_folder<S: Storage>(
    storage: &S,
    name: &str,
    parent_id: &str,
) -> Result<String, crate::contract::StorageError> {
    if let Some(id) = storage.find_folder(name, parent_id).await? {
        info!(folder = name, folder_id = %id, "[SYNC] Reusing existing destination folder");
        return Ok(id);
    }
    let id = storage.create_folder(name, parent_id).await?;
    info!(folder = name, folder_id = %id, "[SYNC] Created destination folder");
    Ok(id)
}

struct SyncContext<'a, F, S, R> {
    config: &'a SyncConfig,
    fetcher: &'a F,
    storage: &'a S,
    renderer: &'a R,
}

struct RootState {
    folder_id: String,
    visited: HashSet<String>,
    pages: Vec<PageOutcome>,
    gaps: Vec<SubtreeGap>,
}

impl<'c, F, S, R> SyncContext<'c, F, S, R>
where
    F: PageFetcher,
    S: Storage,
    R: Renderer,
{
    /// Depth-first pre-order visit: upsert this page, then recurse into its
    /// direct children, all into the root's single destination folder.
    fn visit<'a>(&'a self, page_id: String, state: &'a mut RootState) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            // the source is trusted to be a tree, but not blindly
            if !state.visited.insert(page_id.clone()) {
                error!(
                    page_id = %page_id,
                    "[SYNC][ERROR] Page already visited in this run, refusing to recurse"
                );
                state.gaps.push(SubtreeGap {
                    page_id,
                    reason: "cycle detected".into(),
                });
                return;
            }

            let page = match self.fetcher.fetch_page(&page_id).await {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        page_id = %page_id,
                        status = e.status_code,
                        "[SYNC][ERROR] Page fetch failed, skipping subtree: {}",
                        e.message
                    );
                    state.gaps.push(SubtreeGap {
                        page_id,
                        reason: format!("fetch failed: {e}"),
                    });
                    return;
                }
            };

            if self.config.is_excluded(&page.title) {
                info!(
                    page_id = %page_id,
                    title = %page.title,
                    "[SYNC] Skipping excluded page (children still visited)"
                );
                state.pages.push(PageOutcome {
                    page_id: page_id.clone(),
                    title: page.title.clone(),
                    action: PageAction::Skipped,
                });
            } else {
                let action = self.upsert(&page_id, &page, &state.folder_id).await;
                state.pages.push(PageOutcome {
                    page_id: page_id.clone(),
                    title: page.title.clone(),
                    action,
                });
            }

            let children = match self.fetcher.fetch_children(&page_id).await {
                Ok(children) => children,
                Err(e) => {
                    warn!(
                        page_id = %page_id,
                        status = e.status_code,
                        "[SYNC] Child listing unavailable, subtree incomplete: {}",
                        e.message
                    );
                    state.gaps.push(SubtreeGap {
                        page_id: page_id.clone(),
                        reason: format!("children unknown: {e}"),
                    });
                    return;
                }
            };
            for child in children {
                self.visit(child.id, state).await;
            }
        })
    }

    /// Render the page and reconcile it against the destination folder by
    /// page identifier: overwrite the linked file in place when one exists
    /// (rewriting its name in case the title changed), create it otherwise.
    async fn upsert(&self, page_id: &str, page: &FetchedPage, folder_id: &str) -> PageAction {
        let file_name = format!("{}.pdf", page.title);

        let content = match self.renderer.render(&page.title, &page.body_text) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    page_id,
                    title = %page.title,
                    error = ?e,
                    "[SYNC][ERROR] Render failed, skipping upsert"
                );
                return PageAction::Failed(format!("render failed: {e:?}"));
            }
        };

        let existing = match self.storage.find_document(page_id, folder_id).await {
            Ok(existing) => existing,
            Err(e) => {
                error!(
                    page_id,
                    error = ?e,
                    "[SYNC][ERROR] Destination lookup failed, skipping upsert"
                );
                return PageAction::Failed(format!("destination lookup failed: {e}"));
            }
        };

        match existing {
            Some(stored) => {
                if stored.name != file_name {
                    info!(
                        page_id,
                        old_name = %stored.name,
                        new_name = %file_name,
                        "[SYNC] Page renamed since last run, rewriting destination name"
                    );
                }
                match self
                    .storage
                    .update_document(&stored.file_id, &file_name, &content)
                    .await
                {
                    Ok(()) => {
                        info!(page_id, file_id = %stored.file_id, name = %file_name, "[SYNC] Updated");
                        PageAction::Updated
                    }
                    Err(e) => {
                        error!(page_id, error = ?e, "[SYNC][ERROR] Update failed");
                        PageAction::Failed(format!("update failed: {e}"))
                    }
                }
            }
            None => {
                let req = NewDocument {
                    name: &file_name,
                    parent_id: folder_id,
                    content: &content,
                    source_page_id: page_id,
                };
                match self.storage.create_document(req).await {
                    Ok(file_id) => {
                        info!(page_id, file_id = %file_id, name = %file_name, "[SYNC] Created");
                        PageAction::Created
                    }
                    Err(e) => {
                        error!(page_id, error = ?e, "[SYNC][ERROR] Create failed");
                        PageAction::Failed(format!("create failed: {e}"))
                    }
                }
            }
        }
    }
}
