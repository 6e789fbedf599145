//! Shared page orchestration for one workspace.
//!
//! A [`Session`] ties a host outliner to the synchronization layer: it
//! calculates the document for a local page, applies documents received from
//! peers, and keeps the last known document per page in the process-wide
//! [`store`](crate::storage::store).

use crate::config::SyncConfig;
use crate::core::mark::Document;
use crate::storage::{StoreError, store, store_key};
use crate::sync::{HostError, OutlineHost, ReconcileError, ReconcileReport};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Host error: {0}")]
    Host(#[from] HostError),
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub workspace: String,
    pub config: SyncConfig,
}

impl Session {
    pub fn new(workspace: impl Into<String>, config: SyncConfig) -> Self {
        Self {
            workspace: workspace.into(),
            config,
        }
    }

    /// Document describing the page as it currently stands in the host.
    pub async fn calculate_state<H: OutlineHost + ?Sized>(
        &self,
        host: &H,
        page: &str,
    ) -> Result<Document, SessionError> {
        let tree = host.read_tree(page).await?;
        Ok(crate::sync::tree_to_document(
            &tree,
            self.config.default_view_type,
        ))
    }

    /// Calculates the page's document and records it as the last known state.
    pub async fn refresh<H: OutlineHost + ?Sized>(
        &self,
        host: &H,
        page: &str,
    ) -> Result<Document, SessionError> {
        let document = self.calculate_state(host, page).await?;
        self.save_state(page, document.clone())?;
        info!(
            workspace = %self.workspace,
            page,
            blocks = document.blocks().count(),
            "refreshed page state"
        );
        Ok(document)
    }

    /// Reconciles the page against `document`, then records it.
    ///
    /// The document is recorded only when every mutation succeeded.
    pub async fn apply_state<H: OutlineHost + ?Sized>(
        &self,
        host: &H,
        page: &str,
        document: &Document,
    ) -> Result<ReconcileReport, SessionError> {
        let report = crate::sync::apply_document(host, page, document, &self.config).await?;
        self.save_state(page, document.clone())?;
        info!(
            workspace = %self.workspace,
            page,
            mutations = report.total(),
            "applied page state"
        );
        Ok(report)
    }

    pub fn load_state(&self, page: &str) -> Result<Option<Document>, SessionError> {
        Ok(store().load(&self.key(page))?)
    }

    pub fn save_state(&self, page: &str, document: Document) -> Result<(), SessionError> {
        store().save(&self.key(page), document)?;
        Ok(())
    }

    pub fn remove_state(&self, page: &str) -> Result<(), SessionError> {
        store().remove(&self.key(page))?;
        Ok(())
    }

    fn key(&self, page: &str) -> String {
        store_key(&self.workspace, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OutlineNode, OutlineTree};
    use crate::sync::{MemoryHost, Stage};

    fn host() -> MemoryHost {
        MemoryHost::with_tree(
            "Page",
            OutlineTree::new("root").with_children(vec![
                OutlineNode::new("a", "**one**").with_children(vec![OutlineNode::new("b", "two")]),
            ]),
        )
    }

    #[tokio::test]
    async fn test_refresh_records_state() {
        let session = Session::new("session-refresh", SyncConfig::default());
        let host = host();
        let document = session.refresh(&host, "Page").await.unwrap();
        assert_eq!(document.content, "onetwo");
        assert_eq!(session.load_state("Page").unwrap(), Some(document));
        session.remove_state("Page").unwrap();
        assert_eq!(session.load_state("Page").unwrap(), None);
    }

    #[tokio::test]
    async fn test_apply_state_converges_and_records() {
        let session = Session::new("session-apply", SyncConfig::default());
        let source = host();
        let document = session.calculate_state(&source, "Page").await.unwrap();

        let target = MemoryHost::with_tree("Page", OutlineTree::new("other-root"));
        let report = session.apply_state(&target, "Page", &document).await.unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(
            session.calculate_state(&target, "Page").await.unwrap(),
            document
        );
        assert_eq!(session.load_state("Page").unwrap(), Some(document));
        session.remove_state("Page").unwrap();
    }

    #[tokio::test]
    async fn test_failed_apply_does_not_record() {
        let session = Session::new("session-fail", SyncConfig::default());
        let document = session.calculate_state(&host(), "Page").await.unwrap();
        let target = MemoryHost::with_tree("Page", OutlineTree::new("r"));
        target.fail_next(Stage::Create).unwrap();
        let err = session
            .apply_state(&target, "Page", &document)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Reconcile(_)));
        assert_eq!(session.load_state("Page").unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_page() {
        let session = Session::new("session-missing", SyncConfig::default());
        let err = session
            .calculate_state(&MemoryHost::new(), "Nope")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Host(HostError::UnknownDocument(_))));
    }
}
