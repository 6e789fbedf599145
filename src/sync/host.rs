//! Host adapter boundary.
//!
//! Defines the primitives an outliner must expose for reconciliation and an
//! in-memory host used by tests and the command-line front end.

use crate::core::{NodeId, OutlineNode, OutlineTree};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::reconcile::Stage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("node not found: {0}")]
    NotFound(NodeId),
    #[error("unknown document: {0}")]
    UnknownDocument(String),
    #[error("host rejected the operation: {0}")]
    Rejected(String),
    #[error("host state lock poisoned")]
    Poisoned,
}

/// Tree read and mutation primitives supplied by the host outliner.
///
/// Every mutation either completes or reports a descriptive failure.
#[async_trait]
pub trait OutlineHost: Send + Sync {
    /// Current snapshot of the outline stored under `key`.
    async fn read_tree(&self, key: &str) -> Result<OutlineTree, HostError>;

    async fn update_text(&self, id: &NodeId, text: &str) -> Result<(), HostError>;

    /// Moves `id` (with its subtree) under `parent` at position `order`.
    async fn move_node(&self, id: &NodeId, parent: &NodeId, order: usize) -> Result<(), HostError>;

    /// Creates a leaf under `parent` at position `order`, returning its identity.
    async fn create_node(
        &self,
        parent: &NodeId,
        order: usize,
        text: &str,
    ) -> Result<NodeId, HostError>;

    /// Deletes `id` together with its subtree.
    async fn delete_node(&self, id: &NodeId) -> Result<(), HostError>;
}

/// A mutation call observed by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    UpdateText {
        id: NodeId,
        text: String,
    },
    Move {
        id: NodeId,
        parent: NodeId,
        order: usize,
    },
    Create {
        id: NodeId,
        parent: NodeId,
        order: usize,
        text: String,
    },
    Delete {
        id: NodeId,
    },
}

impl MutationRecord {
    pub fn stage(&self) -> Stage {
        match self {
            MutationRecord::UpdateText { .. } => Stage::Update,
            MutationRecord::Move { .. } => Stage::Move,
            MutationRecord::Create { .. } => Stage::Create,
            MutationRecord::Delete { .. } => Stage::Delete,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    trees: HashMap<String, OutlineTree>,
    log: Vec<MutationRecord>,
    failures: Vec<Stage>,
}

/// Outline host backed by in-memory trees.
///
/// Records every successful mutation in call order and can be told to fail
/// the next call of a given stage.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tree(key: impl Into<String>, tree: OutlineTree) -> Self {
        let state = MemoryState {
            trees: HashMap::from([(key.into(), tree)]),
            ..MemoryState::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn insert_tree(&self, key: impl Into<String>, tree: OutlineTree) -> Result<(), HostError> {
        self.lock()?.trees.insert(key.into(), tree);
        Ok(())
    }

    /// Snapshot of the outline stored under `key`.
    pub fn tree(&self, key: &str) -> Result<OutlineTree, HostError> {
        self.lock()?
            .trees
            .get(key)
            .cloned()
            .ok_or_else(|| HostError::UnknownDocument(key.to_string()))
    }

    /// Mutations applied so far, in call order.
    pub fn mutations(&self) -> Result<Vec<MutationRecord>, HostError> {
        Ok(self.lock()?.log.clone())
    }

    pub fn clear_mutations(&self) -> Result<(), HostError> {
        self.lock()?.log.clear();
        Ok(())
    }

    /// Makes the next call of `stage` fail with [`HostError::Rejected`].
    pub fn fail_next(&self, stage: Stage) -> Result<(), HostError> {
        self.lock()?.failures.push(stage);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, HostError> {
        self.state.lock().map_err(|_| HostError::Poisoned)
    }
}

impl MemoryState {
    fn take_failure(&mut self, stage: Stage) -> Result<(), HostError> {
        if let Some(position) = self.failures.iter().position(|s| *s == stage) {
            self.failures.remove(position);
            return Err(HostError::Rejected(format!("injected {stage} failure")));
        }
        Ok(())
    }

    fn tree_holding_mut(&mut self, id: &NodeId) -> Option<&mut OutlineTree> {
        self.trees
            .values_mut()
            .find(|tree| tree.root == *id || find_node(&tree.children, id).is_some())
    }

    /// Children list of `parent`, which may be a tree root or any node.
    fn children_of_mut(&mut self, parent: &NodeId) -> Option<&mut Vec<OutlineNode>> {
        let tree = self.tree_holding_mut(parent)?;
        if tree.root == *parent {
            return Some(&mut tree.children);
        }
        find_node_mut(&mut tree.children, parent).map(|node| &mut node.children)
    }
}

fn find_node<'a>(nodes: &'a [OutlineNode], id: &NodeId) -> Option<&'a OutlineNode> {
    for node in nodes {
        if node.id == *id {
            return Some(node);
        }
        if let Some(found) = find_node(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_node_mut<'a>(nodes: &'a mut [OutlineNode], id: &NodeId) -> Option<&'a mut OutlineNode> {
    for node in nodes.iter_mut() {
        if node.id == *id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Removes `id` and returns it with its subtree.
fn detach(nodes: &mut Vec<OutlineNode>, id: &NodeId) -> Option<OutlineNode> {
    if let Some(position) = nodes.iter().position(|node| node.id == *id) {
        return Some(nodes.remove(position));
    }
    nodes
        .iter_mut()
        .find_map(|node| detach(&mut node.children, id))
}

#[async_trait]
impl OutlineHost for MemoryHost {
    async fn read_tree(&self, key: &str) -> Result<OutlineTree, HostError> {
        self.tree(key)
    }

    async fn update_text(&self, id: &NodeId, text: &str) -> Result<(), HostError> {
        let mut state = self.lock()?;
        state.take_failure(Stage::Update)?;
        let tree = state
            .tree_holding_mut(id)
            .ok_or_else(|| HostError::NotFound(id.clone()))?;
        let node = find_node_mut(&mut tree.children, id)
            .ok_or_else(|| HostError::Rejected(format!("cannot edit page root {id}")))?;
        node.text = text.to_string();
        state.log.push(MutationRecord::UpdateText {
            id: id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn move_node(&self, id: &NodeId, parent: &NodeId, order: usize) -> Result<(), HostError> {
        let mut state = self.lock()?;
        state.take_failure(Stage::Move)?;
        {
            let tree = state
                .tree_holding_mut(id)
                .ok_or_else(|| HostError::NotFound(id.clone()))?;
            let node =
                find_node(&tree.children, id).ok_or_else(|| HostError::NotFound(id.clone()))?;
            if node.id == *parent || find_node(&node.children, parent).is_some() {
                return Err(HostError::Rejected(format!(
                    "cannot move {id} into its own subtree"
                )));
            }
        }
        if state.children_of_mut(parent).is_none() {
            return Err(HostError::NotFound(parent.clone()));
        }
        let tree = state
            .tree_holding_mut(id)
            .ok_or_else(|| HostError::NotFound(id.clone()))?;
        let node = detach(&mut tree.children, id).ok_or_else(|| HostError::NotFound(id.clone()))?;
        let siblings = state
            .children_of_mut(parent)
            .ok_or_else(|| HostError::NotFound(parent.clone()))?;
        let position = order.min(siblings.len());
        siblings.insert(position, node);
        state.log.push(MutationRecord::Move {
            id: id.clone(),
            parent: parent.clone(),
            order,
        });
        Ok(())
    }

    async fn create_node(
        &self,
        parent: &NodeId,
        order: usize,
        text: &str,
    ) -> Result<NodeId, HostError> {
        let mut state = self.lock()?;
        state.take_failure(Stage::Create)?;
        let id = NodeId::new(Uuid::new_v4().simple().to_string());
        let siblings = state
            .children_of_mut(parent)
            .ok_or_else(|| HostError::NotFound(parent.clone()))?;
        let position = order.min(siblings.len());
        siblings.insert(position, OutlineNode::new(id.clone(), text));
        state.log.push(MutationRecord::Create {
            id: id.clone(),
            parent: parent.clone(),
            order,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn delete_node(&self, id: &NodeId) -> Result<(), HostError> {
        let mut state = self.lock()?;
        state.take_failure(Stage::Delete)?;
        let tree = state
            .tree_holding_mut(id)
            .ok_or_else(|| HostError::NotFound(id.clone()))?;
        detach(&mut tree.children, id).ok_or_else(|| {
            HostError::Rejected(format!("cannot delete page root {id}"))
        })?;
        state.log.push(MutationRecord::Delete { id: id.clone() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flatten;

    fn host() -> MemoryHost {
        let tree = OutlineTree::new("page").with_children(vec![
            OutlineNode::new("a", "A").with_children(vec![OutlineNode::new("b", "B")]),
            OutlineNode::new("c", "C"),
        ]);
        MemoryHost::with_tree("page", tree)
    }

    fn shape(host: &MemoryHost) -> Vec<(String, usize)> {
        let tree = host.tree("page").unwrap();
        flatten(&tree.children)
            .into_iter()
            .map(|e| (e.text, e.level))
            .collect()
    }

    #[tokio::test]
    async fn test_move_carries_subtree() {
        let host = host();
        host.move_node(&"a".into(), &"c".into(), 0).await.unwrap();
        assert_eq!(
            shape(&host),
            vec![("C".into(), 1), ("A".into(), 2), ("B".into(), 3)]
        );
    }

    #[tokio::test]
    async fn test_move_into_own_subtree_rejected() {
        let host = host();
        let err = host.move_node(&"a".into(), &"b".into(), 0).await.unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
        assert!(host.mutations().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_clamps_order() {
        let host = host();
        let id = host.create_node(&"page".into(), 99, "D").await.unwrap();
        let tree = host.tree("page").unwrap();
        assert_eq!(tree.children.last().map(|n| n.id.clone()), Some(id));
    }

    #[tokio::test]
    async fn test_delete_removes_subtree() {
        let host = host();
        host.delete_node(&"a".into()).await.unwrap();
        assert_eq!(shape(&host), vec![("C".into(), 1)]);
        let err = host.delete_node(&"b".into()).await.unwrap_err();
        assert_eq!(err, HostError::NotFound("b".into()));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let host = host();
        host.fail_next(Stage::Update).unwrap();
        assert!(host.update_text(&"a".into(), "x").await.is_err());
        host.update_text(&"a".into(), "x").await.unwrap();
        let log = host.mutations().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].stage(), Stage::Update);
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let host = MemoryHost::new();
        let err = host.read_tree("missing").await.unwrap_err();
        assert_eq!(err, HostError::UnknownDocument("missing".into()));
    }

    #[tokio::test]
    async fn test_poisoned_state_is_reported() {
        let host = std::sync::Arc::new(host());
        let holder = std::sync::Arc::clone(&host);
        let joined = std::thread::spawn(move || {
            let _guard = holder.state.lock().unwrap();
            panic!("poison the host state");
        })
        .join();
        assert!(joined.is_err());

        let err = host.update_text(&"a".into(), "x").await.unwrap_err();
        assert_eq!(err, HostError::Poisoned);
        assert_eq!(err.to_string(), "host state lock poisoned");
        assert_eq!(host.tree("page").unwrap_err(), HostError::Poisoned);
        assert_eq!(host.mutations().unwrap_err(), HostError::Poisoned);
    }
}
