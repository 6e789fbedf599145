//! Positional reconciliation of an outline against expected blocks.
//!
//! [`plan`] compares expected blocks with the flattened tree index by index
//! and produces an ordered list of [`Mutation`]s. [`apply_plan`] drains that
//! list through a single worker: each mutation is awaited before the next one
//! is taken, and the first failure stops the pass. Mutations already applied
//! are not rolled back.

use super::host::{HostError, OutlineHost};
use super::{ExpectedBlock, expected_blocks};
use crate::config::SyncConfig;
use crate::core::mark::Document;
use crate::core::{FlatEntry, NodeId, ROOT_CHILD_LEVEL};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Update,
    Move,
    Create,
    Delete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Update => "update",
            Stage::Move => "move",
            Stage::Create => "create",
            Stage::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Parent of a moved or created node, relative to the expected block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentRef {
    /// The page root.
    Root,
    /// Whichever node occupies expected position `n` once earlier steps ran.
    Entry(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    UpdateText {
        index: usize,
        id: NodeId,
        text: String,
    },
    Move {
        index: usize,
        id: NodeId,
        parent: ParentRef,
        order: usize,
    },
    Create {
        index: usize,
        parent: ParentRef,
        order: usize,
        text: String,
    },
    /// `index` is the position in the actual (flattened) tree.
    Delete { index: usize, id: NodeId },
}

impl Mutation {
    pub fn stage(&self) -> Stage {
        match self {
            Mutation::UpdateText { .. } => Stage::Update,
            Mutation::Move { .. } => Stage::Move,
            Mutation::Create { .. } => Stage::Create,
            Mutation::Delete { .. } => Stage::Delete,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Mutation::UpdateText { index, .. }
            | Mutation::Move { index, .. }
            | Mutation::Create { index, .. }
            | Mutation::Delete { index, .. } => *index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("failed to read outline {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: HostError,
    },
    #[error("failed to {stage} block {index}: {source}")]
    Mutation {
        stage: Stage,
        index: usize,
        #[source]
        source: HostError,
    },
    #[error("no node placed for the parent of block {index}")]
    UnresolvedParent { index: usize },
}

impl ReconcileError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ReconcileError::Mutation { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub updated: usize,
    pub moved: usize,
    pub created: usize,
    pub deleted: usize,
}

impl ReconcileReport {
    pub fn total(&self) -> usize {
        self.updated + self.moved + self.created + self.deleted
    }

    pub fn is_noop(&self) -> bool {
        self.total() == 0
    }

    fn record(&mut self, stage: Stage) {
        match stage {
            Stage::Update => self.updated += 1,
            Stage::Move => self.moved += 1,
            Stage::Create => self.created += 1,
            Stage::Delete => self.deleted += 1,
        }
    }
}

/// Plans the mutations that bring `actual` in line with `expected`.
///
/// Positions are compared by index, not identity. Text is rewritten only when
/// it differs, and a node is moved only when its level differs, so an
/// already-converged tree yields an empty plan.
///
/// Levels are tracked as the planned mutations leave them: a move carries the
/// node's subtree, so its descendants are compared at their new depth. Before
/// a node is outdented, the entries that follow its subtree and sit deeper
/// than its new level are moved under it, so they travel with it instead of
/// being left ahead of it under the old parent. Every move therefore keeps
/// the flattened order, and one pass converges.
pub fn plan(expected: &[ExpectedBlock], actual: &[FlatEntry]) -> Vec<Mutation> {
    let targets = target_levels(expected);
    let mut levels: Vec<usize> = actual.iter().map(|e| e.level).collect();
    let mut mutations = Vec::new();

    for (index, block) in expected.iter().enumerate() {
        let target = targets[index];
        let Some(entry) = actual.get(index) else {
            let (parent, order) = location(&targets, index);
            mutations.push(Mutation::Create {
                index,
                parent,
                order,
                text: block.text.clone(),
            });
            continue;
        };

        if entry.text != block.text {
            mutations.push(Mutation::UpdateText {
                index,
                id: entry.id.clone(),
                text: block.text.clone(),
            });
        }
        if levels[index] != target {
            if target < levels[index] {
                gather_stranded(actual, &mut levels, index, target, &mut mutations);
            }
            shift_subtree(&mut levels, index, target);
            let (parent, order) = location(&targets, index);
            mutations.push(Mutation::Move {
                index,
                id: entry.id.clone(),
                parent,
                order,
            });
        }
    }

    for (index, entry) in actual.iter().enumerate().skip(expected.len()) {
        // Hosts delete whole subtrees, so a descendant of a deleted entry goes with it.
        let covered = parent_position(&levels[..index], levels[index])
            .is_some_and(|parent| parent >= expected.len());
        if !covered {
            mutations.push(Mutation::Delete {
                index,
                id: entry.id.clone(),
            });
        }
    }

    mutations
}

/// Levels a host can realise for `expected`: at least one, and at most one
/// below the previous block.
fn target_levels(expected: &[ExpectedBlock]) -> Vec<usize> {
    let mut previous = 0;
    expected
        .iter()
        .map(|block| {
            previous = block.level.min(previous + 1).max(ROOT_CHILD_LEVEL);
            previous
        })
        .collect()
}

/// Parent and sibling order for expected position `index`.
///
/// The parent is the nearest earlier block with a smaller level; the order
/// counts earlier blocks at the same level below that parent.
fn location(levels: &[usize], index: usize) -> (ParentRef, usize) {
    let level = levels[index];
    let parent = levels[..index].iter().rposition(|l| *l < level);
    let first_sibling = parent.map_or(0, |p| p + 1);
    let order = levels[first_sibling..index]
        .iter()
        .filter(|l| **l == level)
        .count();
    (parent.map_or(ParentRef::Root, ParentRef::Entry), order)
}

/// End (exclusive) of the subtree rooted at `index`.
fn subtree_end(levels: &[usize], index: usize) -> usize {
    let level = levels[index];
    index
        + 1
        + levels[index + 1..]
            .iter()
            .take_while(|l| **l > level)
            .count()
}

/// Re-levels the subtree rooted at `index` so that its root sits at `target`.
fn shift_subtree(levels: &mut [usize], index: usize, target: usize) {
    let end = subtree_end(levels, index);
    let delta = target as isize - levels[index] as isize;
    for level in &mut levels[index..end] {
        *level = level.saturating_add_signed(delta);
    }
}

/// Moves every entry that follows `index`'s subtree and sits deeper than
/// `target` to the end of `index`'s children.
fn gather_stranded(
    actual: &[FlatEntry],
    levels: &mut [usize],
    index: usize,
    target: usize,
    mutations: &mut Vec<Mutation>,
) {
    let child_level = levels[index] + 1;
    let mut cursor = subtree_end(levels, index);
    let mut order = levels[index + 1..cursor]
        .iter()
        .filter(|l| **l == child_level)
        .count();

    while cursor < levels.len() && levels[cursor] > target {
        let next = subtree_end(levels, cursor);
        shift_subtree(levels, cursor, child_level);
        mutations.push(Mutation::Move {
            index: cursor,
            id: actual[cursor].id.clone(),
            parent: ParentRef::Entry(index),
            order,
        });
        order += 1;
        cursor = next;
    }
}

fn parent_position(preceding: &[usize], level: usize) -> Option<usize> {
    preceding.iter().rposition(|l| *l < level)
}

/// Reads the outline stored under `key` and reconciles it against `document`.
pub async fn apply_document<H: OutlineHost + ?Sized>(
    host: &H,
    key: &str,
    document: &Document,
    config: &SyncConfig,
) -> Result<ReconcileReport, ReconcileError> {
    let tree = host
        .read_tree(key)
        .await
        .map_err(|source| ReconcileError::Read {
            key: key.to_string(),
            source,
        })?;
    let actual = tree.flatten();
    let expected = expected_blocks(document, config.boundary_rule);
    let mutations = plan(&expected, &actual);
    info!(
        key,
        expected = expected.len(),
        actual = actual.len(),
        mutations = mutations.len(),
        "reconciling outline"
    );
    apply_plan(host, &tree.root, &actual, mutations).await
}

/// Applies `mutations` one at a time, in order.
///
/// `actual` must be the snapshot the plan was computed from; it is not
/// re-read while mutations run.
pub async fn apply_plan<H: OutlineHost + ?Sized>(
    host: &H,
    root: &NodeId,
    actual: &[FlatEntry],
    mutations: Vec<Mutation>,
) -> Result<ReconcileReport, ReconcileError> {
    let mut queue = MutationQueue {
        root,
        placed: actual.iter().map(|e| Some(e.id.clone())).collect(),
        tasks: mutations.into(),
    };
    let mut report = ReconcileReport::default();

    while let Some(mutation) = queue.tasks.pop_front() {
        let stage = mutation.stage();
        let index = mutation.index();
        debug!(%stage, index, "applying mutation");
        if let Err(err) = queue.run(host, mutation).await {
            warn!(
                %stage,
                index,
                remaining = queue.tasks.len(),
                error = %err,
                "reconciliation aborted"
            );
            return Err(err);
        }
        report.record(stage);
    }

    info!(
        updated = report.updated,
        moved = report.moved,
        created = report.created,
        deleted = report.deleted,
        "reconciliation complete"
    );
    Ok(report)
}

struct MutationQueue<'a> {
    root: &'a NodeId,
    /// Node now standing at each expected position.
    placed: Vec<Option<NodeId>>,
    tasks: VecDeque<Mutation>,
}

impl MutationQueue<'_> {
    async fn run<H: OutlineHost + ?Sized>(
        &mut self,
        host: &H,
        mutation: Mutation,
    ) -> Result<(), ReconcileError> {
        let stage = mutation.stage();
        let tag = move |index: usize| {
            move |source: HostError| ReconcileError::Mutation {
                stage,
                index,
                source,
            }
        };

        match mutation {
            Mutation::UpdateText { index, id, text } => {
                host.update_text(&id, &text).await.map_err(tag(index))
            }
            Mutation::Move {
                index,
                id,
                parent,
                order,
            } => {
                let parent = self.resolve(parent, index)?;
                host.move_node(&id, &parent, order)
                    .await
                    .map_err(tag(index))?;
                self.place(index, id);
                Ok(())
            }
            Mutation::Create {
                index,
                parent,
                order,
                text,
            } => {
                let parent = self.resolve(parent, index)?;
                let id = host
                    .create_node(&parent, order, &text)
                    .await
                    .map_err(tag(index))?;
                self.place(index, id);
                Ok(())
            }
            Mutation::Delete { index, id } => host.delete_node(&id).await.map_err(tag(index)),
        }
    }

    fn resolve(&self, parent: ParentRef, index: usize) -> Result<NodeId, ReconcileError> {
        match parent {
            ParentRef::Root => Ok(self.root.clone()),
            ParentRef::Entry(position) => self
                .placed
                .get(position)
                .cloned()
                .flatten()
                .ok_or(ReconcileError::UnresolvedParent { index }),
        }
    }

    fn place(&mut self, index: usize, id: NodeId) {
        if self.placed.len() <= index {
            self.placed.resize(index + 1, None);
        }
        self.placed[index] = Some(id);
    }
}
