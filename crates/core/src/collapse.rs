//! Expand/collapse state for sections and lectures, keyed by node id so it
//! follows nodes through reorders, inserts and removals.

use std::collections::HashSet;

use crate::content::CourseContent;
use crate::types::NodeId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: HashSet<NodeId>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &NodeId) -> bool {
        self.collapsed.contains(id)
    }

    /// Flip a node and return its new collapsed state.
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        if self.collapsed.remove(id) {
            false
        } else {
            self.collapsed.insert(id.clone());
            true
        }
    }

    pub fn collapse(&mut self, id: &NodeId) {
        self.collapsed.insert(id.clone());
    }

    pub fn expand(&mut self, id: &NodeId) {
        self.collapsed.remove(id);
    }

    /// Collapse every lecture of every section.
    pub fn collapse_all_lectures(&mut self, tree: &CourseContent) {
        for (_, lecture) in tree.lectures() {
            self.collapsed.insert(lecture.id().clone());
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    /// Forget ids that no longer exist in `tree`.
    pub fn retain_existing(&mut self, tree: &CourseContent) {
        let live: HashSet<&NodeId> = tree
            .sections()
            .flat_map(|section| {
                std::iter::once(section.id()).chain(section.lectures().map(|l| l.id()))
            })
            .collect();
        self.collapsed.retain(|id| live.contains(id));
    }

    /// Re-key entries after temporary ids were replaced by persisted ones.
    pub fn rekey(&mut self, mapping: impl Fn(&NodeId) -> Option<NodeId>) {
        self.collapsed = self
            .collapsed
            .drain()
            .map(|id| mapping(&id).unwrap_or(id))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }
}
