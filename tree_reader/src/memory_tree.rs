/*!
In-memory pulse tree store.

Holds trees per (name, shot) and their nodes' segment lists. Segments can
only be appended through [`MemoryTree::put_segment`], which keeps each
node's segments in time order; nothing here supports editing or removing
stored data.
*/

use crate::store::{
    NodeRef, PulseTree, SegmentLimits, SegmentPayload, Shot, StoreError, StoreResult, TreeStore,
};
use shared::Element;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct MemorySegment {
    limits: SegmentLimits,
    element_count: usize,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct MemoryNode {
    name: String,
    type_code: u8,
    segments: Vec<MemorySegment>,
}

/// One shot of an in-memory tree
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    nodes: Vec<MemoryNode>,
    by_name: HashMap<String, NodeRef>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node holding elements of `element_type`
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        element_type: shared::ElementType,
    ) -> StoreResult<NodeRef> {
        self.add_node_with_code(name, element_type.store_code())
    }

    /// Add a node with a raw store type code, including codes the reader
    /// does not support
    pub fn add_node_with_code(&mut self, name: impl Into<String>, type_code: u8) -> StoreResult<NodeRef> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(StoreError::DuplicateNode(name));
        }

        let node = NodeRef(self.nodes.len());
        self.by_name.insert(name.clone(), node);
        self.nodes.push(MemoryNode {
            name,
            type_code,
            segments: Vec::new(),
        });
        Ok(node)
    }

    /// Append a segment of `values` spanning `[start, end]` seconds
    pub fn put_segment<E: Element>(
        &mut self,
        node: NodeRef,
        start: f64,
        end: f64,
        values: &[E],
    ) -> StoreResult<()> {
        let entry = self.nodes.get_mut(node.0).ok_or(StoreError::InvalidNode(node))?;

        if entry.type_code != E::TYPE.store_code() {
            return Err(StoreError::rejected(
                &entry.name,
                format!("node type code {} cannot hold {}", entry.type_code, E::TYPE),
            ));
        }
        if values.is_empty() {
            return Err(StoreError::rejected(&entry.name, "empty segment"));
        }
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(StoreError::rejected(
                &entry.name,
                format!("invalid time limits [{start}, {end}]"),
            ));
        }
        if let Some(previous) = entry.segments.last() {
            if start < previous.limits.end {
                return Err(StoreError::rejected(
                    &entry.name,
                    format!(
                        "segment starting at {start} overlaps previous segment ending at {}",
                        previous.limits.end
                    ),
                ));
            }
        }

        let width = E::TYPE.byte_width();
        let mut data = vec![0u8; values.len() * width];
        for (value, chunk) in values.iter().zip(data.chunks_exact_mut(width)) {
            value.write_ne(chunk);
        }

        entry.segments.push(MemorySegment {
            limits: SegmentLimits { start, end },
            element_count: values.len(),
            data,
        });
        Ok(())
    }

    fn node(&self, node: NodeRef) -> StoreResult<&MemoryNode> {
        self.nodes.get(node.0).ok_or(StoreError::InvalidNode(node))
    }

    fn segment(&self, node: NodeRef, index: usize) -> StoreResult<&MemorySegment> {
        let entry = self.node(node)?;
        entry
            .segments
            .get(index)
            .ok_or_else(|| StoreError::SegmentOutOfRange {
                node: entry.name.clone(),
                index,
                count: entry.segments.len(),
            })
    }
}

impl PulseTree for MemoryTree {
    fn open_node(&self, path: &str) -> StoreResult<NodeRef> {
        self.by_name
            .get(path)
            .copied()
            .ok_or_else(|| StoreError::NodeNotFound(path.to_string()))
    }

    fn type_code(&self, node: NodeRef) -> StoreResult<u8> {
        Ok(self.node(node)?.type_code)
    }

    fn segment_count(&self, node: NodeRef) -> StoreResult<usize> {
        Ok(self.node(node)?.segments.len())
    }

    fn segment_limits(&self, node: NodeRef, index: usize) -> StoreResult<SegmentLimits> {
        Ok(self.segment(node, index)?.limits)
    }

    fn segment_payload(&self, node: NodeRef, index: usize) -> StoreResult<SegmentPayload<'_>> {
        let segment = self.segment(node, index)?;
        Ok(SegmentPayload {
            element_count: segment.element_count,
            bytes: Cow::Borrowed(&segment.data),
        })
    }
}

/// Registry of in-memory trees
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    trees: HashMap<String, BTreeMap<i64, Arc<MemoryTree>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tree` as shot `shot` of `name`, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, shot: i64, tree: MemoryTree) -> StoreResult<()> {
        if shot <= 0 {
            return Err(StoreError::InvalidShot(shot));
        }
        self.trees
            .entry(name.into())
            .or_default()
            .insert(shot, Arc::new(tree));
        Ok(())
    }
}

impl TreeStore for MemoryStore {
    type Tree = Arc<MemoryTree>;

    fn open_tree(&self, name: &str, shot: Shot) -> StoreResult<Self::Tree> {
        let not_found = || StoreError::TreeNotFound {
            name: name.to_string(),
            shot,
        };

        let shots = self.trees.get(name).ok_or_else(not_found)?;
        let tree = if shot.is_latest() {
            shots.values().next_back()
        } else {
            shots.get(&shot.number())
        };
        tree.cloned().ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ElementType;

    fn tree_with_node() -> (MemoryTree, NodeRef) {
        let mut tree = MemoryTree::new();
        let node = tree.add_node("SIG", ElementType::Int16).unwrap();
        (tree, node)
    }

    #[test]
    fn test_segments_are_stored_in_order() {
        let (mut tree, node) = tree_with_node();
        tree.put_segment(node, 0.0, 0.3, &[1i16, 2, 3, 4]).unwrap();
        tree.put_segment(node, 0.4, 0.5, &[5i16, 6]).unwrap();

        assert_eq!(tree.open_node("SIG").unwrap(), node);
        assert_eq!(tree.type_code(node).unwrap(), ElementType::Int16.store_code());
        assert_eq!(tree.segment_count(node).unwrap(), 2);
        assert_eq!(
            tree.segment_limits(node, 1).unwrap(),
            SegmentLimits { start: 0.4, end: 0.5 }
        );

        let payload = tree.segment_payload(node, 0).unwrap();
        assert_eq!(payload.element_count, 4);
        let third = payload.elements(2, 2, 1).unwrap();
        assert_eq!(i16::read_ne(third), Some(3));
    }

    #[test]
    fn test_put_segment_rejections() {
        let (mut tree, node) = tree_with_node();
        assert!(tree.put_segment(node, 0.0, 1.0, &[1u16]).is_err());
        assert!(tree.put_segment::<i16>(node, 0.0, 1.0, &[]).is_err());
        assert!(tree.put_segment(node, 1.0, 0.0, &[1i16]).is_err());

        tree.put_segment(node, 0.0, 1.0, &[1i16, 2]).unwrap();
        let err = tree.put_segment(node, 0.5, 2.0, &[3i16]).unwrap_err();
        assert!(matches!(err, StoreError::SegmentRejected { .. }));
    }

    #[test]
    fn test_lookup_errors() {
        let (tree, node) = tree_with_node();
        assert_eq!(
            tree.open_node("MISSING").unwrap_err(),
            StoreError::NodeNotFound("MISSING".to_string())
        );
        assert!(matches!(
            tree.segment_limits(node, 0),
            Err(StoreError::SegmentOutOfRange { index: 0, count: 0, .. })
        ));
        assert_eq!(
            tree.type_code(NodeRef(9)).unwrap_err(),
            StoreError::InvalidNode(NodeRef(9))
        );
    }

    #[test]
    fn test_duplicate_node() {
        let (mut tree, _) = tree_with_node();
        assert_eq!(
            tree.add_node("SIG", ElementType::Int16).unwrap_err(),
            StoreError::DuplicateNode("SIG".to_string())
        );
    }

    #[test]
    fn test_open_tree_by_shot() {
        let mut first = MemoryTree::new();
        first.add_node("A", ElementType::UInt8).unwrap();
        let mut second = MemoryTree::new();
        second.add_node("B", ElementType::UInt8).unwrap();

        let mut store = MemoryStore::new();
        store.insert("pulses", 3, first).unwrap();
        store.insert("pulses", 7, second).unwrap();
        assert_eq!(
            store.insert("pulses", 0, MemoryTree::new()).unwrap_err(),
            StoreError::InvalidShot(0)
        );

        let latest = store.open_tree("pulses", Shot::LATEST).unwrap();
        assert!(latest.open_node("B").is_ok());

        let third = store.open_tree("pulses", Shot::new(3).unwrap()).unwrap();
        assert!(third.open_node("A").is_ok());

        assert!(matches!(
            store.open_tree("pulses", Shot::new(5).unwrap()),
            Err(StoreError::TreeNotFound { .. })
        ));
        assert!(store.open_tree("other", Shot::LATEST).is_err());
    }
}
