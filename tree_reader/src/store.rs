/*!
Pulse tree store interface.

The reader never talks to a concrete database directly. It opens a tree
through [`TreeStore`] and reads node metadata, segment time limits and
segment payloads through [`PulseTree`]. Every call is a blocking read and
reports failures as [`StoreError`] values.
*/

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store-facing operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by a tree store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Tree '{name}' has no shot {shot}")]
    TreeNotFound { name: String, shot: Shot },

    #[error("Invalid shot number {0}: shots are positive")]
    InvalidShot(i64),

    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    #[error("Node '{0}' already exists")]
    DuplicateNode(String),

    #[error("Unknown node reference {0}")]
    InvalidNode(NodeRef),

    #[error("Segment {index} out of range for node '{node}' ({count} segments)")]
    SegmentOutOfRange {
        node: String,
        index: usize,
        count: usize,
    },

    #[error("Malformed segment {index} of node '{node}': {reason}")]
    MalformedSegment {
        node: String,
        index: usize,
        reason: String,
    },

    #[error("Segment rejected for node '{node}': {reason}")]
    SegmentRejected { node: String, reason: String },
}

impl StoreError {
    pub fn rejected(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SegmentRejected {
            node: node.into(),
            reason: reason.into(),
        }
    }
}

/// Shot (pulse) selector; `-1` selects the most recent shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shot(i64);

impl Shot {
    pub const LATEST: Shot = Shot(-1);

    /// Accepts `-1` or a positive pulse number
    pub fn new(number: i64) -> Option<Self> {
        (number == -1 || number > 0).then_some(Self(number))
    }

    pub fn number(self) -> i64 {
        self.0
    }

    pub fn is_latest(self) -> bool {
        self.0 == -1
    }
}

impl fmt::Display for Shot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_latest() {
            f.write_str("latest")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Opaque handle to an opened node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub usize);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Time limits of a segment, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLimits {
    pub start: f64,
    pub end: f64,
}

impl SegmentLimits {
    /// Spacing between consecutive samples when `count` samples are spread
    /// uniformly over the limits. `None` for fewer than two samples.
    pub fn sample_step(&self, count: usize) -> Option<f64> {
        (count > 1).then(|| (self.end - self.start) / (count - 1) as f64)
    }
}

/// Segment samples in native byte order
#[derive(Debug, Clone)]
pub struct SegmentPayload<'a> {
    pub element_count: usize,
    pub bytes: Cow<'a, [u8]>,
}

impl SegmentPayload<'_> {
    /// Bytes of elements `first..first + count`, or `None` when out of range
    pub fn elements(&self, width: usize, first: usize, count: usize) -> Option<&[u8]> {
        if first + count > self.element_count {
            return None;
        }
        self.bytes.get(first * width..(first + count) * width)
    }
}

/// An opened tree of one shot
pub trait PulseTree {
    fn open_node(&self, path: &str) -> StoreResult<NodeRef>;

    /// Raw store type code of the node's data
    fn type_code(&self, node: NodeRef) -> StoreResult<u8>;

    fn segment_count(&self, node: NodeRef) -> StoreResult<usize>;

    fn segment_limits(&self, node: NodeRef, index: usize) -> StoreResult<SegmentLimits>;

    fn segment_payload(&self, node: NodeRef, index: usize) -> StoreResult<SegmentPayload<'_>>;
}

/// Entry point to a tree database
pub trait TreeStore {
    type Tree: PulseTree;

    fn open_tree(&self, name: &str, shot: Shot) -> StoreResult<Self::Tree>;
}

impl<T: PulseTree + ?Sized> PulseTree for Arc<T> {
    fn open_node(&self, path: &str) -> StoreResult<NodeRef> {
        (**self).open_node(path)
    }

    fn type_code(&self, node: NodeRef) -> StoreResult<u8> {
        (**self).type_code(node)
    }

    fn segment_count(&self, node: NodeRef) -> StoreResult<usize> {
        (**self).segment_count(node)
    }

    fn segment_limits(&self, node: NodeRef, index: usize) -> StoreResult<SegmentLimits> {
        (**self).segment_limits(node, index)
    }

    fn segment_payload(&self, node: NodeRef, index: usize) -> StoreResult<SegmentPayload<'_>> {
        (**self).segment_payload(node, index)
    }
}
