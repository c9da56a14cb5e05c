/*!
Per-channel state.

A [`Channel`] is one resampled signal: its validated configuration, the
node it reads, and the cursor state carried from one cycle to the next.
*/

use crate::config::{ChannelSpec, DataManagement, HoleManagement};
use crate::store::NodeRef;
use shared::{ElementType, SampleValue};

/// Where a channel is in its node's segment list.
///
/// `last_segment` only moves forward. `elements_consumed` counts elements
/// already taken from `partial_segment`; it never applies to any other
/// segment, so a locator advance can not make it point into the wrong one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentCursor {
    pub(crate) last_segment: usize,
    pub(crate) partial_segment: usize,
    pub(crate) elements_consumed: usize,
}

impl SegmentCursor {
    /// Elements of `segment` already consumed. Segments before the partial
    /// one are fully consumed.
    pub(crate) fn consumed_in(&self, segment: usize, element_count: usize) -> usize {
        if segment < self.partial_segment {
            element_count
        } else if segment == self.partial_segment {
            self.elements_consumed.min(element_count)
        } else {
            0
        }
    }

    /// Record `consumed` elements of `segment` as read; an exhausted segment
    /// moves the partial position to the start of the next one. Segments
    /// behind the partial position stay consumed.
    pub(crate) fn record(&mut self, segment: usize, consumed: usize, exhausted: bool) {
        if segment < self.partial_segment {
            return;
        }
        if exhausted {
            self.partial_segment = segment + 1;
            self.elements_consumed = 0;
        } else {
            self.partial_segment = segment;
            self.elements_consumed = consumed;
        }
    }

    pub(crate) fn advance_to(&mut self, segment: usize) {
        self.last_segment = self.last_segment.max(segment);
    }
}

/// One resampled signal
#[derive(Debug, Clone)]
pub struct Channel {
    pub(crate) spec: ChannelSpec,
    pub(crate) node: NodeRef,
    pub(crate) sampling_period: f64,
    pub(crate) max_segments: usize,
    pub(crate) cursor: SegmentCursor,
    pub(crate) last_value: SampleValue,
}

impl Channel {
    pub(crate) fn new(spec: ChannelSpec, node: NodeRef, frequency: f64, max_segments: usize) -> Self {
        let sampling_period = 1.0 / (frequency * spec.elements as f64);
        let last_value = SampleValue::zero(spec.element_type);
        Self {
            spec,
            node,
            sampling_period,
            max_segments,
            cursor: SegmentCursor::default(),
            last_value,
        }
    }

    pub fn node_name(&self) -> &str {
        &self.spec.node
    }

    pub fn element_type(&self) -> ElementType {
        self.spec.element_type
    }

    /// Elements produced per cycle
    pub fn elements(&self) -> usize {
        self.spec.elements
    }

    pub fn byte_size(&self) -> usize {
        self.spec.byte_size()
    }

    /// Time between two output samples, `1 / (frequency * elements)`
    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }

    pub fn data_management(&self) -> DataManagement {
        self.spec.data_management
    }

    pub fn hole_management(&self) -> HoleManagement {
        self.spec.hole_management
    }

    /// Segment count read when the channel was configured
    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    pub fn last_segment(&self) -> usize {
        self.cursor.last_segment
    }

    /// Elements already read from the partially consumed segment
    pub fn elements_consumed(&self) -> usize {
        self.cursor.elements_consumed
    }

    /// Most recent value written for this channel
    pub fn last_value(&self) -> SampleValue {
        self.last_value
    }

    /// Value written into holes under the channel's hole policy
    pub(crate) fn hole_value(&self) -> SampleValue {
        match self.spec.hole_management {
            HoleManagement::ZeroFill => SampleValue::zero(self.spec.element_type),
            HoleManagement::HoldLast => self.last_value,
        }
    }
}
