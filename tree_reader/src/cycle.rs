/*!
Cycle materializer for raw channels.

Each cycle locates the window `[start, end)` in the channel's segments,
classifies the pair of outcomes, and fills the channel slot with hole
values and raw-copied data accordingly. Nothing about the classification
is kept between cycles; only the channel cursor carries over.
*/

use crate::channel::Channel;
use crate::copy::{copy_raw, CopyRequest};
use crate::error::{ReaderError, Result};
use crate::locator::{locate, Location};
use crate::store::PulseTree;
use shared::limits::SAMPLING_TIME_TOLERANCE;
use std::ops::Range;
use tracing::{trace, warn};

/// How the store covers one cycle window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleCase {
    /// No segment overlaps the window
    Hole,
    /// A hole, then data up to the end of the window
    LeadingHole,
    /// Data for the whole window
    Covered,
    /// Data, then a hole or the end of the store
    TrailingHole,
    /// A hole, data, then another hole or the end of the store
    Enclosed,
}

impl CycleCase {
    /// Classify the locator outcomes for the window start and end.
    /// `None` when the start is already past the end of the store.
    pub fn classify(first: Location, last: Location) -> Option<Self> {
        let case = match (first, last) {
            (Location::End, _) => return None,
            (Location::Gap(a), Location::Gap(b)) if a == b => CycleCase::Hole,
            (Location::Gap(_), Location::Hit(_)) => CycleCase::LeadingHole,
            (Location::Gap(_), _) => CycleCase::Enclosed,
            (Location::Hit(_), Location::Hit(_)) => CycleCase::Covered,
            (Location::Hit(_), _) => CycleCase::TrailingHole,
        };
        Some(case)
    }
}

/// Write the channel's hole value over `elements` of `out`
pub(crate) fn fill_hole(channel: &Channel, out: &mut [u8], elements: Range<usize>) {
    if elements.is_empty() {
        return;
    }
    let width = channel.element_type().byte_width();
    channel
        .hole_value()
        .fill(&mut out[elements.start * width..elements.end * width]);
}

/// Output index of `time` within the window starting at `start`, clamped
/// to the channel's slot
fn sample_index(channel: &Channel, start: f64, time: f64) -> usize {
    let samples = ((time - start) / channel.sampling_period() + SAMPLING_TIME_TOLERANCE).floor();
    if samples > 0.0 {
        (samples as usize).min(channel.elements())
    } else {
        0
    }
}

/// Produce one cycle of a raw channel into `out`
pub fn materialize_raw<T: PulseTree + ?Sized>(
    tree: &T,
    channel: &mut Channel,
    out: &mut [u8],
    start: f64,
    end: f64,
) -> Result<CycleCase> {
    let first = locate(tree, channel, start)?;
    let first_segment = match first {
        Location::Hit(index) | Location::Gap(index) => index,
        Location::End => {
            return Err(ReaderError::StoreExhausted {
                node: channel.node_name().to_string(),
            })
        }
    };
    let last = locate(tree, channel, end)?;
    let case = CycleCase::classify(first, last).ok_or_else(|| ReaderError::StoreExhausted {
        node: channel.node_name().to_string(),
    })?;

    let elements = channel.elements();
    let segment_limit = match last {
        Location::Hit(index) => index + 1,
        Location::Gap(index) => index,
        Location::End => channel.max_segments,
    };

    // Each segment lands at the output index matching its start time; the
    // samples in between follow the hole policy.
    let mut leading = None;
    let mut position = 0;
    let mut copied = 0;
    for segment in first_segment..segment_limit.min(channel.max_segments) {
        if position >= elements {
            break;
        }
        let limits = tree.segment_limits(channel.node, segment)?;
        let aligned = position.max(sample_index(channel, start, limits.start));
        if leading.is_none() {
            leading = Some(aligned);
        }
        if aligned >= elements {
            break;
        }

        fill_hole(channel, out, position..aligned);
        let taken = copy_raw(
            tree,
            channel,
            out,
            CopyRequest {
                first_segment: segment,
                segment_limit: segment + 1,
                start_element: aligned,
                samples: elements - aligned,
            },
        )?;
        position = aligned + taken;
        copied += taken;
    }
    let leading = leading.unwrap_or(elements).min(elements);

    if position < elements {
        if let Location::Hit(_) = last {
            let requested = elements - leading;
            warn!(
                node = channel.node_name(),
                requested, copied, "Copied fewer samples than the cycle needs"
            );
            return Err(ReaderError::CopyMismatch {
                node: channel.node_name().to_string(),
                requested,
                copied,
            });
        }
        fill_hole(channel, out, position..elements);
    }

    trace!(
        node = channel.node_name(),
        ?case,
        leading,
        copied,
        start,
        "Cycle materialized"
    );
    Ok(case)
}
