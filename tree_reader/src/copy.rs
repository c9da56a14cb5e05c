/*!
Raw copy engine.

Copies stored elements byte for byte into a channel slice, walking forward
through segments and remembering how far into a partially read segment the
channel got, so a segment spanning several cycles is read exactly once.
*/

use crate::channel::Channel;
use crate::store::{PulseTree, StoreError, StoreResult};
use shared::SampleValue;

/// One raw copy into a channel slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRequest {
    /// Segment to start reading from
    pub first_segment: usize,
    /// Segments at or past this index are never read
    pub segment_limit: usize,
    /// Element position in the slice where the copied data begins
    pub start_element: usize,
    /// Elements wanted
    pub samples: usize,
}

/// Copy up to `request.samples` elements into `out` (the channel's slot)
/// and return how many were copied. Fewer are copied only when the segments
/// below `segment_limit` run out.
pub fn copy_raw<T: PulseTree + ?Sized>(
    tree: &T,
    channel: &mut Channel,
    out: &mut [u8],
    request: CopyRequest,
) -> StoreResult<usize> {
    let width = channel.element_type().byte_width();
    let room = channel.elements().saturating_sub(request.start_element);
    let limit = request.segment_limit.min(channel.max_segments);

    let mut wanted = request.samples.min(room);
    let mut position = request.start_element;
    let mut segment = request.first_segment;

    while wanted > 0 && segment < limit {
        let payload = tree.segment_payload(channel.node, segment)?;
        let consumed = channel.cursor.consumed_in(segment, payload.element_count);
        let remaining = payload.element_count - consumed;
        let take = remaining.min(wanted);

        let source = payload
            .elements(width, consumed, take)
            .ok_or_else(|| StoreError::MalformedSegment {
                node: channel.node_name().to_string(),
                index: segment,
                reason: format!(
                    "payload of {} bytes is too short for {} elements",
                    payload.bytes.len(),
                    payload.element_count
                ),
            })?;
        out[position * width..(position + take) * width].copy_from_slice(source);

        position += take;
        wanted -= take;

        let exhausted = take == remaining;
        channel.cursor.record(segment, consumed + take, exhausted);
        if exhausted {
            segment += 1;
        }
    }

    let copied = position - request.start_element;
    if copied > 0 {
        let last = &out[(position - 1) * width..position * width];
        if let Ok(value) = SampleValue::from_bytes(channel.element_type(), last) {
            channel.last_value = value;
        }
    }
    Ok(copied)
}
