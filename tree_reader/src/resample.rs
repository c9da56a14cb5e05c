/*!
Timed resampling for hold and interpolate channels.

Every output sample `j` of a cycle has the time `start + j * samplingPeriod`
and is evaluated on its own. Samples inside a segment are taken to be spread
uniformly between the segment's time limits.
*/

use crate::channel::Channel;
use crate::config::DataManagement;
use crate::locator::{locate, Location};
use crate::store::{PulseTree, SegmentPayload, StoreError, StoreResult};
use shared::limits::SAMPLING_TIME_TOLERANCE;
use shared::{Element, SampleValue};

fn read_element<E: Element>(
    channel: &Channel,
    segment: usize,
    payload: &SegmentPayload<'_>,
    index: usize,
) -> StoreResult<E> {
    payload
        .elements(E::TYPE.byte_width(), index, 1)
        .and_then(E::read_ne)
        .ok_or_else(|| StoreError::MalformedSegment {
            node: channel.node_name().to_string(),
            index: segment,
            reason: format!("element {index} cannot be read"),
        })
}

/// Value at `time`, which lies inside `segment`
fn sample_in_segment<T: PulseTree + ?Sized, E: Element>(
    tree: &T,
    channel: &Channel,
    segment: usize,
    time: f64,
    mode: DataManagement,
) -> StoreResult<E> {
    let limits = tree.segment_limits(channel.node, segment)?;
    let payload = tree.segment_payload(channel.node, segment)?;
    let count = payload.element_count;
    if count == 0 {
        return Err(StoreError::MalformedSegment {
            node: channel.node_name().to_string(),
            index: segment,
            reason: "segment holds no elements".to_string(),
        });
    }

    let position = match limits.sample_step(count) {
        Some(step) if step > 0.0 => ((time - limits.start) / step).max(0.0),
        _ => 0.0,
    };
    let index = (position.floor() as usize).min(count - 1);
    let current = read_element::<E>(channel, segment, &payload, index)?;

    if mode != DataManagement::Interpolate || index + 1 >= count {
        return Ok(current);
    }
    let next = read_element::<E>(channel, segment, &payload, index + 1)?;
    Ok(E::lerp(current, next, position - index as f64))
}

/// Value at `time`, which lies at or after the end of segment `previous`
/// and before segment `next` (or past the end of the store when `next` is
/// `None`). The last stored sample is used at its own timestamp, and
/// adjacent segments whose hole is no wider than one sample step are
/// bridged; anything else is a hole and yields `None`.
fn sample_after_segment<T: PulseTree + ?Sized, E: Element>(
    tree: &T,
    channel: &Channel,
    previous: usize,
    next: Option<usize>,
    time: f64,
    mode: DataManagement,
) -> StoreResult<Option<E>> {
    let before = tree.segment_limits(channel.node, previous)?;
    let payload = tree.segment_payload(channel.node, previous)?;
    let Some(last_index) = payload.element_count.checked_sub(1) else {
        return Ok(None);
    };
    let step = before.sample_step(payload.element_count);

    let offset = time - before.end;
    if offset < 0.0 {
        return Ok(None);
    }
    let last = read_element::<E>(channel, previous, &payload, last_index)?;
    if offset <= step.map_or(0.0, |step| step * SAMPLING_TIME_TOLERANCE) {
        return Ok(Some(last));
    }

    let (Some(next), Some(step)) = (next, step) else {
        return Ok(None);
    };
    let after = tree.segment_limits(channel.node, next)?;
    let hole = after.start - before.end;
    if hole > step * (1.0 + SAMPLING_TIME_TOLERANCE) {
        return Ok(None);
    }
    if mode != DataManagement::Interpolate || hole <= 0.0 {
        return Ok(Some(last));
    }

    let following = tree.segment_payload(channel.node, next)?;
    let first = read_element::<E>(channel, next, &following, 0)?;
    Ok(Some(E::lerp(last, first, offset / hole)))
}

/// Fill `out` with one cycle of `channel` starting at `start`, evaluating
/// each output sample at its own time.
pub fn resample_timed<T: PulseTree + ?Sized, E: Element>(
    tree: &T,
    channel: &mut Channel,
    out: &mut [u8],
    start: f64,
) -> StoreResult<()> {
    let mode = channel.data_management();
    let period = channel.sampling_period();
    let width = E::TYPE.byte_width();

    for (index, chunk) in out.chunks_exact_mut(width).enumerate() {
        let time = start + index as f64 * period;
        let value = match locate(tree, channel, time)? {
            Location::Hit(segment) => Some(sample_in_segment::<T, E>(tree, channel, segment, time, mode)?),
            Location::Gap(segment) => match segment.checked_sub(1) {
                Some(previous) => {
                    sample_after_segment::<T, E>(tree, channel, previous, Some(segment), time, mode)?
                }
                None => None,
            },
            Location::End => match channel.max_segments.checked_sub(1) {
                Some(previous) => sample_after_segment::<T, E>(tree, channel, previous, None, time, mode)?,
                None => None,
            },
        };

        match value {
            Some(value) => {
                value.write_ne(chunk);
                channel.last_value = SampleValue::from_element(value);
            }
            None => channel.hole_value().fill(chunk),
        }
    }
    Ok(())
}
