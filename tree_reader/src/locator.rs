/*!
Segment locator.

Finds the segment covering a time, or the first segment after it, by
scanning forward from the channel's cursor. Cycles are produced in time
order, so the scan never restarts from the first segment.
*/

use crate::channel::Channel;
use crate::store::{PulseTree, StoreResult};

/// Outcome of locating a time in a channel's segment list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The time lies inside this segment
    Hit(usize),
    /// The time lies in a hole that ends where this segment starts
    Gap(usize),
    /// The time lies past the end of the last segment
    End,
}

impl Location {
    pub fn segment(self) -> Option<usize> {
        match self {
            Location::Hit(index) | Location::Gap(index) => Some(index),
            Location::End => None,
        }
    }
}

/// Locate `time` for `channel`, advancing its cursor on a hit or a gap.
///
/// The first segment with `time < end` decides the outcome: a hit when
/// `time >= start`, a gap otherwise.
pub fn locate<T: PulseTree + ?Sized>(tree: &T, channel: &mut Channel, time: f64) -> StoreResult<Location> {
    for index in channel.cursor.last_segment..channel.max_segments {
        let limits = tree.segment_limits(channel.node, index)?;
        if time < limits.end {
            channel.cursor.advance_to(index);
            return Ok(if time < limits.start {
                Location::Gap(index)
            } else {
                Location::Hit(index)
            });
        }
    }
    Ok(Location::End)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelSpec, DataManagement, HoleManagement};
    use crate::memory_tree::MemoryTree;
    use shared::ElementType;

    // Segments [0, 1], [2, 3], [6, 7]
    fn fixture() -> (MemoryTree, Channel) {
        let mut tree = MemoryTree::new();
        let node = tree.add_node("SIG", ElementType::Int32).unwrap();
        tree.put_segment(node, 0.0, 1.0, &[0i32, 1]).unwrap();
        tree.put_segment(node, 2.0, 3.0, &[2i32, 3]).unwrap();
        tree.put_segment(node, 6.0, 7.0, &[6i32, 7]).unwrap();

        let spec = ChannelSpec {
            node: "SIG".to_string(),
            element_type: ElementType::Int32,
            elements: 2,
            data_management: DataManagement::Raw,
            hole_management: HoleManagement::ZeroFill,
        };
        (tree, Channel::new(spec, node, 0.5, 3))
    }

    #[test]
    fn test_hit_gap_end() {
        let (tree, mut channel) = fixture();
        assert_eq!(locate(&tree, &mut channel, 0.5).unwrap(), Location::Hit(0));
        assert_eq!(locate(&tree, &mut channel, 1.5).unwrap(), Location::Gap(1));
        assert_eq!(channel.last_segment(), 1);
        assert_eq!(locate(&tree, &mut channel, 2.0).unwrap(), Location::Hit(1));
        assert_eq!(locate(&tree, &mut channel, 4.0).unwrap(), Location::Gap(2));
        assert_eq!(locate(&tree, &mut channel, 7.0).unwrap(), Location::End);
        assert_eq!(channel.last_segment(), 2);
    }

    #[test]
    fn test_segment_end_belongs_to_next_segment() {
        let (tree, mut channel) = fixture();
        assert_eq!(locate(&tree, &mut channel, 1.0).unwrap(), Location::Gap(1));
        assert_eq!(locate(&tree, &mut channel, 3.0).unwrap(), Location::Gap(2));
    }

    #[test]
    fn test_scan_is_forward_only() {
        let (tree, mut channel) = fixture();
        assert_eq!(locate(&tree, &mut channel, 6.5).unwrap(), Location::Hit(2));
        // An earlier time is resolved from the cursor, not from segment 0.
        assert_eq!(locate(&tree, &mut channel, 0.5).unwrap(), Location::Gap(2));
        assert_eq!(channel.last_segment(), 2);
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let (tree, mut channel) = fixture();
        let mut previous = channel.last_segment();
        for step in 0..16 {
            let _ = locate(&tree, &mut channel, step as f64 * 0.5).unwrap();
            assert!(channel.last_segment() >= previous);
            previous = channel.last_segment();
        }
    }

    #[test]
    fn test_location_segment() {
        assert_eq!(Location::Hit(3).segment(), Some(3));
        assert_eq!(Location::Gap(1).segment(), Some(1));
        assert_eq!(Location::End.segment(), None);
    }
}
