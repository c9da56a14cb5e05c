/*!
Output buffer.

All signals of one cycle live in a single byte region. Each signal owns a
fixed slot whose offset is the cumulative byte size of the slots before it.
*/

use shared::Element;
use std::ops::Range;

/// Contiguous output region split into per-signal slots
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    data: Vec<u8>,
    slots: Vec<Range<usize>>,
}

impl OutputBuffer {
    /// Allocate a zeroed buffer with one slot per size, in order
    pub fn with_slot_sizes<I: IntoIterator<Item = usize>>(sizes: I) -> Self {
        let mut slots = Vec::new();
        let mut offset = 0;
        for size in sizes {
            slots.push(offset..offset + size);
            offset += size;
        }

        Self {
            data: vec![0; offset],
            slots,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Total size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Byte offset of slot `index` in the buffer
    pub fn offset(&self, index: usize) -> Option<usize> {
        self.slots.get(index).map(|range| range.start)
    }

    pub fn slot(&self, index: usize) -> Option<&[u8]> {
        let range = self.slots.get(index)?.clone();
        self.data.get(range)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        let range = self.slots.get(index)?.clone();
        self.data.get_mut(range)
    }

    /// Every slot in order, each borrowed independently
    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let mut rest = self.data.as_mut_slice();
        self.slots.iter().map(move |range| {
            let (slot, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            rest = tail;
            slot
        })
    }

    /// Typed copy of slot `index`
    pub fn decode<E: Element>(&self, index: usize) -> Option<Vec<E>> {
        let width = E::TYPE.byte_width();
        let slot = self.slot(index)?;
        if slot.len() % width != 0 {
            return None;
        }
        slot.chunks_exact(width).map(E::read_ne).collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
