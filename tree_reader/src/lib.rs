/*!
# Tree Reader

Streams historical time-series out of a segmented pulse tree as a
fixed-rate sequence of cycles. Every cycle fills one output slot per
channel with exactly the configured number of elements, copying stored
samples, resampling them, or filling holes where the store has no data.

## Features

- Ten numeric element types, checked against the stored node type
- Forward-only segment cursor carried across cycles
- Raw copies for channels stored at the output rate
- Sample-and-hold and linear interpolation for the rest
- Zero-fill or hold-last for holes between segments
- Optional time signal with the cycle start in microseconds

## Usage

```no_run
use tree_reader::{MemoryStore, ReaderConfig, TreeReader};

# fn main() -> anyhow::Result<()> {
let store = MemoryStore::new();
let config = ReaderConfig::load_from_file("reader.toml")?;
let mut reader = TreeReader::configure(&store, &config)?;
while reader.produce_cycle().is_ok() {
    let ramp = reader.channel_values::<i32>(0);
    println!("{:?}", ramp);
}
# Ok(())
# }
```

## Modules

- [`config`] - Reader and channel configuration, validation
- [`reader`] - Channel binding and the per-cycle driver
- [`cycle`] - Raw cycle materialization
- [`resample`] - Hold and interpolate channels
- [`locator`] - Segment lookup for a point in time
- [`copy`] - Raw element copies across segment boundaries
- [`store`] - Pulse tree abstraction
- [`memory_tree`] - In-memory store for tests and tools
*/

pub mod buffer;
pub mod channel;
pub mod config;
pub mod copy;
pub mod cycle;
pub mod error;
pub mod locator;
pub mod memory_tree;
pub mod reader;
pub mod resample;
pub mod store;

pub use buffer::OutputBuffer;
pub use channel::{Channel, SegmentCursor};
pub use config::{
    ChannelConfig, ChannelSpec, DataManagement, HoleManagement, ReaderConfig, TimeSignalConfig,
};
pub use cycle::CycleCase;
pub use error::{ReaderError, Result};
pub use locator::Location;
pub use memory_tree::{MemoryStore, MemoryTree};
pub use reader::{CycleClock, TreeReader};
pub use store::{NodeRef, PulseTree, SegmentLimits, SegmentPayload, Shot, StoreError, TreeStore};

pub use shared::{Element, ElementType, SampleValue};
