/*!
Tree reader.

[`TreeReader`] binds a validated configuration to an opened pulse tree,
owns the output buffer and per-channel state, and produces one cycle of
every channel per call to [`TreeReader::produce_cycle`].
*/

use crate::buffer::OutputBuffer;
use crate::channel::Channel;
use crate::config::{ChannelSpec, DataManagement, ReaderConfig};
use crate::cycle::materialize_raw;
use crate::error::{ReaderError, Result};
use crate::resample::resample_timed;
use crate::store::{PulseTree, Shot, TreeStore};
use shared::limits::{MICROSECONDS_PER_SECOND, SAMPLING_TIME_TOLERANCE};
use shared::{dispatch_element, Element, ElementType};
use tracing::{debug, info, trace, warn};

/// Start time and period of the cycle being produced.
///
/// The time is derived from the cycle count so rounding does not
/// accumulate over long runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleClock {
    period: f64,
    cycles: u64,
}

impl CycleClock {
    pub fn new(frequency: f64) -> Self {
        Self {
            period: 1.0 / frequency,
            cycles: 0,
        }
    }

    /// Start time of the next cycle
    pub fn time(&self) -> f64 {
        self.cycles as f64 * self.period
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Cycles produced so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn advance(&mut self) {
        self.cycles += 1;
    }
}

/// Reads fixed-rate cycles out of a segmented pulse tree
#[derive(Debug)]
pub struct TreeReader<T: PulseTree> {
    tree: T,
    tree_name: String,
    shot: Shot,
    channels: Vec<Channel>,
    buffer: OutputBuffer,
    clock: CycleClock,
    time_signal: Option<ElementType>,
}

impl<T: PulseTree> TreeReader<T> {
    /// Validate `config`, open the tree and bind every channel to its node
    pub fn configure<S>(store: &S, config: &ReaderConfig) -> Result<Self>
    where
        S: TreeStore<Tree = T>,
    {
        let specs = config.validate()?;
        let shot = config.shot_selector()?;
        let time_signal = config.time_signal_type()?;

        let tree = store.open_tree(&config.tree_name, shot)?;
        let channels = specs
            .into_iter()
            .map(|spec| bind_channel(&tree, spec, config.frequency))
            .collect::<Result<Vec<_>>>()?;

        let buffer = OutputBuffer::with_slot_sizes(
            channels
                .iter()
                .map(Channel::byte_size)
                .chain(time_signal.map(ElementType::byte_width)),
        );

        info!(
            tree = %config.tree_name,
            %shot,
            frequency = config.frequency,
            channels = channels.len(),
            buffer_bytes = buffer.len(),
            "Tree reader configured"
        );

        Ok(Self {
            tree,
            tree_name: config.tree_name.clone(),
            shot,
            channels,
            buffer,
            clock: CycleClock::new(config.frequency),
            time_signal,
        })
    }

    /// Produce the next cycle for every channel.
    ///
    /// On error the cycle clock does not advance; a reader that reported
    /// store exhaustion has no more cycles to give.
    pub fn produce_cycle(&mut self) -> Result<()> {
        let start = self.clock.time();
        let end = start + self.clock.period();
        let tree = &self.tree;

        for (channel, out) in self.channels.iter_mut().zip(self.buffer.slots_mut()) {
            let outcome = match channel.data_management() {
                DataManagement::Raw => materialize_raw(tree, channel, out, start, end).map(|_| ()),
                DataManagement::Interpolate | DataManagement::Hold => {
                    dispatch_element!(channel.element_type(), E => {
                        resample_timed::<T, E>(tree, channel, out, start)
                    })
                    .map_err(ReaderError::from)
                }
            };

            if let Err(err) = outcome {
                warn!(node = channel.node_name(), start, "Cycle failed: {}", err);
                return Err(err);
            }
        }

        if let Some(element_type) = self.time_signal {
            let index = self.channels.len();
            if let Some(out) = self.buffer.slot_mut(index) {
                write_time(element_type, start, out);
            }
        }

        trace!(cycle = self.clock.cycles(), start, "Cycle produced");
        self.clock.advance();
        Ok(())
    }

    pub fn tree_name(&self) -> &str {
        &self.tree_name
    }

    pub fn shot(&self) -> Shot {
        self.shot
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Index of the channel reading `node`
    pub fn channel_index(&self, node: &str) -> Option<usize> {
        self.channels.iter().position(|channel| channel.node_name() == node)
    }

    /// The channel's slot in the output buffer, valid until the next cycle
    pub fn channel_slice(&self, index: usize) -> Option<&[u8]> {
        if index >= self.channels.len() {
            return None;
        }
        self.buffer.slot(index)
    }

    /// Typed copy of a channel's slot; `None` when `E` is not the
    /// channel's element type
    pub fn channel_values<E: Element>(&self, index: usize) -> Option<Vec<E>> {
        let channel = self.channels.get(index)?;
        if channel.element_type() != E::TYPE {
            return None;
        }
        self.buffer.decode(index)
    }

    /// Slot holding the cycle start time in microseconds, when configured
    pub fn time_slice(&self) -> Option<&[u8]> {
        self.time_signal?;
        self.buffer.slot(self.channels.len())
    }

    pub fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    /// Start time of the next cycle, in seconds
    pub fn cycle_time(&self) -> f64 {
        self.clock.time()
    }

    pub fn cycles_produced(&self) -> u64 {
        self.clock.cycles()
    }

    pub fn clock(&self) -> &CycleClock {
        &self.clock
    }
}

fn bind_channel<T: PulseTree>(tree: &T, spec: ChannelSpec, frequency: f64) -> Result<Channel> {
    let node = tree.open_node(&spec.node)?;
    let stored = ElementType::from_store_code(tree.type_code(node)?)?;
    spec.element_type.check_matches(stored)?;

    let max_segments = tree.segment_count(node)?;
    if max_segments == 0 {
        return Err(ReaderError::EmptyNode(spec.node));
    }

    let channel = Channel::new(spec, node, frequency, max_segments);
    if channel.data_management() == DataManagement::Raw {
        check_sampling_time(tree, &channel)?;
    }

    debug!(
        node = channel.node_name(),
        element_type = %channel.element_type(),
        elements = channel.elements(),
        segments = max_segments,
        data_management = ?channel.data_management(),
        hole_management = ?channel.hole_management(),
        "Channel bound"
    );
    Ok(channel)
}

/// Raw copies only make sense when the store holds samples at the output
/// rate. The stored rate is taken from the first segment.
fn check_sampling_time<T: PulseTree>(tree: &T, channel: &Channel) -> Result<()> {
    let limits = tree.segment_limits(channel.node, 0)?;
    let count = tree.segment_payload(channel.node, 0)?.element_count;
    let Some(stored) = limits.sample_step(count) else {
        return Ok(());
    };

    let configured = channel.sampling_period();
    let scale = configured.abs().max(stored.abs());
    if (stored - configured).abs() > SAMPLING_TIME_TOLERANCE * scale {
        return Err(ReaderError::SamplingTimeMismatch {
            node: channel.node_name().to_string(),
            configured,
            stored,
        });
    }
    Ok(())
}

fn write_time(element_type: ElementType, start: f64, out: &mut [u8]) {
    let micros = (start * MICROSECONDS_PER_SECOND).round();
    dispatch_element!(element_type, E => {
        match E::cast_from_f64(micros) {
            Some(value) => value.write_ne(out),
            None => warn!(micros, %element_type, "Cycle time does not fit the time signal"),
        }
    })
}
