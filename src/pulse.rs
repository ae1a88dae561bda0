//! Fixed-capacity storage for captured pulse widths.

/// Number of data bits in one DHT22 transmission.
pub const DATA_BITS: usize = 40;

/// Samples that make up a full transmission: one lead-in pulse followed by
/// the 40 data bits.
pub const FRAME_PULSES: usize = DATA_BITS + 1;

/// Buffer capacity, one slack entry past a full transmission.
pub const CAPACITY: usize = 42;

/// Pulse widths of one transmission, in timer ticks or polling counts.
///
/// Index 0 holds the lead-in pulse, indices 1 to 40 the data bits.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PulseBuffer {
    widths: [u16; CAPACITY],
    len: usize,
}

impl PulseBuffer {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        PulseBuffer {
            widths: [0; CAPACITY],
            len: 0,
        }
    }

    /// Appends a width.
    ///
    /// Returns `false` and drops the sample when the buffer is full.
    pub fn push(&mut self, width: u16) -> bool {
        match self.widths.get_mut(self.len) {
            Some(slot) => {
                *slot = width;
                self.len += 1;
                true
            }
            None => false,
        }
    }

    /// Returns the width at `index` if it has been written during this read.
    pub fn get(&self, index: usize) -> Option<u16> {
        self.as_slice().get(index).copied()
    }

    /// Number of widths written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True before the first sample.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once the lead-in pulse and all 40 data bits are stored.
    pub fn is_complete(&self) -> bool {
        self.len >= FRAME_PULSES
    }

    /// The written widths.
    pub fn as_slice(&self) -> &[u16] {
        &self.widths[..self.len]
    }

    /// Empties the buffer.
    pub fn clear(&mut self) {
        self.widths = [0; CAPACITY];
        self.len = 0;
    }
}

impl Default for PulseBuffer {
    fn default() -> Self {
        Self::new()
    }
}
