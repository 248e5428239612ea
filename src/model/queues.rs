// src/model/queues.rs

/// A fixed-length shift register of quantities in transit.
///
/// The buffer length equals the transit delay and never changes. Every turn
/// exactly one quantity leaves (the oldest) and exactly one enters, so a
/// quantity admitted at turn `T` arrives at turn `T + delay`.
#[derive(Debug, Clone)]
pub struct DelayLine {
    slots: Box<[u32]>,
    // Index of the oldest slot, i.e. the next arrival.
    head: usize,
}

impl DelayLine {
    /// Builds a line of `delay` slots, each pre-filled with `fill` units.
    ///
    /// # Panics
    /// Panics if `delay` is zero. Configuration validation rejects zero delays
    /// before any line is built.
    pub fn new(delay: usize, fill: u32) -> Self {
        assert!(delay > 0, "delay line needs at least one slot");
        Self {
            slots: vec![fill; delay].into_boxed_slice(),
            head: 0,
        }
    }

    /// The quantity that will arrive on the next `advance`.
    pub fn peek_arrival(&self) -> u32 {
        self.slots[self.head]
    }

    /// Shifts the line by one turn: the oldest quantity leaves and is returned,
    /// `departure` takes its slot at the tail.
    pub fn advance(&mut self, departure: u32) -> u32 {
        let arrival = std::mem::replace(&mut self.slots[self.head], departure);
        self.head = (self.head + 1) % self.slots.len();
        arrival
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Total quantity currently in transit.
    pub fn in_transit(&self) -> u64 {
        self.slots.iter().map(|&q| u64::from(q)).sum()
    }
}
