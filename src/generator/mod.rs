//! Per-voice signal generators
//!
//! Everything in here runs on the render path: fixed-point only, no
//! allocation.

pub mod envelope;
pub mod fixed;
pub mod random;
pub mod tone;

pub use envelope::{Envelope, EnvelopeStage};
pub use random::XorShift8;
pub use tone::Voice;

/// Represents the current state of a signal generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Generator is still producing samples
    Running,
    /// Generator has completed and will produce no more samples
    Complete,
}

/// Core trait for block-oriented signal generators
///
/// Generators produce samples block by block. The block length is chosen by
/// the caller (the host audio runtime, a plotting tool, a test).
pub trait SignalGenerator {
    /// Sample type written into the block
    type Sample: Copy;

    /// Process the next block of samples
    ///
    /// # Returns
    /// * `GeneratorState::Running` if the generator is still active
    /// * `GeneratorState::Complete` if the generator has finished
    ///
    /// # Note
    /// Even when Complete is returned, the whole buffer is filled with valid
    /// samples (silence after the end).
    fn process(&mut self, buffer: &mut [Self::Sample]) -> GeneratorState;

    /// Check if this generator has completed
    fn is_complete(&self) -> bool;

    /// Reset the generator to its idle state
    fn reset(&mut self);
}
