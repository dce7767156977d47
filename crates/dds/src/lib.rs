//! Direct digital synthesis primitives.
//!
//! This crate contains the building blocks for generating a phase-coherent waveform stream:
//! a 64-bit phase accumulator [`Oscillator`], a quantized sine lookup [`SineTable`], and a
//! linear congruential [`Dither`] generator supplying per-sample noise for phase and
//! amplitude dithering.
//!
//! All values live in a common phase domain where the full `u64` range `[0, 2^64)`
//! represents one waveform cycle. [`hz_to_phase`] and [`degrees_to_phase`] convert
//! real-world units into that domain.
//!
//! # Examples
//! ```
//! # use dds::{Oscillator, SineTable, hz_to_phase};
//! // A 1 kHz tone at a 48 kHz sample rate
//! let mut osc = Oscillator::new(hz_to_phase(48000.0, 1000.0));
//! let sine = SineTable::new();
//!
//! // Synthesize one cycle (48 samples)
//! let cycle: Vec<i16> = (0..48).map(|_| sine.lookup(osc.advance())).collect();
//! assert_eq!(cycle[0], sine.lookup(osc.advance()));
//! ```

mod dither;
mod osc;
mod table;

pub use dither::Dither;
pub use osc::{degrees_to_phase, hz_to_phase, Oscillator};
pub use table::{SineTable, AMPLITUDE, SINE_SHIFT, SINE_SIZE};
