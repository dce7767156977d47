//! Quantized sine lookup table.

use core::f64::consts::TAU;

/// Number of bits used to index the sine table.
pub const SINE_SHIFT: u32 = 10;

/// Number of entries in the sine table.
pub const SINE_SIZE: usize = 1 << SINE_SHIFT;

/// Peak amplitude of table entries.
///
/// Slightly below `i16::MAX` to leave headroom for the 8-bit amplitude dither added after
/// lookup, so a dithered sample can never overflow 16 bits.
pub const AMPLITUDE: i16 = 0x7EFF;

/// One full sine cycle, quantized to [`SINE_SIZE`] signed 16-bit entries.
///
/// The table is indexed by the top [`SINE_SHIFT`] bits of a 64-bit phase value, so a full
/// phase sweep `[0, 2^64)` walks exactly one cycle. Built once at construction; immutable
/// afterwards.
pub struct SineTable {
	entries: [i16; SINE_SIZE]
}

impl SineTable {
	/// Build the table.
	pub fn new() -> SineTable {
		let mut entries = [0; SINE_SIZE];
		for (i, e) in entries.iter_mut().enumerate() {
			*e = (f64::sin(TAU * i as f64 / SINE_SIZE as f64) * AMPLITUDE as f64).round() as i16;
		}
		SineTable { entries }
	}

	/// Look up the sample for a 64-bit phase value.
	///
	/// Only the top [`SINE_SHIFT`] bits of `phase` select an entry; lower bits are
	/// truncated (callers dither the phase first to decorrelate that truncation).
	#[inline(always)]
	pub fn lookup(&self, phase: u64) -> i16 {
		self.entries[(phase >> (64 - SINE_SHIFT)) as usize]
	}
}

impl Default for SineTable {
	fn default() -> SineTable {
		SineTable::new()
	}
}
