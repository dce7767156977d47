//! Phase accumulator oscillator and phase-domain conversions.

/// Convert a frequency in Hz to a per-sample phase increment.
///
/// The returned value is the amount a 64-bit phase accumulator must advance per sample so
/// that accumulating it for `sample_rate` samples advances the phase by exactly `hz`
/// cycles, where the full `u64` range represents one cycle.
///
/// `hz` should satisfy `0 <= hz < sample_rate` for a meaningful result; values at or above
/// the sample rate alias.
///
/// # Examples
/// ```
/// # use dds::hz_to_phase;
/// // A quarter of the sample rate advances a quarter cycle per sample
/// assert_eq!(hz_to_phase(48000.0, 12000.0), 1u64 << 62);
/// assert_eq!(hz_to_phase(48000.0, 0.0), 0);
/// ```
#[inline]
pub fn hz_to_phase(sample_rate: f64, hz: f64) -> u64 {
	(hz / sample_rate * ((1u64 << 63) as f64 * 2.0)) as u64
}

/// Convert an angle in degrees to a phase offset.
///
/// The angle is normalized into `[0, 360)` first, so negative angles wrap the way phase
/// offsets are expected to (`-90` and `270` are the same offset).
///
/// # Examples
/// ```
/// # use dds::degrees_to_phase;
/// assert_eq!(degrees_to_phase(180.0), 1u64 << 63);
/// assert_eq!(degrees_to_phase(-90.0), degrees_to_phase(270.0));
/// ```
#[inline]
pub fn degrees_to_phase(degrees: f64) -> u64 {
	(degrees.rem_euclid(360.0) * ((1u64 << 63) as f64 / 180.0)) as u64
}

/// A 64-bit phase accumulator.
///
/// The phase wraps modulo `2^64`, representing position within one waveform cycle. The
/// frequency is a per-sample increment in the same domain, typically produced by
/// [`hz_to_phase`].
#[derive(Clone, Copy, Default)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Oscillator {
	phase: u64,
	freq: u64
}

impl Oscillator {
	/// Create an oscillator at phase zero with the given frequency.
	pub fn new(freq: u64) -> Oscillator {
		Oscillator { phase: 0, freq }
	}

	/// Advance the phase by one sample and return the new phase.
	#[inline(always)]
	pub fn advance(&mut self) -> u64 {
		self.phase = self.phase.wrapping_add(self.freq);
		self.phase
	}

	/// The current phase.
	#[inline(always)]
	pub fn phase(&self) -> u64 {
		self.phase
	}

	/// The current per-sample phase increment.
	#[inline(always)]
	pub fn freq(&self) -> u64 {
		self.freq
	}

	/// Change the per-sample phase increment, keeping phase continuity.
	#[inline(always)]
	pub fn set_freq(&mut self, freq: u64) {
		self.freq = freq;
	}

	/// Reset the phase to zero.
	#[inline(always)]
	pub fn reset(&mut self) {
		self.phase = 0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hz_to_phase_test() {
		assert_eq!(hz_to_phase(48000.0, 0.0), 0);
		assert_eq!(hz_to_phase(48000.0, 12000.0), 1 << 62);
		assert_eq!(hz_to_phase(48000.0, 24000.0), 1 << 63);
		assert_eq!(hz_to_phase(100e6, 25e6), 1 << 62);

		// One cycle per second of samples, within rounding
		let f = hz_to_phase(48000.0, 1.0);
		let err = (f as i128 * 48000 - (1i128 << 64)).unsigned_abs();
		assert!(err < 48000);
	}

	#[test]
	fn degrees_to_phase_test() {
		assert_eq!(degrees_to_phase(0.0), 0);
		assert_eq!(degrees_to_phase(90.0), 1 << 62);
		assert_eq!(degrees_to_phase(180.0), 1 << 63);
		assert_eq!(degrees_to_phase(270.0), 3 << 62);
		assert_eq!(degrees_to_phase(360.0), 0);
		assert_eq!(degrees_to_phase(-90.0), 3 << 62);
	}

	#[test]
	fn accuracy_test() {
		// Accumulating hz_to_phase(fs, hz) for fs samples must land within one table
		// resolution unit (2^54 for a 1024-entry table) of a whole number of cycles.
		for &(fs, hz) in &[(48000u64, 1000.0), (48000, 19999.0), (44100, 440.0),
		                   (100_000_000, 7040100.0), (192000, 60000.0)] {
			let f = hz_to_phase(fs as f64, hz);
			let mut osc = Oscillator::new(f);
			for _ in 0..fs {
				osc.advance();
			}
			// Distance from the nearest exact cycle boundary
			let err = (osc.phase() as i64).unsigned_abs();
			assert!(err < 1 << 54, "fs={} hz={} err={}", fs, hz, err);
		}
	}

	#[test]
	fn wrap_test() {
		let mut osc = Oscillator::new(u64::MAX);
		assert_eq!(osc.advance(), u64::MAX);
		assert_eq!(osc.advance(), u64::MAX - 1);
		osc.reset();
		assert_eq!(osc.phase(), 0);
		osc.set_freq(1 << 63);
		assert_eq!(osc.advance(), 1 << 63);
		assert_eq!(osc.advance(), 0);
	}
}
