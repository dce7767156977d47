//! Pseudorandom dither generator.

/// LCG multiplier, from Knuth's MMIX. Chosen for good spectral properties in the top bits.
const LCG_MUL: u64 = 6364136223846793005;

/// A linear congruential pseudorandom generator for dithering.
///
/// Each call to [`Dither::next`] advances the generator by one step
/// (`state' = state * 6364136223846793005 + 1`) and yields the top 32 bits of the new
/// state. The low bits of an LCG have short periods, so only the top half is consumed.
///
/// One draw is made per output sample; callers slice distinct bit ranges out of the draw
/// for each channel and purpose so that no two channels receive identical noise.
#[derive(Clone, Copy, Default)]
pub struct Dither {
	state: u64
}

impl Dither {
	/// Create a generator with the given seed.
	pub fn new(seed: u64) -> Dither {
		Dither { state: seed }
	}

	/// Advance the generator and return 32 pseudorandom bits.
	#[inline(always)]
	pub fn next(&mut self) -> u32 {
		self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(1);
		(self.state >> 32) as u32
	}
}
