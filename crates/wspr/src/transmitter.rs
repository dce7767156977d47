//! The WSPR transmitter core: scheduler state machine and sample emitter.

use dds::{degrees_to_phase, hz_to_phase, Dither, Oscillator, SineTable, SINE_SHIFT};
use crate::{ConfigError, Symbols, MAX_BANDS, SYMBOL_COUNT, SYMBOL_RATE};

/// Output code emitted on all channels while no transmission is active.
pub const IDLE_CODE: u8 = 0x80;

/// Quantization bias centering the dithered 16-bit sample range on the unsigned 8-bit
/// output mid-scale.
const QUANT_BIAS: i32 = 0x7F00;

/// Transmitter configuration.
///
/// Validated once by [`Transmitter::new`]; see [`ConfigError`] for the ways validation
/// can fail.
pub struct Config {
	/// Exact (device-negotiated, correction-applied) sample rate in Hz.
	pub sample_rate: f64,
	/// Center frequencies in Hz, cycled between on successive transmissions. Must contain
	/// 1 to [`MAX_BANDS`] entries.
	pub frequencies: Vec<f64>,
	/// The 162-symbol frame to transmit.
	pub symbols: Symbols,
	/// Phase shift of channel 1 relative to channel 0, in degrees.
	pub phase_shift_1: f64,
	/// Phase shift of channel 2 relative to channel 0, in degrees.
	pub phase_shift_2: f64,
	/// Whether to exchange the two phase shifts before each transmission.
	pub swap_shifts: bool
}

/// One planar output buffer per channel.
///
/// All three slices should be the same length; [`Transmitter::fill`] writes the number of
/// frames held by the shortest one and leaves any excess untouched.
pub struct ChannelBuffers<'a> {
	/// Channel 0, unshifted phase.
	pub ch0: &'a mut [u8],
	/// Channel 1, shifted by the first configured phase shift.
	pub ch1: &'a mut [u8],
	/// Channel 2, shifted by the second configured phase shift.
	pub ch2: &'a mut [u8]
}

impl ChannelBuffers<'_> {
	/// The number of frames that a fill call will write.
	pub fn frames(&self) -> usize {
		self.ch0.len().min(self.ch1.len()).min(self.ch2.len())
	}
}

/// Scheduler events that occurred during one fill call.
///
/// The transmitter performs no I/O of its own; callers use the report to log transmission
/// progress and to count completed frames.
#[derive(Clone, Copy, Default)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct FillReport {
	/// A transmission started during this call, on the contained band index.
	pub started: Option<usize>,
	/// A transmission ran through all 162 symbols and returned to idle during this call.
	pub finished: bool
}

/// A WSPR DDS transmitter.
///
/// All state is created by [`Transmitter::new`] and mutated only by
/// [`Transmitter::fill`], which the device layer calls once per buffer request. State
/// carries across calls, so the output stream stays phase coherent indefinitely.
///
/// The scheduler starts a transmission when a fill call lands on
/// `unix_seconds % 120 == 1` — one second into the two-minute WSPR transmit window —
/// while idle. Each transmission walks the 162-symbol frame at the WSPR symbol rate,
/// setting the oscillator to `center + symbol * tone_spacing` on every symbol boundary
/// with no pulse shaping, then returns to idle.
pub struct Transmitter {
	osc: Oscillator,
	sine: SineTable,
	dither: Dither,

	/// Phase offsets for channels 1 and 2, possibly swapped per transmission.
	shift1: u64,
	shift2: u64,
	swap_shifts: bool,

	active: bool,
	symbols: Symbols,
	symbol_index: usize,
	/// Secondary phase accumulator at the symbol rate; wrapping marks a symbol boundary.
	symbol_phase: u64,
	symbol_step: u64,
	base_freq: u64,
	bands: Vec<u64>,
	band_index: usize
}

impl Transmitter {
	/// Construct a transmitter, validating the configuration.
	///
	/// Frequencies and phase shifts are converted into the 64-bit phase domain once, using
	/// the configured sample rate; nothing is recomputed per sample.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::NoFrequencies`] / [`ConfigError::TooManyFrequencies`] if the
	/// frequency list is empty or longer than [`MAX_BANDS`], and
	/// [`ConfigError::InvalidSampleRate`] if the sample rate is not a positive, finite
	/// number. No partially initialized transmitter is ever returned.
	pub fn new(config: &Config) -> Result<Transmitter, ConfigError> {
		if !(config.sample_rate.is_finite() && config.sample_rate > 0.0) {
			return Err(ConfigError::InvalidSampleRate(config.sample_rate));
		}
		if config.frequencies.is_empty() {
			return Err(ConfigError::NoFrequencies);
		}
		if config.frequencies.len() > MAX_BANDS {
			return Err(ConfigError::TooManyFrequencies(config.frequencies.len()));
		}

		let fs = config.sample_rate;
		Ok(Transmitter {
			osc: Oscillator::new(0),
			sine: SineTable::new(),
			dither: Dither::new(0),
			shift1: degrees_to_phase(config.phase_shift_1),
			shift2: degrees_to_phase(config.phase_shift_2),
			swap_shifts: config.swap_shifts,
			active: false,
			symbols: config.symbols,
			symbol_index: 0,
			symbol_phase: 0,
			symbol_step: hz_to_phase(fs, SYMBOL_RATE),
			base_freq: 0,
			bands: config.frequencies.iter().map(|&f| hz_to_phase(fs, f)).collect(),
			band_index: 0
		})
	}

	/// The tone frequency for a symbol: center plus `symbol` times the tone spacing.
	#[inline(always)]
	fn tone(&self, index: usize) -> u64 {
		self.base_freq.wrapping_add(self.symbol_step.wrapping_mul(self.symbols.value(index) as u64))
	}

	/// Begin a transmission on the next band. Returns the band index used.
	fn start(&mut self) -> usize {
		let band = self.band_index;
		self.band_index = (band + 1) % self.bands.len();
		self.symbol_index = 0;
		self.symbol_phase = 0;
		self.base_freq = self.bands[band];
		self.osc.reset();
		self.osc.set_freq(self.tone(0));
		if self.swap_shifts {
			std::mem::swap(&mut self.shift1, &mut self.shift2);
		}
		self.active = true;
		band
	}

	/// Fill one buffer request.
	///
	/// `time` is the current wall-clock time in unix seconds, sampled once by the caller
	/// for this invocation; it is only used to decide whether to start a transmission, so
	/// a coarse reading is fine.
	///
	/// Exactly [`ChannelBuffers::frames`] samples are produced on every channel, advancing
	/// all transmitter state by that many samples. The call performs no I/O, never blocks,
	/// and does work proportional to the requested frame count.
	pub fn fill(&mut self, time: i64, bufs: ChannelBuffers<'_>) -> FillReport {
		let mut report = FillReport::default();
		if !self.active && time.rem_euclid(120) == 1 {
			report.started = Some(self.start());
		}

		let n = bufs.frames();
		let samples = bufs.ch0[..n].iter_mut()
			.zip(&mut bufs.ch1[..n])
			.zip(&mut bufs.ch2[..n]);
		for ((s0, s1), s2) in samples {
			// One pseudorandom draw per sample; each channel and purpose consumes a
			// distinct bit range so the channels' dither noise is uncorrelated.
			let rnd = self.dither.next();
			if !self.active {
				*s0 = IDLE_CODE;
				*s1 = IDLE_CODE;
				*s2 = IDLE_CODE;
				continue;
			}

			// Dither the phase in the bits below the table resolution before truncation
			let ph = self.osc.advance()
				.wrapping_add((rnd as u64) << (64 - 32 - SINE_SHIFT));
			let out0 = self.sine.lookup(ph) as i32 + (rnd & 0xFF) as i32;
			let out1 = self.sine.lookup(ph.wrapping_add(self.shift1)) as i32
				+ (rnd >> 8 & 0xFF) as i32;
			let out2 = self.sine.lookup(ph.wrapping_add(self.shift2)) as i32
				+ (rnd >> 16 & 0xFF) as i32;
			*s0 = quantize(out0);
			*s1 = quantize(out1);
			*s2 = quantize(out2);

			// Next symbol when the symbol-rate accumulator wraps
			let sp = self.symbol_phase;
			self.symbol_phase = sp.wrapping_add(self.symbol_step);
			if self.symbol_phase < sp {
				self.symbol_index += 1;
				if self.symbol_index < SYMBOL_COUNT {
					self.osc.set_freq(self.tone(self.symbol_index));
				} else {
					self.active = false;
					report.finished = true;
				}
			}
		}
		report
	}
}

/// Quantize a dithered 16-bit sample to the unsigned 8-bit output.
///
/// `value` must be within `[-0x7EFF, 0x7EFF + 0xFF]` (sine amplitude plus dither), which
/// the bias maps into `[1, 0xFEFE]` before dropping the low 8 bits.
#[inline(always)]
fn quantize(value: i32) -> u8 {
	((QUANT_BIAS + value) as u16 >> 8) as u8
}

#[cfg(test)]
mod tests {
	use std::str::FromStr;
	use super::*;

	/// A valid frame exercising all four symbol values.
	fn symbols() -> Symbols {
		Symbols::from_str(&("0123".repeat(40) + "10")).unwrap()
	}

	fn config(sample_rate: f64, frequencies: Vec<f64>) -> Config {
		Config {
			sample_rate,
			frequencies,
			symbols: symbols(),
			phase_shift_1: 0.0,
			phase_shift_2: 0.0,
			swap_shifts: false
		}
	}

	/// Run one fill over `n` samples and return the channel 0 output.
	fn fill_ch0(tx: &mut Transmitter, time: i64, n: usize) -> (Vec<u8>, FillReport) {
		let mut c0 = vec![0u8; n];
		let mut c1 = vec![0u8; n];
		let mut c2 = vec![0u8; n];
		let report = tx.fill(time, ChannelBuffers {
			ch0: &mut c0,
			ch1: &mut c1,
			ch2: &mut c2
		});
		(c0, report)
	}

	#[test]
	fn config_validation_test() {
		assert!(Transmitter::new(&config(48000.0, vec![1500.0])).is_ok());
		assert_eq!(
			Transmitter::new(&config(48000.0, vec![])).err(),
			Some(ConfigError::NoFrequencies)
		);
		assert_eq!(
			Transmitter::new(&config(48000.0, vec![1500.0; 17])).err(),
			Some(ConfigError::TooManyFrequencies(17))
		);
		assert!(Transmitter::new(&config(48000.0, vec![1500.0; 16])).is_ok());
		assert_eq!(
			Transmitter::new(&config(0.0, vec![1500.0])).err(),
			Some(ConfigError::InvalidSampleRate(0.0))
		);
		assert_eq!(
			Transmitter::new(&config(-1.0, vec![1500.0])).err(),
			Some(ConfigError::InvalidSampleRate(-1.0))
		);
		assert!(Transmitter::new(&config(f64::NAN, vec![1500.0])).is_err());
	}

	#[test]
	fn quantize_test() {
		// Zero signal sits one code below the idle mid-scale
		assert_eq!(quantize(0), 0x7F);
		assert_eq!(quantize(-0x7EFF), 0x00);
		assert_eq!(quantize(0x7EFF + 0xFF), 0xFE);
	}

	#[test]
	fn idle_test() {
		let mut tx = Transmitter::new(&config(48000.0, vec![1500.0])).unwrap();
		for time in [0, 2, 119, 120, 243] {
			let (c0, report) = fill_ch0(&mut tx, time, 512);
			assert_eq!(report, FillReport::default());
			assert!(c0.iter().all(|&v| v == IDLE_CODE), "time {}", time);
		}
	}

	/// Sample rate giving exactly 4 samples per symbol (symbol step = 2^62), so a full
	/// frame is 162 * 4 = 648 samples.
	const FAST_RATE: f64 = SYMBOL_RATE * 4.0;

	#[test]
	fn frame_length_test() {
		let mut tx = Transmitter::new(&config(FAST_RATE, vec![0.1])).unwrap();
		assert_eq!(tx.symbol_step, 1 << 62);

		let (_, report) = fill_ch0(&mut tx, 121, 648);
		assert_eq!(report.started, Some(0));
		assert!(report.finished);
		assert!(!tx.active);
		assert_eq!(tx.symbol_index, SYMBOL_COUNT);

		// Back to idle on the next call
		let (c0, report) = fill_ch0(&mut tx, 122, 16);
		assert_eq!(report, FillReport::default());
		assert!(c0.iter().all(|&v| v == IDLE_CODE));

		// Same frame length at half the symbol step
		let mut tx = Transmitter::new(&config(SYMBOL_RATE * 8.0, vec![0.1])).unwrap();
		let (_, report) = fill_ch0(&mut tx, 1, 8 * SYMBOL_COUNT);
		assert!(report.finished);

		// One sample short of the last boundary: still transmitting
		let mut tx = Transmitter::new(&config(FAST_RATE, vec![0.1])).unwrap();
		let (_, report) = fill_ch0(&mut tx, 1, 647);
		assert!(!report.finished);
		assert!(tx.active);
		let (_, report) = fill_ch0(&mut tx, 1, 1);
		assert!(report.finished);
	}

	#[test]
	fn band_rotation_test() {
		let mut tx = Transmitter::new(&config(FAST_RATE, vec![0.1, 0.2, 0.3])).unwrap();
		for expected in [0, 1, 2, 0, 1] {
			let (_, report) = fill_ch0(&mut tx, 1, 1024);
			assert_eq!(report.started, Some(expected));
			assert!(report.finished);
			assert_eq!(tx.base_freq, tx.bands[expected]);
		}
	}

	#[test]
	fn tone_sequence_test() {
		let mut tx = Transmitter::new(&config(FAST_RATE, vec![0.25])).unwrap();
		let step = tx.symbol_step;

		// Start: tone for symbol 0
		fill_ch0(&mut tx, 1, 1);
		let base = tx.base_freq;
		assert_eq!(tx.osc.freq(), base.wrapping_add(step * tx.symbols.value(0) as u64));

		// After each 4-sample symbol period the oscillator moves to the next tone
		for i in 1..SYMBOL_COUNT {
			fill_ch0(&mut tx, 1, 4);
			assert_eq!(
				tx.osc.freq(),
				base.wrapping_add(step * tx.symbols.value(i) as u64),
				"symbol {}", i
			);
		}
	}

	#[test]
	fn shift_swap_test() {
		let mut cfg = config(FAST_RATE, vec![0.1]);
		cfg.phase_shift_1 = 90.0;
		cfg.phase_shift_2 = 270.0;
		cfg.swap_shifts = true;
		let mut tx = Transmitter::new(&cfg).unwrap();
		let (p1, p2) = (tx.shift1, tx.shift2);
		assert_ne!(p1, p2);

		// Swapped once per transmission start, not per sample
		let (_, report) = fill_ch0(&mut tx, 1, 1024);
		assert!(report.finished);
		assert_eq!((tx.shift1, tx.shift2), (p2, p1));
		fill_ch0(&mut tx, 1, 1024);
		assert_eq!((tx.shift1, tx.shift2), (p1, p2));

		// Without the flag the shifts never change
		cfg.swap_shifts = false;
		let mut tx = Transmitter::new(&cfg).unwrap();
		fill_ch0(&mut tx, 1, 1024);
		assert_eq!((tx.shift1, tx.shift2), (p1, p2));
	}

	#[test]
	fn quadrature_test() {
		// With a 90 degree shift and a tone that walks the table in large steps, channel 1
		// leads channel 0 by a quarter cycle.
		let mut cfg = config(48000.0, vec![12000.0]);
		cfg.symbols = Symbols::new([0; SYMBOL_COUNT]).unwrap();
		cfg.phase_shift_1 = 90.0;
		let mut tx = Transmitter::new(&cfg).unwrap();

		let n = 256;
		let mut c0 = vec![0u8; n];
		let mut c1 = vec![0u8; n];
		let mut c2 = vec![0u8; n];
		tx.fill(1, ChannelBuffers { ch0: &mut c0, ch1: &mut c1, ch2: &mut c2 });

		// Channel 2 is unshifted, so it matches channel 0 exactly up to amplitude dither
		for (&a, &b) in c0.iter().zip(c2.iter()) {
			assert!((a as i32 - b as i32).abs() <= 1);
		}
		// A quarter-cycle lead at 4 samples per cycle is a one-sample offset. The two
		// samples carry independent dither draws, so allow two codes of slack.
		for (&a, &b) in c1.iter().zip(c0.iter().skip(1)) {
			assert!((a as i32 - b as i32).abs() <= 2);
		}
	}

	#[test]
	fn dither_bias_test() {
		// Over a long stretch of a fixed tone, dithered quantization should leave the
		// output mean at the unbiased code (QUANT_BIAS >> 8 = 127 exactly). Truncating
		// quantization without dither would sit half a code low.
		let mut cfg = config(48000.0, vec![12000.0]);
		cfg.symbols = Symbols::new([0; SYMBOL_COUNT]).unwrap();
		let mut tx = Transmitter::new(&cfg).unwrap();

		const N: usize = 1 << 19;
		let (c0, report) = fill_ch0(&mut tx, 1, N);
		assert_eq!(report.started, Some(0));
		assert!(!report.finished);

		let mean = c0.iter().map(|&v| v as f64).sum::<f64>() / N as f64;
		assert!((mean - 127.0).abs() < 0.2, "mean {}", mean);
	}

	#[test]
	fn end_to_end_test() {
		// At 12 kHz the symbol step is exactly 2^64 / 8192, so a frame must take
		// exactly 162 * 8192 samples.
		let mut tx = Transmitter::new(&config(12000.0, vec![1500.0])).unwrap();
		let (_, report) = fill_ch0(&mut tx, 1, 64);
		assert_eq!(report.started, Some(0));

		let mut samples: u64 = 64;
		loop {
			let (_, report) = fill_ch0(&mut tx, 0, 4096);
			samples += 4096;
			if report.finished {
				break;
			}
			assert!(samples < 2_000_000, "frame never completed");
		}

		// The final fill overshoots the frame end by less than one chunk
		let expected = 162 * 8192;
		assert!(samples >= expected && samples < expected + 4096, "samples {}", samples);
	}

	#[test]
	fn mismatched_buffer_test() {
		// The emitter adapts to the shortest channel buffer and leaves excess untouched
		let mut tx = Transmitter::new(&config(48000.0, vec![1500.0])).unwrap();
		let mut c0 = vec![0xAA; 10];
		let mut c1 = vec![0xAA; 8];
		let mut c2 = vec![0xAA; 9];
		tx.fill(0, ChannelBuffers { ch0: &mut c0, ch1: &mut c1, ch2: &mut c2 });
		assert!(c0[..8].iter().all(|&v| v == IDLE_CODE));
		assert!(c1.iter().all(|&v| v == IDLE_CODE));
		assert!(c2[..8].iter().all(|&v| v == IDLE_CODE));
		assert_eq!(&c0[8..], &[0xAA, 0xAA]);
		assert_eq!(c2[8], 0xAA);
	}

	#[test]
	fn phase_continuity_test() {
		// Filling in many small chunks produces the same stream as one large fill
		let mut tx1 = Transmitter::new(&config(48000.0, vec![1500.0])).unwrap();
		let mut tx2 = Transmitter::new(&config(48000.0, vec![1500.0])).unwrap();

		let (big, _) = fill_ch0(&mut tx1, 1, 4096);
		let mut small = Vec::new();
		let mut first = true;
		while small.len() < 4096 {
			let (chunk, _) = fill_ch0(&mut tx2, if first { 1 } else { 0 }, 128);
			small.extend_from_slice(&chunk);
			first = false;
		}
		assert_eq!(big, small);
	}
}
