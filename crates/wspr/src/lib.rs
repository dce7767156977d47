//! WSPR transmission synthesis.
//!
//! This crate turns a pre-encoded [WSPR] symbol sequence into a continuous, phase-coherent
//! stream of quantized samples for a DDS transmitter. It does not encode messages
//! (callsign/locator/power) into symbols — sequences come from an external encoder such as
//! `wsprcode` — and it has no receive path.
//!
//! The entry point is [`Transmitter`]: construct one from a validated [`Config`], then
//! call [`Transmitter::fill`] once per device buffer request. The transmitter idles at a
//! fixed mid-scale output and starts a 162-symbol transmission whenever a fill call lands
//! in a two-minute-aligned transmit window, rotating through the configured center
//! frequencies on successive transmissions.
//!
//! [WSPR]: https://en.wikipedia.org/wiki/WSPR_(amateur_radio_software)
//!
//! # Examples
//! ```
//! # use wspr::{Config, Symbols, Transmitter};
//! # use std::str::FromStr;
//! let symbols = Symbols::from_str(&("0123".repeat(40) + "10")).unwrap();
//! let config = Config {
//! 	sample_rate: 48000.0,
//! 	frequencies: vec![1500.0],
//! 	symbols,
//! 	phase_shift_1: 0.0,
//! 	phase_shift_2: 0.0,
//! 	swap_shifts: false
//! };
//! let mut tx = Transmitter::new(&config).unwrap();
//!
//! let (mut c0, mut c1, mut c2) = ([0u8; 1024], [0u8; 1024], [0u8; 1024]);
//! // Outside a transmit window the output is the idle code on every channel
//! let report = tx.fill(0, wspr::ChannelBuffers {
//! 	ch0: &mut c0,
//! 	ch1: &mut c1,
//! 	ch2: &mut c2
//! });
//! assert_eq!(report.started, None);
//! assert!(c0.iter().all(|&v| v == 0x80));
//! ```

use std::{error, fmt};
use std::str::FromStr;

mod transmitter;

pub use transmitter::{ChannelBuffers, Config, FillReport, Transmitter, IDLE_CODE};

/// Number of symbols in a WSPR frame.
pub const SYMBOL_COUNT: usize = 162;

/// WSPR symbol rate in Hz (baud). Also the spacing between adjacent FSK tones.
pub const SYMBOL_RATE: f64 = 12000.0 / 8192.0;

/// Maximum number of configured center frequencies.
pub const MAX_BANDS: usize = 16;

/// The error type for transmitter configuration.
#[derive(PartialEq)]
pub enum ConfigError {
	/// No center frequencies were configured.
	NoFrequencies,
	/// More than [`MAX_BANDS`] center frequencies were configured. The number supplied is
	/// provided in the payload.
	TooManyFrequencies(usize),
	/// The symbol sequence does not contain exactly [`SYMBOL_COUNT`] symbols. The number
	/// supplied is provided in the payload.
	SymbolCount(usize),
	/// A symbol was outside `0..=3`. The symbol index and offending character are provided
	/// in the payload.
	InvalidSymbol(usize, char),
	/// The sample rate was not a positive, finite number. The supplied rate is provided in
	/// the payload.
	InvalidSampleRate(f64)
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::NoFrequencies =>
				write!(f, "At least one center frequency is required"),
			ConfigError::TooManyFrequencies(n) =>
				write!(f, "At most {} center frequencies are supported ({} given)", MAX_BANDS, n),
			ConfigError::SymbolCount(n) =>
				write!(f, "Expected {} symbols ({} given)", SYMBOL_COUNT, n),
			ConfigError::InvalidSymbol(i, c) =>
				write!(f, "Invalid symbol {:?} at position {}", c, i),
			ConfigError::InvalidSampleRate(r) =>
				write!(f, "Invalid sample rate: {}", r)
		}
	}
}

impl fmt::Debug for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(self, f)
	}
}

impl error::Error for ConfigError {}

/// A validated WSPR symbol sequence: exactly [`SYMBOL_COUNT`] values in `0..=3`.
///
/// Fixed for the lifetime of a [`Transmitter`]. Usually parsed from the 162-character
/// digit string produced by a WSPR encoder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Symbols([u8; SYMBOL_COUNT]);

impl Symbols {
	/// Create a symbol sequence from raw values.
	///
	/// # Errors
	///
	/// Returns [`ConfigError::InvalidSymbol`] if any value is greater than 3.
	pub fn new(values: [u8; SYMBOL_COUNT]) -> Result<Symbols, ConfigError> {
		for (i, &v) in values.iter().enumerate() {
			if v > 3 {
				return Err(ConfigError::InvalidSymbol(i, (b'0' + v.min(9)) as char));
			}
		}
		Ok(Symbols(values))
	}

	/// The numeric value (0–3) of the symbol at `index`.
	///
	/// `index` must be less than [`SYMBOL_COUNT`].
	#[inline(always)]
	pub fn value(&self, index: usize) -> u8 {
		self.0[index]
	}
}

impl FromStr for Symbols {
	type Err = ConfigError;

	/// Parse a symbol sequence from a string of exactly 162 digits in `0..=3`.
	///
	/// # Examples
	/// ```
	/// # use wspr::{Symbols, ConfigError};
	/// # use std::str::FromStr;
	/// let s = Symbols::from_str(&("0123".repeat(40) + "10"));
	/// assert!(s.is_ok());
	///
	/// assert_eq!(Symbols::from_str("012"), Err(ConfigError::SymbolCount(3)));
	/// ```
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = s.as_bytes();
		if bytes.len() != SYMBOL_COUNT {
			return Err(ConfigError::SymbolCount(s.chars().count()));
		}

		let mut values = [0; SYMBOL_COUNT];
		for (i, (&b, v)) in bytes.iter().zip(values.iter_mut()).enumerate() {
			match b {
				b'0'..=b'3' => *v = b - b'0',
				_ => return Err(ConfigError::InvalidSymbol(i, s[i..].chars().next().unwrap_or('?')))
			}
		}
		Ok(Symbols(values))
	}
}
