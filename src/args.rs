//! Support for command line argument parsing.
//!
//! See [crate] documentation for details on command line arguments and examples.

use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Debug, Display};
use std::num::NonZero;
use std::str::FromStr;

use wspr::{ConfigError, Symbols};

/// The error type for parsing command line arguments.
#[cfg_attr(test, derive(PartialEq))]
pub enum ArgumentsError {
	/// The option was unrecognized. The option is returned as the payload of this variant.
	UnrecognizedOption(String),
	/// Error converting an option or parameter to UTF-8. The argument index and original
	/// [`OsString`] that could not be converted are returned as the payload of this variant.
	InvalidUTF8(usize, OsString),
	/// The parameter for an option was not supplied. The option is returned as the payload
	/// for this variant.
	MissingParameter(String),
	/// A numeric parameter could not be parsed. The option and the supplied parameter are
	/// returned as the payload of this variant.
	InvalidNumber(String, String),
	/// The provided transmission count was invalid. The supplied count argument is returned
	/// as the payload of this variant.
	InvalidCount(String),
	/// The required symbol sequence (`-s`) was missing.
	MissingSymbols,
	/// The symbol sequence could not be parsed. The underlying configuration error is
	/// returned as the payload for this variant.
	SymbolsError(ConfigError),
	/// A positional argument was supplied; this program takes options only. The argument is
	/// returned as the payload of this variant.
	UnexpectedArgument(String),
	/// Help option (-h) was included, so print help details and exit.
	Help
}

impl Display for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ArgumentsError::UnrecognizedOption(s) => write!(f, "Unrecognized option: {}", s),
			ArgumentsError::InvalidUTF8(i, v) => write!(f, "Invalid UTF-8 in argument {}: {:?}", i, v),
			ArgumentsError::MissingParameter(s) => write!(f, "Missing parameter for option {}", s),
			ArgumentsError::InvalidNumber(o, v) => write!(f, "Invalid number for option {}: {}", o, v),
			ArgumentsError::InvalidCount(s) => write!(f, "Invalid count: {}", s),
			ArgumentsError::MissingSymbols => write!(f, "Missing symbol sequence (-s)"),
			ArgumentsError::SymbolsError(e) => write!(f, "Symbol error: {}", e),
			ArgumentsError::UnexpectedArgument(s) => write!(f, "Unexpected argument: {}", s),
			ArgumentsError::Help => write!(f, "Help requested")
		}
	}
}

impl Debug for ArgumentsError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		Display::fmt(self, f)
	}
}

impl Error for ArgumentsError {}

/// Convert an argument to [`&str`].
///
/// The function takes the argument index `i`, optional option name `a`, and the argument
/// `s`.
///
/// # Errors
///
/// Returns [`ArgumentsError::InvalidUTF8`] if the argument could not be converted to UTF-8
/// or [`ArgumentsError::MissingParameter`] if the argument is `None`.
fn arg_to_str<'b>(i: usize, a: Option<&str>, s: Option<&'b OsString>)
	-> Result<&'b str, ArgumentsError>
{
	match s {
		Some(v) => v.to_str().ok_or_else(|| ArgumentsError::InvalidUTF8(i, v.clone())),
		None => Err(ArgumentsError::MissingParameter(a.map(String::from).unwrap_or_default()))
	}
}

/// Parse the numeric parameter of option `name`.
fn parse_number(name: &str, value: &str) -> Result<f64, ArgumentsError> {
	value.parse()
		.map_err(|_| ArgumentsError::InvalidNumber(name.to_string(), value.to_string()))
}

/// Parsed command line arguments.
pub struct Arguments {
	/// The sample rate to request from the output device, in Hz.
	pub rate: f64,
	/// Frequency error of the output device in parts per million.
	pub ppm: f64,
	/// The WSPR center frequencies in Hz, in band rotation order.
	pub frequencies: Vec<f64>,
	/// The 162-symbol frame to transmit.
	pub symbols: Symbols,
	/// Phase shift for output channel 1, in degrees.
	pub phase_shift_1: f64,
	/// Phase shift for output channel 2, in degrees.
	pub phase_shift_2: f64,
	/// Whether to swap the two phase shifts before each transmission.
	pub swap: bool,
	/// The number of transmissions to send before exiting.
	pub count: NonZero<usize>
}

impl Arguments {
	/// Parse command line arguments.
	///
	/// The input can be any type that implements [`Iterator`] that yields [`OsString`],
	/// though typically this would be [`std::env::args_os`]. This function assumes that the
	/// application name is **not** supplied as the first item yielded by `args`.
	///
	/// Frequency list length is not validated here; the transmitter rejects empty or
	/// oversized lists when it is constructed.
	///
	/// # Errors
	///
	/// This function can return any of the variants in [`ArgumentsError`]. See that
	/// documentation for more details.
	///
	/// # Examples
	///
	/// ```ignore
	/// let args = match Arguments::parse(std::env::args_os().skip(1)) {
	/// 	Ok(a) => a,
	/// 	Err(e) => {
	/// 		// Handle error
	/// 		panic!("{}", e);
	/// 	}
	/// };
	/// ```
	pub fn parse(mut args: impl Iterator<Item = OsString>) -> Result<Arguments, ArgumentsError>
	{
		let mut rate: f64 = 48000.0;
		let mut ppm: f64 = 0.0;
		let mut frequencies: Vec<f64> = Vec::new();
		let mut symbols: Result<Symbols, ArgumentsError> = Err(ArgumentsError::MissingSymbols);
		let mut phase_shift_1: f64 = 0.0;
		let mut phase_shift_2: f64 = 0.0;
		let mut swap = false;
		let mut count: Option<NonZero<usize>> = None;
		let mut arg = args.next();
		let mut i = 0;
		loop {
			if arg.is_none() { break; }
			match arg_to_str(i, None, arg.as_ref())? {
				n @ ("-r" | "--rate") => {
					rate = parse_number(n, arg_to_str(i+1, Some(n), args.next().as_ref())?)?;
					// Increment because we called args.next()
					i += 1;
				},
				n @ "--ppm" => {
					ppm = parse_number(n, arg_to_str(i+1, Some(n), args.next().as_ref())?)?;
					i += 1;
				},
				n @ ("-f" | "--freq") => {
					frequencies.push(
						parse_number(n, arg_to_str(i+1, Some(n), args.next().as_ref())?)?
					);
					i += 1;
				},
				n @ ("-s" | "--symbols") => {
					symbols = Symbols::from_str(arg_to_str(i+1, Some(n), args.next().as_ref())?)
						.map_err(ArgumentsError::SymbolsError);
					i += 1;
				},
				n @ "--p1" => {
					phase_shift_1 = parse_number(n, arg_to_str(i+1, Some(n), args.next().as_ref())?)?;
					i += 1;
				},
				n @ "--p2" => {
					phase_shift_2 = parse_number(n, arg_to_str(i+1, Some(n), args.next().as_ref())?)?;
					i += 1;
				},
				"--swap" => swap = true,
				n @ ("-n" | "-c" | "--count") => {
					count = Some(
						arg_to_str(i+1, Some(n), args.next().as_ref())
						.and_then(
							|v| v.parse().map_err(|_| ArgumentsError::InvalidCount(v.to_string()))
						)?
					);
					i += 1;
				},
				"-h" => return Err(ArgumentsError::Help),
				v => {
					if v.starts_with('-') {
						return Err(ArgumentsError::UnrecognizedOption(v.to_string()));
					}
					return Err(ArgumentsError::UnexpectedArgument(v.to_string()));
				}
			}
			arg = args.next();
			// Increment because we called args.next()
			i += 1;
		}

		Ok(Arguments {
			rate,
			ppm,
			frequencies,
			symbols: symbols?,
			phase_shift_1,
			phase_shift_2,
			swap,
			count: count.unwrap_or(NonZero::<usize>::MIN)
		})
	}
}
