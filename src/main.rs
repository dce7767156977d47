//! Transmit WSPR frames using simple audio output.
//!
//! This crate generates a continuous, phase-coherent [WSPR] waveform by direct digital
//! synthesis and streams it to the device's default audio output on three channels. The
//! audio path is used as a cheap DDS DAC: with a suitable output device the signal (or a
//! harmonic of it) radiates as RF, and the optional per-channel phase shifts allow
//! quadrature or three-phase antenna feeds driven from separate channels.
//!
//! The transmitter idles at mid-scale and sends one 162-symbol frame at the start of each
//! even two-minute window (the WSPR transmit slot), rotating through the configured center
//! frequencies on successive transmissions. Symbol sequences are produced by an external
//! WSPR message encoder; this program does not encode callsigns.
//!
//! [WSPR]: https://en.wikipedia.org/wiki/WSPR_(amateur_radio_software)
//!
//! # Command Line Arguments
//!
//! General form: `flwspr [options...] -s <symbols> -f <hz>`
//!
//! | Short form | Long form     | Argument            | Default | Description                             |
//! | ---------- | ------------- | ------------------- | ------- | --------------------------------------- |
//! | `-s`       | `--symbols`   | 162 digits in `0-3` | None    | The WSPR frame to transmit (required)   |
//! | `-f`       | `--freq`      | Frequency (Hz)      | None    | A center frequency; repeat for multiple |
//! | `-r`       | `--rate`      | Sample rate (Hz)    | 48000   | The sample rate to request              |
//! |            | `--ppm`       | Number              | 0       | Device frequency error correction       |
//! |            | `--p1`        | Degrees             | 0       | Phase shift for output channel 1        |
//! |            | `--p2`        | Degrees             | 0       | Phase shift for output channel 2        |
//! |            | `--swap`      | None                | Off     | Swap phase shifts before each frame     |
//! | `-n`, `-c` | `--count`     | Integer > 0         | 1       | The number of frames to transmit        |
//!
//! # Examples
//!
//! Transmit one frame on a 1.5 kHz audio carrier:
//! ```sh
//! flwspr -f 1500 -s 3132001040...
//! ```
//!
//! Alternate between two bands for four transmissions, with quadrature outputs:
//! ```sh
//! flwspr -n 4 -f 1400 -f 1600 --p1 90 --p2 270 --swap -s 3132001040...
//! ```

use std::error::Error;
use std::process::ExitCode;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use args::{Arguments, ArgumentsError};
use wspr::{ChannelBuffers, Config, Transmitter};

mod args;

/// Frames per fill call; hardware buffers are chunked through planar scratch this large.
const CHUNK: usize = 1024;

/// Countdown latch tracking remaining transmissions.
///
/// The audio callback calls [`Countdown::count_down`] once per completed frame; the main
/// thread blocks in [`Countdown::wait`] until the configured number of frames has been
/// sent.
struct Countdown {
	/// Mutex containing the number of transmissions still outstanding.
	mutex: Mutex<usize>,
	/// Condition variable to manage wait/notify.
	cond: Condvar
}

impl Countdown {
	/// Create a latch that releases waiters after `count` calls to
	/// [`count_down`](Countdown::count_down).
	fn new(count: usize) -> Arc<Countdown> {
		Arc::new(Countdown {
			mutex: Mutex::new(count),
			cond: Condvar::new()
		})
	}

	/// Block the current thread until the count reaches zero.
	fn wait(&self) {
		drop(self.cond.wait_while(self.mutex.lock().unwrap(), |left| *left > 0).unwrap());
	}

	/// Record one completed transmission, waking waiters if it was the last.
	fn count_down(&self) {
		let mut left = self.mutex.lock().unwrap();
		if *left > 0 {
			*left -= 1;
			if *left == 0 {
				self.cond.notify_all();
			}
		}
	}
}

/// Make the output-stream callback that runs the transmitter.
///
/// The returned closure owns all synthesis state. On every invocation it reads the wall
/// clock once, then runs the transmitter over the hardware buffer in [`CHUNK`]-frame
/// pieces, interleaving the three planar channel streams into the device's frame layout.
/// Transmission starts and completions are logged here, and completions are counted
/// against `countdown`.
fn make_writer(mut tx: Transmitter, countdown: Arc<Countdown>)
-> impl FnMut(&mut [u8], &cpal::OutputCallbackInfo) + Send + 'static
{
	let mut ch0 = [0u8; CHUNK];
	let mut ch1 = [0u8; CHUNK];
	let mut ch2 = [0u8; CHUNK];

	move |data: &mut [u8], _info: &cpal::OutputCallbackInfo| {
		// One clock read per buffer request; it only gates transmission start
		let time = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs() as i64)
			.unwrap_or(0);

		for frames in data.chunks_mut(3 * CHUNK) {
			let n = frames.len() / 3;
			let report = tx.fill(time, ChannelBuffers {
				ch0: &mut ch0[..n],
				ch1: &mut ch1[..n],
				ch2: &mut ch2[..n]
			});

			if let Some(band) = report.started {
				eprintln!("Starting WSPR transmission on band {}", band);
			}
			if report.finished {
				eprintln!("Stopping WSPR transmission");
				countdown.count_down();
			}

			for (i, frame) in frames.chunks_exact_mut(3).enumerate() {
				frame[0] = ch0[i];
				frame[1] = ch1[i];
				frame[2] = ch2[i];
			}
		}
	}
}

/// Error handler for audio streaming.
///
/// Panics and prints the error.
fn audio_error(error: cpal::StreamError) {
	panic!("Error occured on the stream: {}", error);
}

/// Synthesize the WSPR signal and play it over the default audio output device.
///
/// Configures a three-channel `u8` output stream at the requested rate with a 1024 frame
/// buffer, then blocks until `args.count` transmissions have completed. The ppm correction
/// is applied to the rate in effect on the stream before deriving any phase increments, so
/// the synthesized tones land on frequency even when the device clock is off.
///
/// # Errors
///
/// This function can generate a variety of errors, all wrapped in `Box<dyn Error>`:
/// - [`wspr::ConfigError`] for invalid transmitter configuration.
/// - [`cpal::BuildStreamError`], [`cpal::PlayStreamError`] from configuring and playing
///   audio.
/// - `&str` if there is no default output audio device.
fn play(args: Arguments) -> Result<ExitCode, Box<dyn Error>> {
	let host = cpal::default_host();
	let device = host.default_output_device().ok_or("Failed to get default audio output device")?;
	let config = cpal::StreamConfig {
		channels: 3,
		sample_rate: cpal::SampleRate(args.rate as u32),
		buffer_size: cpal::BufferSize::Fixed(CHUNK as u32),
	};

	// The device quantizes to an achievable rate; synthesize against that rate with the
	// configured ppm correction applied
	let rate = (1.0 + 1e-6 * args.ppm) * config.sample_rate.0 as f64;
	eprintln!("Sample rate: {}, corrected: {:.1}", config.sample_rate.0, rate);

	let tx = Transmitter::new(&Config {
		sample_rate: rate,
		frequencies: args.frequencies,
		symbols: args.symbols,
		phase_shift_1: args.phase_shift_1,
		phase_shift_2: args.phase_shift_2,
		swap_shifts: args.swap
	})?;

	let countdown = Countdown::new(args.count.get());
	let stream = device.build_output_stream(
					&config,
					make_writer(tx, countdown.clone()),
					audio_error,
					None)?;
	stream.play()?;

	eprintln!("Started transmitting");
	countdown.wait();
	eprintln!("Stopping transmitting");

	Ok(ExitCode::SUCCESS)
}

/// Main program entry point.
///
/// Parses input arguments and plays the WSPR signal. See [`crate`] documentation for
/// details.
fn main() -> ExitCode {
	let args = match Arguments::parse(std::env::args_os().skip(1)) {
		Ok(a) => a,
		Err(e) => {
			return if let ArgumentsError::Help = e {
				println!("\
Transmit WSPR frames by direct digital synthesis over audio output.

Usage: flwspr [OPTIONS] -s <SYMBOLS> -f <HZ>

Options:
  -s, --symbols <SYMBOLS>  the 162-symbol WSPR frame to transmit (digits 0-3)
  -f, --freq <HZ>          a center frequency in Hz; repeat to cycle between bands
  -r, --rate <HZ>          the sample rate to request, default 48000
  --ppm <PPM>              device frequency error in parts per million, default 0
  --p1 <DEGREES>           phase shift for output channel 1, default 0
  --p2 <DEGREES>           phase shift for output channel 2, default 0
  --swap                   swap the two phase shifts before each transmission
  -n, -c, --count <COUNT>  the number of transmissions to send, default 1

Examples:
  flwspr -f 1500 -s 3132001040...
  flwspr -n 4 -f 1400 -f 1600 --p1 90 --p2 270 --swap -s 3132001040...\n");
				ExitCode::SUCCESS
			} else {
				eprintln!("{}", e);
				ExitCode::FAILURE
			}
		}
	};

	play(args)
		.inspect_err(|e| eprintln!("{}", e))
		.unwrap_or(ExitCode::FAILURE)
}
