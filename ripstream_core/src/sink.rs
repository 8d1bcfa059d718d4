/*!
# Ripstream: Output Sink
*/

use crate::{
	PCM_EXTENSION,
	RipStreamError,
};
use std::{
	fs::File,
	io::Write,
	path::{
		Path,
		PathBuf,
	},
	process::{
		Child,
		ChildStdin,
		Command,
		Stdio,
	},
};



/// # Fixed Encoder Arguments.
///
/// The invocation shape never varies; only the trailing destination path
/// does. `-r` tells the encoder to expect raw PCM on its standard input.
const ENCODER_ARGS: [&str; 5] = ["--silent", "-V0", "-h", "-r", "-"];



#[derive(Debug)]
/// # Output Sink.
///
/// The scoped output resource for exactly one track: a blocking pipe into
/// the external encoder process and, optionally, a sibling raw-capture file
/// that mirrors every byte. Opened per track, closed per track.
pub struct OutputSink {
	dst: PathBuf,
	child: Option<Child>,
	pipe: Option<ChildStdin>,
	capture: Option<(PathBuf, File)>,
	written: u64,
}

impl Drop for OutputSink {
	#[inline]
	/// # Best-Effort Close.
	///
	/// Makes sure the encoder process and capture file get released on every
	/// exit path. Errors here have nowhere to go.
	fn drop(&mut self) { let _res = self.close(); }
}

impl OutputSink {
	/// # Open.
	///
	/// Create the destination directory as needed (quietly succeeding if it
	/// already exists), spawn the encoder with its standard input piped, and,
	/// when `capture` is set, open the sibling `.pcm` mirror.
	///
	/// ## Errors
	///
	/// This will return an error if the directory cannot be created, the
	/// encoder cannot be spawned, or the capture file cannot be opened.
	pub fn open(encoder: &Path, dst: &Path, capture: bool)
	-> Result<Self, RipStreamError> {
		if let Some(dir) = dst.parent() {
			std::fs::create_dir_all(dir)
				.map_err(|_| RipStreamError::Directory(dir.to_string_lossy().into_owned()))?;
		}

		let mut child = Command::new(encoder)
			.args(ENCODER_ARGS)
			.arg(dst)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.map_err(|_| RipStreamError::EncoderSpawn(encoder.to_string_lossy().into_owned()))?;

		// The pipe is always there when spawn succeeds with stdin piped, but
		// the types don't know that.
		let pipe = child.stdin.take()
			.ok_or_else(|| RipStreamError::EncoderSpawn(encoder.to_string_lossy().into_owned()))?;

		let capture =
			if capture {
				let path = dst.with_extension(PCM_EXTENSION);
				match File::create(&path) {
					Ok(file) => Some((path, file)),
					// The encoder is already up; don't leave it hanging.
					Err(_) => {
						drop(pipe);
						let _res = child.wait();
						return Err(RipStreamError::SinkWrite(path.to_string_lossy().into_owned()));
					},
				}
			}
			else { None };

		Ok(Self {
			dst: dst.to_path_buf(),
			child: Some(child),
			pipe: Some(pipe),
			capture,
			written: 0,
		})
	}

	/// # Write.
	///
	/// Forward the bytes verbatim to the encoder pipe and, when capture is
	/// active, the mirror file. Fan-out, not a choice: both get every write.
	///
	/// ## Errors
	///
	/// This will return an error if either stream rejects the write (e.g. a
	/// broken pipe). No partial-write bookkeeping; a failed sink is terminal
	/// for its track.
	pub fn write(&mut self, bytes: &[u8]) -> Result<(), RipStreamError> {
		let pipe = self.pipe.as_mut()
			.ok_or_else(|| RipStreamError::SinkWrite(self.dst.to_string_lossy().into_owned()))?;
		pipe.write_all(bytes)
			.map_err(|_| RipStreamError::SinkWrite(self.dst.to_string_lossy().into_owned()))?;

		if let Some((path, file)) = self.capture.as_mut() {
			file.write_all(bytes)
				.map_err(|_| RipStreamError::SinkWrite(path.to_string_lossy().into_owned()))?;
		}

		self.written += bytes.len() as u64;
		Ok(())
	}

	/// # Close.
	///
	/// Flush and release the encoder's input stream, wait the encoder out,
	/// and close the capture file if there is one. Idempotent; a second call
	/// finds nothing left to do.
	///
	/// Each resource gets its own close attempt regardless of how the others
	/// fare; the first error is the one reported.
	///
	/// ## Errors
	///
	/// This will return an error if the capture file cannot be flushed, or
	/// the encoder exits unhappily.
	pub fn close(&mut self) -> Result<(), RipStreamError> {
		let mut first = None;

		// Dropping the pipe sends EOF so the encoder can finish up.
		if let Some(pipe) = self.pipe.take() { drop(pipe); }

		if let Some((path, mut file)) = self.capture.take() {
			if file.flush().is_err() {
				first.replace(RipStreamError::SinkWrite(path.to_string_lossy().into_owned()));
			}
		}

		if let Some(mut child) = self.child.take() {
			match child.wait() {
				Ok(status) if status.success() => {},
				_ => if first.is_none() {
					first.replace(RipStreamError::Encoder(self.dst.to_string_lossy().into_owned()));
				},
			}
		}

		match first {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	#[must_use]
	/// # Destination Path.
	pub fn dst(&self) -> &Path { &self.dst }

	#[must_use]
	/// # Bytes Written.
	pub const fn written(&self) -> u64 { self.written }
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::mock;

	#[test]
	fn t_fan_out() {
		let tmp = tempfile::tempdir().expect("Tempdir failed.");
		let encoder = mock::fake_encoder(tmp.path());
		let dst = tmp.path().join("Band/Album/Song.mp3");

		let mut sink = OutputSink::open(&encoder, &dst, true)
			.expect("Sink open failed.");
		sink.write(b"abc").expect("Write failed.");
		sink.write(b"def").expect("Write failed.");
		assert_eq!(sink.written(), 6);
		sink.close().expect("Close failed.");

		// The fake encoder dumps its stdin to the destination path, so both
		// outputs should hold the same six bytes, in order.
		assert_eq!(
			std::fs::read(&dst).expect("Missing encoder output."),
			b"abcdef",
		);
		assert_eq!(
			std::fs::read(dst.with_extension(PCM_EXTENSION)).expect("Missing capture."),
			b"abcdef",
		);
	}

	#[test]
	fn t_close_idempotent() {
		let tmp = tempfile::tempdir().expect("Tempdir failed.");
		let encoder = mock::fake_encoder(tmp.path());
		let dst = tmp.path().join("Song.mp3");

		let mut sink = OutputSink::open(&encoder, &dst, false)
			.expect("Sink open failed.");
		sink.write(b"xyz").expect("Write failed.");
		sink.close().expect("Close failed.");
		sink.close().expect("A second close should be a quiet no-op.");

		// And writes after close should fail without touching anything.
		assert!(sink.write(b"nope").is_err());
		assert_eq!(
			std::fs::read(&dst).expect("Missing encoder output."),
			b"xyz",
		);
	}

	#[test]
	fn t_spawn_failure() {
		let tmp = tempfile::tempdir().expect("Tempdir failed.");
		let dst = tmp.path().join("Song.mp3");
		assert!(matches!(
			OutputSink::open(Path::new("/nonexistent/encoder"), &dst, false),
			Err(RipStreamError::EncoderSpawn(_)),
		));
	}
}
