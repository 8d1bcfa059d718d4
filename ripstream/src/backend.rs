/*!
# Ripstream: Loopback Backend

The streaming provider's client library is proprietary, so the binary ships
with a loopback session instead: a `MediaSession` over a local directory of
raw PCM captures, laid out `<artist>/<album (year)>/<nn - title>.pcm` with
an optional `cover.jpg` alongside. `local:track:<file>` resolves to a single
track, `local:album:<dir>` (or a bare path) to an ordered playlist.

It honors the same contracts a live adapter would: login outcomes arrive as
asynchronous connection notifications, frames are delivered from a dedicated
dispatcher thread, unconsumed frames are re-offered after a short sleep, and
end-of-track fires when the file runs dry.
*/

use ripstream_core::{
	AudioFormat,
	ConnectionState,
	Container,
	MediaSession,
	PCM_EXTENSION,
	RipStreamError,
	SessionCallbacks,
	TrackDescriptor,
};
use std::{
	fs::File,
	io::Read,
	path::{
		Path,
		PathBuf,
	},
	sync::{
		Arc,
		atomic::{
			AtomicBool,
			Ordering::SeqCst,
		},
		Mutex,
		PoisonError,
	},
	time::Duration,
};



/// # Delivery Chunk Size (Bytes).
///
/// 4096 CD-audio frames per callback, roughly what the real client library
/// hands over at a time.
const CHUNK_SIZE: usize = 4096 * 4;

/// # Re-Offer Delay.
///
/// How long to sit on unconsumed frames before offering them again.
const RETRY: Duration = Duration::from_millis(10);



#[derive(Default)]
/// # Loopback Session.
pub(super) struct LocalSession {
	/// # Registered Callback Half.
	callbacks: Mutex<Option<Arc<dyn SessionCallbacks>>>,

	/// # The Loaded Track, If Any.
	current: Mutex<Option<PathBuf>>,

	/// # Playback Stop Flag.
	stopped: Arc<AtomicBool>,
}

impl LocalSession {
	/// # Register the Callback Half.
	///
	/// Notifications have nowhere to go until this has been called.
	pub(super) fn register(&self, cb: Arc<dyn SessionCallbacks>) {
		self.callbacks.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.replace(cb);
	}

	/// # Registered Callbacks, If Any.
	fn cb(&self) -> Option<Arc<dyn SessionCallbacks>> {
		self.callbacks.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// # Post a Connection Notification From the Dispatcher Thread.
	fn notify_later(&self, state: ConnectionState) {
		if let Some(cb) = self.cb() {
			std::thread::spawn(move || { cb.connection_state_changed(state); });
		}
	}
}

impl MediaSession for LocalSession {
	fn login(&self, _username: &str, _password: &str, _remember_me: bool)
	-> Result<(), RipStreamError> {
		self.notify_later(ConnectionState::LoggedIn);
		Ok(())
	}

	fn relogin(&self) -> Result<(), RipStreamError> {
		// The loopback has nothing to forget, so stored-credential logins
		// always work.
		self.notify_later(ConnectionState::LoggedIn);
		Ok(())
	}

	fn logout(&self) {
		self.notify_later(ConnectionState::LoggedOut);
	}

	fn resolve(&self, uri: &str) -> Result<Container, RipStreamError> {
		let path = uri_path(uri);
		if path.is_file() {
			Ok(Container::Track(format!("local:track:{}", path.display())))
		}
		else if path.is_dir() {
			Ok(Container::Playlist(format!("local:album:{}", path.display())))
		}
		else { Err(RipStreamError::Resolution(uri.to_owned())) }
	}

	fn track(&self, uri: &str) -> Result<TrackDescriptor, RipStreamError> {
		let path = uri_path(uri);
		let len = std::fs::metadata(&path)
			.map_err(|_| RipStreamError::TrackLoad(uri.to_owned()))?
			.len();
		Ok(track_from_path(uri, &path, len))
	}

	fn playlist(&self, uri: &str) -> Option<Vec<String>> {
		let path = uri_path(uri);
		let mut files: Vec<PathBuf> = std::fs::read_dir(path).ok()?
			.filter_map(|e| {
				let path = e.ok()?.path();
				if path.extension().is_some_and(|x| x.eq_ignore_ascii_case(PCM_EXTENSION)) {
					Some(path)
				}
				else { None }
			})
			.collect();

		// Directory order is filesystem order; track order is name order.
		files.sort();
		Some(
			files.into_iter()
				.map(|p| format!("local:track:{}", p.display()))
				.collect()
		)
	}

	fn cover(&self, uri: &str) -> Option<Vec<u8>> {
		let path = uri_path(uri);
		std::fs::read(path.parent()?.join("cover.jpg")).ok()
	}

	fn player_load(&self, uri: &str) -> Result<(), RipStreamError> {
		let path = uri_path(uri);
		if ! path.is_file() {
			return Err(RipStreamError::TrackLoad(uri.to_owned()));
		}
		self.current.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.replace(path);
		Ok(())
	}

	fn player_play(&self, play: bool) {
		if ! play {
			self.stopped.store(true, SeqCst);
			return;
		}

		self.stopped.store(false, SeqCst);
		let Some(cb) = self.cb() else { return; };
		let Some(path) = self.current.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone() else { return; };
		let stopped = Arc::clone(&self.stopped);

		// The dispatcher thread: deliver until the file runs dry or playback
		// is stopped out from under us.
		std::thread::spawn(move || feed(&path, &cb, &stopped));
	}
}



/// # Deliver a Track.
///
/// Read the capture in chunks and push each through the delivery callback,
/// re-offering unconsumed frames after a short sleep the way the real
/// client library does, then fire end-of-track.
fn feed(path: &Path, cb: &Arc<dyn SessionCallbacks>, stopped: &AtomicBool) {
	let format = AudioFormat::default();
	let bpf = format.bytes_per_frame();

	let Ok(mut file) = File::open(path) else {
		// Nothing to deliver; at least let the driver move on.
		cb.end_of_track();
		return;
	};

	let mut buf = vec![0_u8; CHUNK_SIZE];
	loop {
		let read = match file.read(&mut buf) {
			Ok(0) => break,
			Ok(n) => n,
			Err(_) => break,
		};

		let mut offset = 0;
		while offset < read {
			if stopped.load(SeqCst) { return; }
			let frames = (read - offset) / bpf;
			if frames == 0 { break; } // Ignore a ragged tail.

			let accepted = cb.music_delivery(format, &buf[offset..read], frames);
			if accepted == 0 {
				std::thread::sleep(RETRY);
				continue;
			}
			offset += accepted * bpf;
		}
	}

	if ! stopped.load(SeqCst) { cb.end_of_track(); }
}

/// # URI to Path.
///
/// Strip the `local:` scheme prefixes; bare paths pass through as they are.
fn uri_path(uri: &str) -> PathBuf {
	let raw = uri.strip_prefix("local:track:")
		.or_else(|| uri.strip_prefix("local:album:"))
		.unwrap_or(uri);
	PathBuf::from(raw)
}

/// # Descriptor From a Capture Path.
///
/// All the metadata we have lives in the path: `<nn - title>.pcm` under
/// `<album (year)>` under `<artist>`. The duration falls out of the file
/// size, since the capture format is fixed.
fn track_from_path(uri: &str, path: &Path, len: u64) -> TrackDescriptor {
	let stem = path.file_stem()
		.map_or_else(String::new, |s| s.to_string_lossy().into_owned());
	let (index, title) = split_index(&stem);

	let album_dir = path.parent();
	let (album, year) = album_dir
		.and_then(Path::file_name)
		.map_or_else(
			|| (String::new(), None),
			|s| split_year(&s.to_string_lossy()),
		);
	let artist = album_dir
		.and_then(Path::parent)
		.and_then(Path::file_name)
		.map(|s| s.to_string_lossy().into_owned());

	let format = AudioFormat::default();
	let frames = len / format.bytes_per_frame() as u64;
	let duration_ms = frames * 1000 / u64::from(format.sample_rate());

	let mut track = TrackDescriptor::new(uri.to_owned(), title)
		.with_index(index)
		.with_album(album)
		.with_duration_ms(duration_ms);
	if let Some(artist) = artist { track = track.with_artist(artist); }
	if let Some(year) = year { track = track.with_year(year); }
	track
}

/// # Split a Leading Track Number.
///
/// `"01 - Title"` comes back as `(1, "Title")`; anything less obliging keeps
/// the whole stem as the title with an unknown (zero) index.
fn split_index(stem: &str) -> (u32, String) {
	if let Some((head, tail)) = stem.split_once(" - ") {
		if let Ok(index) = head.trim().parse::<u32>() {
			return (index, tail.trim().to_owned());
		}
	}
	(0, stem.trim().to_owned())
}

/// # Split a Trailing Album Year.
///
/// `"Album (2001)"` comes back as `("Album", Some(2001))`.
fn split_year(dir: &str) -> (String, Option<u16>) {
	if let Some(head) = dir.strip_suffix(')') {
		if let Some((album, year)) = head.rsplit_once(" (") {
			if let Ok(year) = year.parse::<u16>() {
				return (album.trim().to_owned(), Some(year));
			}
		}
	}
	(dir.trim().to_owned(), None)
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_split_index() {
		assert_eq!(split_index("01 - Song"), (1, "Song".to_owned()));
		assert_eq!(split_index("7 - A - B"), (7, "A - B".to_owned()));
		assert_eq!(split_index("Song"), (0, "Song".to_owned()));
		assert_eq!(split_index("x - Song"), (0, "x - Song".to_owned()));
	}

	#[test]
	fn t_split_year() {
		assert_eq!(split_year("Album (2001)"), ("Album".to_owned(), Some(2001)));
		assert_eq!(split_year("Album (Live)"), ("Album (Live)".to_owned(), None));
		assert_eq!(split_year("Album"), ("Album".to_owned(), None));
	}

	#[test]
	fn t_track_from_path() {
		let path = Path::new("/music/Band/Album (2001)/02 - Song.pcm");

		// 44,100 frames of CD audio is exactly one second.
		let track = track_from_path("local:track:x", path, 44_100 * 4);
		assert_eq!(track.index(), 2);
		assert_eq!(track.title(), "Song");
		assert_eq!(track.artist(), Some("Band"));
		assert_eq!(track.album(), "Album");
		assert_eq!(track.year(), Some(2001));
		assert_eq!(track.duration_ms(), 1000);
	}
}
