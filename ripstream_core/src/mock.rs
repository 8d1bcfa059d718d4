/*!
# Ripstream: Test Doubles

A scripted session backend plus fake encoder/tagger programs, shared by the
unit tests. The mock plays the provider's part faithfully enough to exercise
the real machinery: commands are logged, login outcomes arrive as
asynchronous notifications from a separate thread, and deliveries fire from
their own dispatcher thread once playback starts.
*/

use crate::{
	AudioFormat,
	ConnectionState,
	Container,
	MediaSession,
	RipStreamError,
	SessionCallbacks,
	TrackDescriptor,
};
use std::{
	collections::HashMap,
	path::{
		Path,
		PathBuf,
	},
	sync::{
		Arc,
		atomic::{
			AtomicBool,
			AtomicU32,
			Ordering::SeqCst,
		},
		Mutex,
	},
	time::Duration,
};



/// # Delivery Batch Size (Bytes).
const BATCH_SIZE: usize = 1024;

/// # Delivery Batch Count.
const BATCH_COUNT: u8 = 3;



/// # The Scripted Feed.
///
/// Three distinguishable batches so ordering mix-ups can't hide.
fn feed() -> Vec<Vec<u8>> {
	(1..=BATCH_COUNT).map(|k| vec![k; BATCH_SIZE]).collect()
}

/// # The Feed, Flattened.
///
/// What the encoder/capture outputs should hold after a clean rip.
pub(crate) fn feed_bytes() -> Vec<u8> {
	feed().concat()
}



/// # Shared Mock State.
struct MockInner {
	callbacks: Mutex<Option<Arc<dyn SessionCallbacks>>>,
	tracks: Mutex<HashMap<String, TrackDescriptor>>,
	feeds: Mutex<HashMap<String, Vec<Vec<u8>>>>,
	covers: Mutex<HashMap<String, Vec<u8>>>,
	playlists: Mutex<HashMap<String, Vec<String>>>,
	playlist_delay: AtomicU32,
	current: Mutex<Option<String>>,
	commands: Mutex<Vec<String>>,
	delivered: Mutex<Vec<(usize, usize)>>,
	fail_login: AtomicBool,
	stored: AtomicBool,
	format: AudioFormat,
}

#[derive(Clone)]
/// # Scripted Session.
pub(crate) struct MockSession {
	inner: Arc<MockInner>,
}

impl Default for MockSession {
	/// # Two Tracks and a Playlist.
	///
	/// `mock:track:a` (Song/Band/Album/2001, #1) and `mock:track:b`
	/// (Song Two/Band Two/Album Two/2002, #2), both carrying the standard
	/// three-batch feed, plus `mock:playlist:p` holding them in order.
	fn default() -> Self {
		let a = TrackDescriptor::new("mock:track:a", "Song")
			.with_artist("Band")
			.with_album("Album")
			.with_year(2001)
			.with_index(1)
			.with_duration_ms(3000);
		let b = TrackDescriptor::new("mock:track:b", "Song Two")
			.with_artist("Band Two")
			.with_album("Album Two")
			.with_year(2002)
			.with_index(2)
			.with_duration_ms(3000);

		let mut tracks = HashMap::new();
		let mut feeds = HashMap::new();
		for t in [a, b] {
			feeds.insert(t.uri().to_owned(), feed());
			tracks.insert(t.uri().to_owned(), t);
		}

		let mut playlists = HashMap::new();
		playlists.insert(
			"mock:playlist:p".to_owned(),
			vec!["mock:track:a".to_owned(), "mock:track:b".to_owned()],
		);

		Self {
			inner: Arc::new(MockInner {
				callbacks: Mutex::new(None),
				tracks: Mutex::new(tracks),
				feeds: Mutex::new(feeds),
				covers: Mutex::new(HashMap::new()),
				playlists: Mutex::new(playlists),
				playlist_delay: AtomicU32::new(0),
				current: Mutex::new(None),
				commands: Mutex::new(Vec::new()),
				delivered: Mutex::new(Vec::new()),
				fail_login: AtomicBool::new(false),
				stored: AtomicBool::new(false),
				format: AudioFormat::default(),
			}),
		}
	}
}

impl MockSession {
	/// # Report "Not Loaded" For This Many Playlist Polls.
	pub(crate) fn with_playlist_delay(self, polls: u32) -> Self {
		self.inner.playlist_delay.store(polls, SeqCst);
		self
	}

	/// # Add/Replace a Playlist.
	pub(crate) fn with_playlist(self, uri: &str, ids: &[&str]) -> Self {
		self.inner.playlists.lock().unwrap().insert(
			uri.to_owned(),
			ids.iter().map(|&s| s.to_owned()).collect(),
		);
		self
	}

	/// # Attach Cover Art to a Track.
	pub(crate) fn with_cover(self, uri: &str, raw: Vec<u8>) -> Self {
		self.inner.covers.lock().unwrap().insert(uri.to_owned(), raw);
		self
	}

	/// # Reject All Logins.
	pub(crate) fn with_login_rejection(self) -> Self {
		self.inner.fail_login.store(true, SeqCst);
		self
	}

	/// # Pretend Credentials Were Stored By a Previous Run.
	pub(crate) fn with_stored_credentials(self) -> Self {
		self.inner.stored.store(true, SeqCst);
		self
	}

	/// # Register the Callback Half.
	pub(crate) fn register(&self, cb: Arc<dyn SessionCallbacks>) {
		self.inner.callbacks.lock().unwrap().replace(cb);
	}

	/// # Command Log.
	pub(crate) fn commands(&self) -> Vec<String> {
		self.inner.commands.lock().unwrap().clone()
	}

	/// # Delivery Log (Offered/Accepted Pairs).
	pub(crate) fn delivered(&self) -> Vec<(usize, usize)> {
		self.inner.delivered.lock().unwrap().clone()
	}

	/// # Post a Connection Notification From "The Dispatcher".
	fn notify_later(&self, state: ConnectionState) {
		let cb = self.inner.callbacks.lock().unwrap().clone();
		std::thread::spawn(move || {
			std::thread::sleep(Duration::from_millis(5));
			if let Some(cb) = cb { cb.connection_state_changed(state); }
		});
	}
}

impl MediaSession for MockSession {
	fn login(&self, _username: &str, _password: &str, _remember_me: bool)
	-> Result<(), RipStreamError> {
		self.inner.commands.lock().unwrap().push("login".to_owned());
		let state =
			if self.inner.fail_login.load(SeqCst) { ConnectionState::LoggedOut }
			else { ConnectionState::LoggedIn };
		self.notify_later(state);
		Ok(())
	}

	fn relogin(&self) -> Result<(), RipStreamError> {
		if ! self.inner.stored.load(SeqCst) {
			return Err(RipStreamError::NoStoredCredentials);
		}
		self.inner.commands.lock().unwrap().push("relogin".to_owned());
		let state =
			if self.inner.fail_login.load(SeqCst) { ConnectionState::LoggedOut }
			else { ConnectionState::LoggedIn };
		self.notify_later(state);
		Ok(())
	}

	fn logout(&self) {
		self.inner.commands.lock().unwrap().push("logout".to_owned());
		self.notify_later(ConnectionState::LoggedOut);
	}

	fn resolve(&self, uri: &str) -> Result<Container, RipStreamError> {
		if self.inner.tracks.lock().unwrap().contains_key(uri) {
			Ok(Container::Track(uri.to_owned()))
		}
		else if self.inner.playlists.lock().unwrap().contains_key(uri) {
			Ok(Container::Playlist(uri.to_owned()))
		}
		else { Err(RipStreamError::Resolution(uri.to_owned())) }
	}

	fn track(&self, uri: &str) -> Result<TrackDescriptor, RipStreamError> {
		self.inner.tracks.lock().unwrap()
			.get(uri)
			.cloned()
			.ok_or_else(|| RipStreamError::TrackLoad(uri.to_owned()))
	}

	fn playlist(&self, uri: &str) -> Option<Vec<String>> {
		let delay = self.inner.playlist_delay.load(SeqCst);
		if delay != 0 {
			self.inner.playlist_delay.store(delay - 1, SeqCst);
			return None;
		}
		self.inner.playlists.lock().unwrap().get(uri).cloned()
	}

	fn cover(&self, uri: &str) -> Option<Vec<u8>> {
		self.inner.covers.lock().unwrap().get(uri).cloned()
	}

	fn player_load(&self, uri: &str) -> Result<(), RipStreamError> {
		self.inner.commands.lock().unwrap().push(format!("load {uri}"));
		self.inner.current.lock().unwrap().replace(uri.to_owned());
		Ok(())
	}

	fn player_play(&self, play: bool) {
		self.inner.commands.lock().unwrap().push(format!("play {play}"));
		if ! play { return; }

		let Some(cb) = self.inner.callbacks.lock().unwrap().clone() else { return; };
		let Some(id) = self.inner.current.lock().unwrap().clone() else { return; };
		let batches = self.inner.feeds.lock().unwrap()
			.get(&id)
			.cloned()
			.unwrap_or_default();
		let format = self.inner.format;
		let inner = Arc::clone(&self.inner);

		// The "dispatcher": deliver each batch in turn, then call it a day.
		std::thread::spawn(move || {
			for batch in batches {
				let frames = batch.len() / format.bytes_per_frame();
				let accepted = cb.music_delivery(format, &batch, frames);
				inner.delivered.lock().unwrap().push((frames, accepted));
			}
			cb.end_of_track();
		});
	}
}



/// # Write an Executable Script.
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join(name);
	std::fs::write(&path, body).expect("Unable to write fake script.");
	let mut perms = std::fs::metadata(&path)
		.expect("Unable to stat fake script.")
		.permissions();
	perms.set_mode(0o755);
	std::fs::set_permissions(&path, perms).expect("Unable to chmod fake script.");
	path
}

/// # Fake Encoder.
///
/// Stands in for `lame`: swallows the fixed flags and dumps its standard
/// input to the destination path (the final argument), so tests can verify
/// exactly what the pipe carried.
pub(crate) fn fake_encoder(dir: &Path) -> PathBuf {
	write_script(dir, "fake-lame", "#!/bin/sh
for a in \"$@\"; do dst=\"$a\"; done
exec cat > \"$dst\"
")
}

/// # Fake Encoder, Picky Edition.
///
/// Same as [`fake_encoder`], except it bails straight away when the
/// destination path contains `needle`, simulating a per-track encoder
/// failure.
pub(crate) fn fake_encoder_picky(dir: &Path, needle: &str) -> PathBuf {
	write_script(dir, "fake-lame-picky", &format!("#!/bin/sh
for a in \"$@\"; do dst=\"$a\"; done
case \"$dst\" in
*\"{needle}\"*) exit 1 ;;
esac
exec cat > \"$dst\"
"))
}

/// # Fake Tagger.
///
/// Stands in for `eyeD3`: records its argument vector, one per line, to a
/// log file whose path is returned alongside the script's.
pub(crate) fn fake_tagger(dir: &Path) -> (PathBuf, PathBuf) {
	let log = dir.join("tagger-args.txt");
	let script = write_script(dir, "fake-eyed3", &format!("#!/bin/sh
printf '%s\\n' \"$@\" > \"{}\"
", log.display()));
	(script, log)
}
