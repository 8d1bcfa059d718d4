/*!
# Ripstream: Ripping
*/

use crate::{
	AudioFormat,
	AuthGate,
	ConnectionState,
	ENCODER_PROGRAM,
	KillSwitch,
	MediaSession,
	OutputSink,
	RipStreamError,
	SessionCallbacks,
	tag_track,
	track_path,
	TrackSequencer,
	TAGGER_PROGRAM,
};
use dactyl::NiceU64;
use fyi_msg::{
	Msg,
	Progless,
};
use std::{
	fmt,
	path::{
		Path,
		PathBuf,
	},
	sync::{
		Arc,
		Condvar,
		Mutex,
		PoisonError,
	},
	time::Duration,
};



/// # Default Playlist-Load Timeout.
const DEFAULT_PLAYLIST_TIMEOUT: Duration = Duration::from_secs(60);

/// # End-of-Track Wait Slice.
///
/// The driving thread parks on the end-of-track signal, but wakes at this
/// interval to check whether the user has pulled the plug.
const EOT_POLL: Duration = Duration::from_millis(100);



#[derive(Debug, Clone)]
/// # Rip Options.
///
/// This struct holds the run-related options like the output root, raw
/// capture, and the external program paths.
///
/// Options are set using builder-style methods, like:
///
/// ```
/// use ripstream_core::RipOptions;
///
/// let opts = RipOptions::default()
///     .with_capture(true)
///     .with_root("/tmp/music");
///
/// assert!(opts.capture());
/// assert_eq!(opts.root().to_str(), Some("/tmp/music"));
/// ```
pub struct RipOptions {
	root: PathBuf,
	encoder: PathBuf,
	tagger: PathBuf,
	playlist_timeout: Duration,
	capture: bool,
}

impl Default for RipOptions {
	fn default() -> Self {
		Self {
			root: PathBuf::from("."),
			encoder: PathBuf::from(ENCODER_PROGRAM),
			tagger: PathBuf::from(TAGGER_PROGRAM),
			playlist_timeout: DEFAULT_PLAYLIST_TIMEOUT,
			capture: false,
		}
	}
}

impl RipOptions {
	#[must_use]
	/// # With Output Root.
	///
	/// The `<artist>/<album>/<title>.mp3` tree is grown under this directory.
	///
	/// The default is the current working directory.
	pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
		self.root = root.into();
		self
	}

	#[must_use]
	/// # With Encoder Program.
	///
	/// Only the program path is configurable; the invocation shape is fixed.
	///
	/// The default is `lame`, resolved through `PATH`.
	pub fn with_encoder<P: Into<PathBuf>>(mut self, encoder: P) -> Self {
		self.encoder = encoder.into();
		self
	}

	#[must_use]
	/// # With Tagger Program.
	///
	/// The default is `eyeD3`, resolved through `PATH`.
	pub fn with_tagger<P: Into<PathBuf>>(mut self, tagger: P) -> Self {
		self.tagger = tagger.into();
		self
	}

	#[must_use]
	/// # With Playlist-Load Timeout.
	///
	/// How long to wait for a playlist to finish loading before giving up.
	/// Pass `Duration::MAX` if you really do want to wait forever.
	///
	/// The default is one minute.
	pub fn with_playlist_timeout(mut self, timeout: Duration) -> Self {
		self.playlist_timeout = timeout;
		self
	}

	#[must_use]
	/// # With Raw Capture.
	///
	/// When `true`, every track also gets a sibling `.pcm` file mirroring
	/// the raw frames fed to the encoder.
	///
	/// The default is `false`.
	pub fn with_capture(mut self, capture: bool) -> Self {
		self.capture = capture;
		self
	}
}

impl RipOptions {
	#[must_use]
	/// # Output Root.
	pub fn root(&self) -> &Path { &self.root }

	#[must_use]
	/// # Encoder Program.
	pub fn encoder(&self) -> &Path { &self.encoder }

	#[must_use]
	/// # Tagger Program.
	pub fn tagger(&self) -> &Path { &self.tagger }

	#[must_use]
	/// # Playlist-Load Timeout.
	pub const fn playlist_timeout(&self) -> Duration { self.playlist_timeout }

	#[must_use]
	/// # Raw Capture?
	pub const fn capture(&self) -> bool { self.capture }
}



#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
/// # Rip Phase.
///
/// The per-track lifecycle. Deliveries only count for anything during
/// `Ripping`; everything else discards them.
pub enum Phase {
	#[default]
	/// # Between Tracks.
	Idle,

	/// # Sink Going Up.
	Preparing,

	/// # Accepting Deliveries.
	Ripping,

	/// # Sink Coming Down.
	Finishing,
}



/// # Live Rip State.
///
/// The per-track state shared between the driving thread and the delivery
/// callbacks: one instance, owned by one mutex, reset between tracks. The
/// counters feed the progress bar; `failed` remembers the first terminal
/// sink error so later deliveries can be discarded cheaply.
struct RipLive {
	phase: Phase,
	sink: Option<OutputSink>,
	frames: u64,
	ticked: u32,
	total: u32,
	failed: Option<RipStreamError>,
	progress: Option<Progless>,
}

impl RipLive {
	/// # Fresh (Idle) State.
	const fn new() -> Self {
		Self {
			phase: Phase::Idle,
			sink: None,
			frames: 0,
			ticked: 0,
			total: 0,
			failed: None,
			progress: None,
		}
	}
}



/// # Shared Rip State.
///
/// The hand-off point between the dispatcher and driving threads: the live
/// per-track state behind its mutex, and the end-of-track signal.
struct RipShared {
	live: Mutex<RipLive>,
	eot: Mutex<bool>,
	eot_cvar: Condvar,
}

impl RipShared {
	/// # New.
	const fn new() -> Self {
		Self {
			live: Mutex::new(RipLive::new()),
			eot: Mutex::new(false),
			eot_cvar: Condvar::new(),
		}
	}

	/// # Lock the Live State.
	fn live(&self) -> std::sync::MutexGuard<RipLive> {
		self.live.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// # Raise the End-of-Track Signal.
	fn signal_eot(&self) {
		let mut done = self.eot.lock().unwrap_or_else(PoisonError::into_inner);
		*done = true;
		self.eot_cvar.notify_all();
	}

	/// # Lower the End-of-Track Signal.
	fn clear_eot(&self) {
		*self.eot.lock().unwrap_or_else(PoisonError::into_inner) = false;
	}

	/// # Wait For End-of-Track.
	///
	/// Park until the signal is raised, consuming it, or until the kill
	/// switch flips. Returns `true` if the track actually finished.
	fn wait_eot(&self, killed: &KillSwitch) -> bool {
		let mut done = self.eot.lock().unwrap_or_else(PoisonError::into_inner);
		loop {
			if *done {
				*done = false;
				return true;
			}
			if killed.killed() { return false; }
			let (guard, _timeout) = self.eot_cvar.wait_timeout(done, EOT_POLL)
				.unwrap_or_else(PoisonError::into_inner);
			done = guard;
		}
	}
}



#[derive(Clone)]
/// # Rip Callbacks.
///
/// The inbound half of the rip machinery: the [`SessionCallbacks`]
/// implementation to register with the session backend. Every method is safe
/// to invoke from the backend's dispatcher thread at any time; anything
/// arriving outside an active rip is simply discarded.
pub struct RipCallbacks {
	auth: Arc<AuthGate>,
	shared: Arc<RipShared>,
}

impl fmt::Debug for RipCallbacks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("RipCallbacks")
	}
}

impl SessionCallbacks for RipCallbacks {
	#[inline]
	fn connection_state_changed(&self, state: ConnectionState) {
		self.auth.notify(state);
	}

	/// # Music Delivery.
	///
	/// During `Ripping`, forward the frames to the sink verbatim and accept
	/// them all; there is no buffering or partial consumption. Outside
	/// `Ripping`, or after the sink has already broken, report zero consumed
	/// so the backend knows to hold its horses.
	fn music_delivery(&self, format: AudioFormat, frame_bytes: &[u8], frame_count: usize)
	-> usize {
		let mut live = self.shared.live();
		if live.phase != Phase::Ripping || live.failed.is_some() { return 0; }
		let Some(sink) = live.sink.as_mut() else { return 0; };

		if let Err(e) = sink.write(frame_bytes) {
			// A broken pipe is terminal for this track; remember the error
			// for the driving thread and stop accepting.
			live.failed.replace(e);
			return 0;
		}

		// Tick the progress bar over each whole-second boundary.
		live.frames += frame_count as u64;
		let rate = u64::from(format.sample_rate().max(1));
		let goal = u32::try_from(live.frames / rate)
			.unwrap_or(u32::MAX)
			.min(live.total);
		while live.ticked < goal {
			live.ticked += 1;
			if let Some(p) = live.progress.as_ref() { p.increment(); }
		}

		frame_count
	}

	#[inline]
	fn end_of_track(&self) { self.shared.signal_eot(); }
}



#[derive(Debug, Clone, Default)]
/// # Rip Summary.
///
/// What a run actually accomplished: the tracks that made it to disk, and
/// the ones that had to be skipped, with their reasons.
pub struct RipSummary {
	ripped: Vec<(String, PathBuf)>,
	skipped: Vec<(String, RipStreamError)>,
}

impl RipSummary {
	#[must_use]
	/// # Ripped Tracks.
	///
	/// Title/destination pairs, in rip order.
	pub fn ripped(&self) -> &[(String, PathBuf)] { &self.ripped }

	#[must_use]
	/// # Skipped Tracks.
	///
	/// URI/error pairs for the tracks that didn't make it.
	pub fn skipped(&self) -> &[(String, RipStreamError)] { &self.skipped }
}



/// # Rip Manager.
///
/// This drives the whole job: resolve the URI into a track sequence, then
/// walk it one track at a time through the Idle → Preparing → Ripping →
/// Finishing cycle, tagging as it goes.
///
/// Exactly one track is ever live; the sink swap for track N completes
/// before the play command for track N+1 goes out, so frames can never land
/// in the wrong file.
pub struct Ripper<'a, S> {
	session: &'a S,
	opts: RipOptions,
	auth: Arc<AuthGate>,
	shared: Arc<RipShared>,
}

impl<'a, S> fmt::Debug for Ripper<'a, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Ripper")
	}
}

impl<'a, S: MediaSession> Ripper<'a, S> {
	#[must_use]
	/// # New.
	///
	/// Set up a ripper against a session backend. Nothing happens until the
	/// caller registers [`Ripper::callbacks`] with that backend, logs in,
	/// and calls [`Ripper::rip`].
	pub fn new(session: &'a S, opts: RipOptions) -> Self {
		Self {
			session,
			opts,
			auth: Arc::new(AuthGate::default()),
			shared: Arc::new(RipShared::new()),
		}
	}

	#[must_use]
	/// # Callback Half.
	///
	/// The [`SessionCallbacks`] implementation to register with the backend.
	/// Clones share state with this ripper.
	pub fn callbacks(&self) -> RipCallbacks {
		RipCallbacks {
			auth: Arc::clone(&self.auth),
			shared: Arc::clone(&self.shared),
		}
	}

	/// # Log In.
	///
	/// ## Errors
	///
	/// This will return an error if the login command cannot be issued or
	/// the provider rejects the credentials.
	pub fn login(&self, username: &str, password: &str) -> Result<(), RipStreamError> {
		self.auth.login(self.session, username, password)
	}

	/// # Log In With Stored Credentials.
	///
	/// ## Errors
	///
	/// This will return an error if no credentials were stored or the
	/// provider rejects them.
	pub fn login_stored(&self) -> Result<(), RipStreamError> {
		self.auth.relogin(self.session)
	}

	/// # Log Out.
	///
	/// Idempotent; a no-op if nobody's logged in.
	pub fn logout(&self) { self.auth.logout(self.session); }

	#[must_use]
	/// # Logged In?
	pub fn logged_in(&self) -> bool { self.auth.is_logged_in() }
}

impl<'a, S: MediaSession> Ripper<'a, S> {
	/// # Rip!
	///
	/// Resolve `uri` and rip every track it names, in order. Per-track
	/// failures are reported and skipped so one bad apple doesn't cost the
	/// rest of the batch; fatal ones abort the run.
	///
	/// The session is logged out on the way out, success or failure, so a
	/// dead run never leaves a connection dangling.
	///
	/// ## Errors
	///
	/// This will return an error if resolution fails, a playlist never
	/// loads, or the user aborts.
	pub fn rip(&self, uri: &str, progress: &Progless, killed: &KillSwitch)
	-> Result<RipSummary, RipStreamError> {
		let seq = match TrackSequencer::resolve(self.session, uri, self.opts.playlist_timeout()) {
			Ok(seq) => seq,
			Err(e) => {
				self.auth.logout(self.session);
				return Err(e);
			},
		};

		let mut summary = RipSummary::default();
		for (k, id) in seq.enumerate() {
			if killed.killed() {
				self.auth.logout(self.session);
				return Err(RipStreamError::Killed);
			}

			match self.rip_one(&id, k + 1, progress, killed) {
				Ok((title, dst)) => { summary.ripped.push((title, dst)); },
				Err(e) if e.is_fatal() => {
					self.auth.logout(self.session);
					return Err(e);
				},
				Err(e) => {
					Msg::warning(format!("Skipping {id}: {e}")).eprint();
					summary.skipped.push((id, e));
				},
			}
		}

		// Done! Log out and let the backend spin itself down.
		self.auth.logout(self.session);
		Ok(summary)
	}

	/// # Rip One Track.
	///
	/// A thin wrapper around the real per-track work that makes sure nothing
	/// leaks into the next track, however this one ended: the phase goes
	/// back to `Idle`, the progress handle is dropped, and any straggling
	/// sink gets a close.
	fn rip_one(&self, id: &str, ordinal: usize, progress: &Progless, killed: &KillSwitch)
	-> Result<(String, PathBuf), RipStreamError> {
		let res = self.rip_track(id, ordinal, progress, killed);

		let leftover = {
			let mut live = self.shared.live();
			live.phase = Phase::Idle;
			live.progress = None;
			live.failed = None;
			live.sink.take()
		};
		if let Some(mut sink) = leftover { let _res = sink.close(); }

		res
	}

	/// # Per-Track Lifecycle.
	///
	/// Idle → Preparing → Ripping → Finishing, in that order, with the
	/// delivery side doing its thing between the play command and the
	/// end-of-track signal.
	fn rip_track(&self, id: &str, ordinal: usize, progress: &Progless, killed: &KillSwitch)
	-> Result<(String, PathBuf), RipStreamError> {
		// The descriptor has to load before anything else can happen.
		let track = self.session.track(id)?;
		let dst = track_path(self.opts.root(), &track);

		// Idle → Preparing.
		{
			let mut live = self.shared.live();
			live.phase = Phase::Preparing;
			live.frames = 0;
			live.ticked = 0;
			live.failed = None;
		}
		self.shared.clear_eot();

		let sink = OutputSink::open(self.opts.encoder(), &dst, self.opts.capture())?;
		Msg::custom("Ripping", 199, &format!("{track} to {}", dst.display()))
			.with_newline(true)
			.eprint();

		// The progress total is the track length in whole seconds; the
		// delivery callback ticks it over as frames come in.
		let total = u32::try_from(track.duration_ms().div_ceil(1000))
			.unwrap_or(u32::MAX)
			.max(1);
		let _res = progress.reset(total);
		progress.set_title(Some(Msg::custom(
			format!("Track {ordinal:02}").as_str(),
			199,
			track.title(),
		)));

		// Preparing → Ripping: arm the sink, *then* start playback. The
		// handle swap has to land before the play command goes out.
		{
			let mut live = self.shared.live();
			live.sink.replace(sink);
			live.total = total;
			live.progress.replace(progress.clone());
			live.phase = Phase::Ripping;
		}
		self.session.player_load(id)?;
		self.session.player_play(true);

		// Park until the backend says the track is over, or the user pulls
		// the plug.
		let finished = self.shared.wait_eot(killed);
		self.session.player_play(false);

		// Ripping → Finishing: detach the sink under the lock so no late
		// delivery can race the close.
		let (sink, failed) = {
			let mut live = self.shared.live();
			live.phase = Phase::Finishing;
			live.progress = None;
			(live.sink.take(), live.failed.take())
		};
		progress.finish();

		let mut written = 0;
		let mut closed = Ok(());
		if let Some(mut sink) = sink {
			written = sink.written();
			closed = sink.close();
		}

		if ! finished { return Err(RipStreamError::Killed); }
		if let Some(e) = failed { return Err(e); }
		closed?;

		// Tag it! The descriptor's own ordinal wins when it has one.
		let num_track =
			if track.index() == 0 { u32::try_from(ordinal).unwrap_or(u32::MAX) }
			else { track.index() };
		tag_track(self.session, self.opts.tagger(), &track, num_track, &dst)?;

		Msg::custom("Ripped", 10, &format!(
			"{} ({} bytes).",
			dst.display(),
			NiceU64::from(written),
		))
			.with_newline(true)
			.eprint();

		Ok((track.title().to_owned(), dst))
	}
}
