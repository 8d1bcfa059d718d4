/*!
# Ripstream: Tracks
*/

use crate::{
	Container,
	MediaSession,
	RipStreamError,
};
use fyi_msg::Msg;
use std::{
	fmt,
	time::{
		Duration,
		Instant,
	},
};



/// # Playlist Poll Interval.
///
/// Partially-loaded playlists under-report their membership, so iteration
/// has to wait for the loaded flag, checked at this interval.
const PLAYLIST_POLL: Duration = Duration::from_millis(100);



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Track Descriptor.
///
/// One playable unit, immutable once loaded. Descriptors are minted by the
/// session facade (metadata lives provider-side); the rip machinery only
/// ever reads them. Cover art stays behind the facade until tag time.
///
/// Descriptors are built up builder-style, like:
///
/// ```
/// use ripstream_core::TrackDescriptor;
///
/// let track = TrackDescriptor::new("local:track:demo.pcm", "Song")
///     .with_artist("Band")
///     .with_album("Album")
///     .with_year(2001)
///     .with_index(1);
///
/// assert_eq!(track.title(), "Song");
/// assert_eq!(track.year(), Some(2001));
/// ```
pub struct TrackDescriptor {
	uri: String,
	index: u32,
	title: String,
	artists: Vec<String>,
	album: String,
	year: Option<u16>,
	duration_ms: u64,
}

impl fmt::Display for TrackDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.artist() {
			Some(a) => write!(f, "{a} - {}", self.title),
			None => f.write_str(&self.title),
		}
	}
}

impl TrackDescriptor {
	#[must_use]
	/// # New.
	pub fn new<S: Into<String>>(uri: S, title: S) -> Self {
		Self {
			uri: uri.into(),
			index: 0,
			title: title.into(),
			artists: Vec::new(),
			album: String::new(),
			year: None,
			duration_ms: 0,
		}
	}

	#[must_use]
	/// # With Container Ordinal.
	///
	/// One-based; zero means unknown, in which case the sequencer's own
	/// count is used for tagging.
	pub fn with_index(mut self, index: u32) -> Self {
		self.index = index;
		self
	}

	#[must_use]
	/// # With (One More) Artist.
	pub fn with_artist<S: Into<String>>(mut self, artist: S) -> Self {
		self.artists.push(artist.into());
		self
	}

	#[must_use]
	/// # With Album.
	pub fn with_album<S: Into<String>>(mut self, album: S) -> Self {
		self.album = album.into();
		self
	}

	#[must_use]
	/// # With Album Year.
	pub fn with_year(mut self, year: u16) -> Self {
		self.year = Some(year);
		self
	}

	#[must_use]
	/// # With Duration.
	///
	/// Zero means unknown; the progress bar just won't have much to say.
	pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
		self.duration_ms = duration_ms;
		self
	}
}

impl TrackDescriptor {
	#[must_use]
	/// # URI.
	pub fn uri(&self) -> &str { &self.uri }

	#[must_use]
	/// # Container Ordinal.
	pub const fn index(&self) -> u32 { self.index }

	#[must_use]
	/// # Display Title.
	pub fn title(&self) -> &str { &self.title }

	#[must_use]
	/// # Primary Artist.
	pub fn artist(&self) -> Option<&str> {
		self.artists.first().map(String::as_str)
	}

	#[must_use]
	/// # All Artists.
	pub fn artists(&self) -> &[String] { &self.artists }

	#[must_use]
	/// # Album Name.
	pub fn album(&self) -> &str { &self.album }

	#[must_use]
	/// # Album Year.
	pub const fn year(&self) -> Option<u16> { self.year }

	#[must_use]
	/// # Duration in Milliseconds.
	pub const fn duration_ms(&self) -> u64 { self.duration_ms }
}



#[derive(Debug)]
/// # Track Sequencer.
///
/// A lazy, finite, forward-only walk over the track URIs of a resolved
/// container, in container order. Not restartable; once a URI has been
/// yielded it is gone.
///
/// Descriptors themselves are loaded one at a time at rip time, so a bad
/// apple only costs its own track.
pub struct TrackSequencer {
	iter: std::vec::IntoIter<String>,
}

impl Iterator for TrackSequencer {
	type Item = String;

	#[inline]
	fn next(&mut self) -> Option<Self::Item> { self.iter.next() }

	#[inline]
	fn size_hint(&self) -> (usize, Option<usize>) {
		let len = self.iter.len();
		(len, Some(len))
	}
}

impl ExactSizeIterator for TrackSequencer {
	#[inline]
	fn len(&self) -> usize { self.iter.len() }
}

impl TrackSequencer {
	/// # Resolve a URI.
	///
	/// Resolve the URI through the facade and return the sequence of track
	/// URIs it contains: exactly one for a track, every member in order for
	/// a playlist.
	///
	/// A playlist blocks here until it reports fully loaded, polling at
	/// 100ms, or until `timeout` runs out.
	///
	/// ## Errors
	///
	/// This will return an error if the URI is neither a track nor a
	/// playlist, or a playlist fails to finish loading in time.
	pub fn resolve<S: MediaSession>(
		session: &S,
		uri: &str,
		timeout: Duration,
	) -> Result<Self, RipStreamError> {
		let ids = match session.resolve(uri)? {
			Container::Track(id) => vec![id],
			Container::Playlist(id) => {
				let mut waited = false;

				// Absurd timeouts would overflow the clock; treat them as
				// no deadline at all.
				let deadline = Instant::now().checked_add(timeout);
				loop {
					if let Some(ids) = session.playlist(&id) { break ids; }
					let now = Instant::now();
					let wait = match deadline {
						Some(d) if d <= now => return Err(RipStreamError::PlaylistTimeout),
						Some(d) => PLAYLIST_POLL.min(d - now),
						None => PLAYLIST_POLL,
					};
					if ! waited {
						waited = true;
						Msg::custom("Loading", 199, "waiting for the playlist to settle…")
							.with_newline(true)
							.eprint();
					}
					std::thread::sleep(wait);
				}
			},
		};

		Ok(Self { iter: ids.into_iter() })
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::mock::MockSession;

	#[test]
	fn t_descriptor() {
		let track = TrackDescriptor::new("spotify:track:123", "Song")
			.with_artist("Band")
			.with_artist("Other Band")
			.with_album("Album")
			.with_year(2001)
			.with_index(7)
			.with_duration_ms(180_000);

		assert_eq!(track.uri(), "spotify:track:123");
		assert_eq!(track.index(), 7);
		assert_eq!(track.title(), "Song");
		assert_eq!(track.artist(), Some("Band"));
		assert_eq!(track.artists().len(), 2);
		assert_eq!(track.album(), "Album");
		assert_eq!(track.year(), Some(2001));
		assert_eq!(track.duration_ms(), 180_000);
		assert_eq!(track.to_string(), "Band - Song");
	}

	#[test]
	fn t_single_track() {
		let session = MockSession::default();
		let seq = TrackSequencer::resolve(&session, "mock:track:a", Duration::ZERO)
			.expect("Track resolution failed.");
		let got: Vec<String> = seq.collect();
		assert_eq!(got, ["mock:track:a"]);
	}

	#[test]
	fn t_playlist_order() {
		// The playlist pretends to be unloaded for the first few polls; the
		// final membership must still come through complete and in order.
		let session = MockSession::default().with_playlist_delay(3);
		let seq = TrackSequencer::resolve(
			&session,
			"mock:playlist:p",
			Duration::from_secs(5),
		)
			.expect("Playlist resolution failed.");
		assert_eq!(seq.len(), 2);
		let got: Vec<String> = seq.collect();
		assert_eq!(got, ["mock:track:a", "mock:track:b"]);
	}

	#[test]
	fn t_playlist_timeout() {
		// A playlist that never loads should bow out with a timeout error
		// rather than spinning forever.
		let session = MockSession::default().with_playlist_delay(u32::MAX);
		assert_eq!(
			TrackSequencer::resolve(
				&session,
				"mock:playlist:p",
				Duration::from_millis(150),
			)
				.map(Iterator::count),
			Err(RipStreamError::PlaylistTimeout),
		);
	}

	#[test]
	fn t_resolution_failure() {
		let session = MockSession::default();
		assert!(matches!(
			TrackSequencer::resolve(&session, "mock:nonsense", Duration::ZERO),
			Err(RipStreamError::Resolution(_)),
		));
	}
}
