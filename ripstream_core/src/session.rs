/*!
# Ripstream: Session Facade

The remote session protocol is owned by the streaming provider's client
library; this module only defines the seam it is consumed through. Commands
flow out through [`MediaSession`]; notifications flow back in through
[`SessionCallbacks`], invoked from the provider's own dispatcher thread.
*/

use crate::{
	ConnectionState,
	RipStreamError,
	TrackDescriptor,
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Audio Format.
///
/// The shape of the PCM data carried by a single delivery callback. The
/// provider supplies this fresh with every call; it is assumed constant for
/// a given track but never cached across tracks.
pub struct AudioFormat {
	/// # Samples Per Second.
	sample_rate: u32,

	/// # Channel Count.
	channels: u16,

	/// # Bits Per Sample.
	bits_per_sample: u16,
}

impl Default for AudioFormat {
	#[inline]
	/// # CD Audio.
	fn default() -> Self {
		Self {
			sample_rate: 44_100,
			channels: 2,
			bits_per_sample: 16,
		}
	}
}

impl AudioFormat {
	#[must_use]
	/// # New.
	pub const fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
		Self { sample_rate, channels, bits_per_sample }
	}

	#[must_use]
	/// # Samples Per Second.
	pub const fn sample_rate(&self) -> u32 { self.sample_rate }

	#[must_use]
	/// # Channel Count.
	pub const fn channels(&self) -> u16 { self.channels }

	#[must_use]
	/// # Bits Per Sample.
	pub const fn bits_per_sample(&self) -> u16 { self.bits_per_sample }

	#[must_use]
	/// # Bytes Per Frame.
	///
	/// A frame is one sample across all channels, so for CD audio this works
	/// out to four bytes.
	pub fn bytes_per_frame(&self) -> usize {
		self.channels as usize * (self.bits_per_sample as usize).div_ceil(8)
	}
}



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Container.
///
/// A resolved URI: either a single playable track or an ordered playlist of
/// them. The inner values are provider URIs, opaque to everything but the
/// facade that minted them.
pub enum Container {
	/// # One Track.
	Track(String),

	/// # An Ordered Playlist.
	Playlist(String),
}



/// # Session Facade (Commands).
///
/// The outbound half of the facade: authentication, URI resolution, metadata
/// loading, and playback control. Implementations bridge a provider's client
/// library; the loopback backend shipped with the binary reads local PCM
/// captures instead.
///
/// Commands may be issued from the driving thread at any time; notifications
/// triggered by them arrive asynchronously through whatever
/// [`SessionCallbacks`] the caller registered.
pub trait MediaSession {
	/// # Log In.
	///
	/// Issue the login command. The definitive outcome arrives later as a
	/// connection-state notification; this only fails if the command itself
	/// cannot be issued.
	///
	/// ## Errors
	///
	/// This will return an error if the command cannot be issued.
	fn login(&self, username: &str, password: &str, remember_me: bool)
	-> Result<(), RipStreamError>;

	/// # Log In With Stored Credentials.
	///
	/// ## Errors
	///
	/// This will return an error if no credentials were stored by a previous
	/// run, or the command cannot be issued.
	fn relogin(&self) -> Result<(), RipStreamError>;

	/// # Log Out.
	///
	/// Issue the logout command. The logged-out notification arrives
	/// asynchronously.
	fn logout(&self);

	/// # Resolve a URI.
	///
	/// ## Errors
	///
	/// This will return an error if the URI identifies neither a track nor a
	/// playlist.
	fn resolve(&self, uri: &str) -> Result<Container, RipStreamError>;

	/// # Load Track Metadata.
	///
	/// ## Errors
	///
	/// This will return an error if the metadata cannot be fetched. Such
	/// failures are recoverable at track granularity; the batch moves on.
	fn track(&self, uri: &str) -> Result<TrackDescriptor, RipStreamError>;

	/// # Playlist Contents.
	///
	/// Return the member track URIs in playlist order, or `None` if the
	/// playlist has not finished loading yet. Partial playlists under-report
	/// their length, so callers must poll until this settles.
	fn playlist(&self, uri: &str) -> Option<Vec<String>>;

	/// # Cover Art.
	///
	/// Resolve and return the track's cover image bytes, if it has any. Fetch
	/// failures are not interesting enough to distinguish from absence.
	fn cover(&self, uri: &str) -> Option<Vec<u8>>;

	/// # Queue a Track for Playback.
	///
	/// ## Errors
	///
	/// This will return an error if the track cannot be loaded into the
	/// player.
	fn player_load(&self, uri: &str) -> Result<(), RipStreamError>;

	/// # Start/Pause Playback.
	///
	/// Once playing, the dispatcher starts firing delivery callbacks and,
	/// eventually, end-of-track.
	fn player_play(&self, play: bool);
}



/// # Session Facade (Notifications).
///
/// The inbound half of the facade: the three asynchronous entry points the
/// provider's dispatcher invokes. Implementations must treat every method as
/// reentrant from that thread, and must not assume delivery and end-of-track
/// are mutually exclusive in time.
pub trait SessionCallbacks: Send + Sync {
	/// # Connection State Changed.
	fn connection_state_changed(&self, state: ConnectionState);

	/// # Music Delivery.
	///
	/// A chunk of decoded audio frames has arrived. The return value is the
	/// number of frames actually consumed; the dispatcher re-offers anything
	/// unconsumed later.
	fn music_delivery(&self, format: AudioFormat, frame_bytes: &[u8], frame_count: usize)
	-> usize;

	/// # End of Track.
	///
	/// Playback of the current track has finished.
	fn end_of_track(&self);
}
