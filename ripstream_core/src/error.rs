/*!
# Ripstream: Errors
*/

use fyi_msg::Msg;
use std::{
	error::Error,
	fmt,
};



#[cfg(feature = "bin")]
/// # Help Text.
const HELP: &str = concat!(r"
Ripstream v", env!("CARGO_PKG_VERSION"), r"
Rip a track or playlist URI to tagged MP3s
with embedded cover art.

USAGE:
    ripstream [OPTIONS] <URI>

LOGIN:
    -u, --user <NAME>     The account user name. Requires -p/--password.
    -p, --password <PASS> The account password. Requires -u/--user.
    -l, --last            Log in with the credentials stored by a previous
                          run instead of -u/-p.

OUTPUT:
    -o, --output <DIR>    Write the <artist>/<album>/<title>.mp3 tree under
                          this directory. [default: the current working
                          directory]
    -m, --pcm             Mirror the raw PCM stream to a sibling .pcm file
                          alongside each MP3.

MISCELLANEOUS:
    -h, --help            Print help information to STDOUT and exit.
        --no-summary      Skip the settings summary and confirmation prompt
                          and jump straight to ripping.
    -v, --verbose         Print a per-track log to STDOUT, so it can e.g.
                          be piped to a file for review.
    -V, --version         Print version information to STDOUT and exit.

EARLY EXIT:
    Press CTRL+C to stop a rip early. Open files are closed and the session
    is logged out before the program dies.
");



#[derive(Debug, Clone, Eq, PartialEq)]
/// # Errors.
pub enum RipStreamError {
	/// # Login rejected.
	Auth,

	/// # No stored credentials to log back in with.
	NoStoredCredentials,

	/// # The URI is neither a track nor a playlist.
	Resolution(String),

	/// # The playlist never finished loading.
	PlaylistTimeout,

	/// # Track metadata fetch failure.
	TrackLoad(String),

	/// # Output directory creation failure.
	Directory(String),

	/// # The encoder process did not exit cleanly.
	Encoder(String),

	/// # Unable to spawn the encoder process.
	EncoderSpawn(String),

	/// # Writing to the sink (encoder pipe or capture file).
	SinkWrite(String),

	/// # Unable to stage the cover art.
	Cover,

	/// # Tag-writer spawn or exit failure.
	Tagger(String),

	/// # User Abort.
	Killed,

	#[cfg(feature = "bin")]
	/// # CLI Parsing failure.
	CliParse(&'static str),

	#[cfg(feature = "bin")]
	/// # Print Help (Not an Error).
	PrintHelp,

	#[cfg(feature = "bin")]
	/// # Print Version (Not an Error).
	PrintVersion,
}

impl Error for RipStreamError {}

impl From<RipStreamError> for Msg {
	#[inline]
	fn from(src: RipStreamError) -> Self { Self::error(src.to_string()) }
}

impl fmt::Display for RipStreamError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Auth => f.write_str("Login rejected."),
			Self::NoStoredCredentials => f.write_str("There are no stored credentials to log back in with."),
			Self::Resolution(s) => write!(f, "Not a track or playlist URI: {s}."),
			Self::PlaylistTimeout => f.write_str("The playlist never finished loading."),
			Self::TrackLoad(s) => write!(f, "Unable to load track metadata for {s}."),
			Self::Directory(s) => write!(f, "Unable to create the output directory {s}."),
			Self::Encoder(s) => write!(f, "The encoder did not finish {s} cleanly."),
			Self::EncoderSpawn(s) => write!(f, "Unable to spawn the encoder ({s})."),
			Self::SinkWrite(s) => write!(f, "Unable to write to {s}."),
			Self::Cover => f.write_str("Unable to stage the cover art."),
			Self::Tagger(s) => write!(f, "The tag writer ({s}) failed."),
			Self::Killed => f.write_str("User abort."),

			#[cfg(feature = "bin")]
			Self::CliParse(s) => write!(f, "Unable to parse {s}."),

			#[cfg(feature = "bin")]
			Self::PrintHelp => f.write_str(HELP),

			#[cfg(feature = "bin")]
			Self::PrintVersion => f.write_str(concat!("Ripstream v", env!("CARGO_PKG_VERSION"))),
		}
	}
}

impl RipStreamError {
	#[must_use]
	/// # Fatal to the Whole Run?
	///
	/// Authentication, resolution, and abort errors terminate the process;
	/// everything else is caught at the rip boundary so the batch can move
	/// on to the next track.
	pub const fn is_fatal(&self) -> bool {
		matches!(
			self,
			Self::Auth
				| Self::NoStoredCredentials
				| Self::Resolution(_)
				| Self::PlaylistTimeout
				| Self::Killed
		)
	}
}
