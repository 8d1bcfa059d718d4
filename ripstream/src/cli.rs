/*!
# Ripstream: CLI
*/

use argyle::Argument;
use ripstream_core::{
	RipOptions,
	RipStreamError,
};



/// # Login Method.
pub(super) enum Auth {
	/// # Explicit User/Password.
	Password(String, String),

	/// # Credentials Stored By a Previous Run.
	Stored,
}

/// # Parsed Settings.
pub(super) struct Settings {
	/// # Login Method.
	pub(super) auth: Auth,

	/// # The URI To Rip.
	pub(super) uri: String,

	/// # Rip Options.
	pub(super) opts: RipOptions,

	/// # Skip the Summary/Confirmation?
	pub(super) no_summary: bool,

	/// # Print the Log Header?
	pub(super) verbose: bool,
}



/// # Parse Options.
pub(super) fn parse() -> Result<Settings, RipStreamError> {
	let args = argyle::args()
		.with_keywords(include!(concat!(env!("OUT_DIR"), "/argyle.rs")));

	let mut last = false;
	let mut no_summary = false;
	let mut output = None;
	let mut password = None;
	let mut pcm = false;
	let mut uri = None;
	let mut user = None;
	let mut verbose = false;
	for arg in args {
		match arg {
			Argument::Key("-h" | "--help") => return Err(RipStreamError::PrintHelp),
			Argument::Key("-l" | "--last") => { last = true; },
			Argument::Key("-m" | "--pcm") => { pcm = true; },
			Argument::Key("--no-summary") => { no_summary = true; },
			Argument::Key("-v" | "--verbose") => { verbose = true; },
			Argument::Key("-V" | "--version") => return Err(RipStreamError::PrintVersion),

			Argument::KeyWithValue("-o" | "--output", s) => { output.replace(s); },
			Argument::KeyWithValue("-p" | "--password", s) => { password.replace(s); },
			Argument::KeyWithValue("-u" | "--user", s) => { user.replace(s); },

			Argument::Other(s) => { uri.replace(s); },

			_ => {},
		}
	}

	// A URI is not optional.
	let uri = uri.ok_or(RipStreamError::CliParse("<URI>"))?;

	// Exactly one login method, fully specified.
	let auth = match (user, password, last) {
		(Some(u), Some(p), false) => Auth::Password(u, p),
		(None, None, true) => Auth::Stored,
		_ => return Err(RipStreamError::CliParse("-u/--user and -p/--password (or -l/--last)")),
	};

	let mut opts = RipOptions::default().with_capture(pcm);
	if let Some(o) = output { opts = opts.with_root(o); }

	Ok(Settings {
		auth,
		uri,
		opts,
		no_summary,
		verbose,
	})
}
