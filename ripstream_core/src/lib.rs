/*!
# Ripstream: Library
*/

#![forbid(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::doc_markdown,
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod abort;
mod auth;
mod error;
#[cfg(test)]
mod mock;
mod rip;
mod session;
mod sink;
mod tag;
mod track;
mod utility;

pub use abort::KillSwitch;
pub use auth::{
	AuthGate,
	ConnectionState,
};
pub use error::RipStreamError;
pub use rip::{
	Phase,
	RipCallbacks,
	RipOptions,
	Ripper,
	RipSummary,
};
pub use session::{
	AudioFormat,
	Container,
	MediaSession,
	SessionCallbacks,
};
pub use sink::OutputSink;
pub(crate) use tag::tag_track;
pub use track::{
	TrackDescriptor,
	TrackSequencer,
};
pub(crate) use utility::track_path;



/// # Default Encoder Program.
///
/// Resolved through `PATH` unless an explicit path is configured.
pub const ENCODER_PROGRAM: &str = "lame";

/// # Default Tagger Program.
pub const TAGGER_PROGRAM: &str = "eyeD3";

/// # Output Extension.
pub const MP3_EXTENSION: &str = "mp3";

/// # Raw-Capture Extension.
///
/// Used for the sibling mirror file when capture is enabled.
pub const PCM_EXTENSION: &str = "pcm";
