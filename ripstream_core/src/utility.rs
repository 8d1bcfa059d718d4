/*!
# Ripstream: Paths
*/

use crate::{
	MP3_EXTENSION,
	TrackDescriptor,
};
use std::path::{
	Path,
	PathBuf,
};
use trimothy::TrimMut;



/// # Component Fallback.
///
/// Substituted for artist/album/title values that sanitize down to nothing.
const UNKNOWN: &str = "Unknown";



/// # Track Output Path.
///
/// Derive the `<root>/<artist>/<album>/<title>.mp3` destination for a
/// descriptor. Each component is sanitized independently so a weird title
/// can't escape the tree or smuggle in extra directories.
pub(crate) fn track_path(root: &Path, track: &TrackDescriptor) -> PathBuf {
	let mut out = root.join(safe_component(track.artist().unwrap_or("")));
	out.push(safe_component(track.album()));

	// Glue the extension on by hand; `set_extension` would eat anything
	// after a dot in the title itself.
	out.push(format!("{}.{MP3_EXTENSION}", safe_component(track.title())));
	out
}

/// # Sanitize a Path Component.
///
/// Replace separator, control, and NUL characters with spaces, collapse the
/// whitespace, and trim the ends. Leading dots are stripped too so no
/// component can hide itself or alias the parent directory.
pub(crate) fn safe_component(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	let mut last_ws = true;
	for c in raw.chars() {
		let c = match c {
			'/' | '\\' | '\0' => ' ',
			c if c.is_control() => ' ',
			c => c,
		};
		if c.is_whitespace() {
			if ! last_ws { out.push(' '); }
			last_ws = true;
		}
		else {
			last_ws = false;
			out.push(c);
		}
	}

	out.trim_mut();
	while out.starts_with('.') { out.remove(0); }
	out.trim_mut();

	if out.is_empty() { UNKNOWN.to_owned() }
	else { out }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_safe_component() {
		assert_eq!(safe_component("Band"), "Band");
		assert_eq!(safe_component("  Band \t Name "), "Band Name");
		assert_eq!(safe_component("AC/DC"), "AC DC");
		assert_eq!(safe_component("..\\up"), "up");
		assert_eq!(safe_component(".hidden"), "hidden");
		assert_eq!(safe_component(""), "Unknown");
		assert_eq!(safe_component(" / "), "Unknown");
	}

	#[test]
	fn t_track_path() {
		let track = TrackDescriptor::new("mock:track:a", "Song")
			.with_artist("Band")
			.with_album("Album");
		assert_eq!(
			track_path(Path::new("."), &track),
			Path::new("./Band/Album/Song.mp3"),
		);

		// Pathological metadata should stay contained.
		let track = TrackDescriptor::new("mock:track:b", "Sym/phony No. 5")
			.with_artist("..")
			.with_album("");
		assert_eq!(
			track_path(Path::new("/tmp/out"), &track),
			Path::new("/tmp/out/Unknown/Unknown/Sym phony No. 5.mp3"),
		);
	}
}
