/*!
# Ripstream: Tagging
*/

use crate::{
	MediaSession,
	RipStreamError,
	TrackDescriptor,
};
use std::{
	io::Write,
	path::Path,
	process::{
		Command,
		Stdio,
	},
};



/// # Tag a Finished Track.
///
/// Spawn the external tag writer against the finished MP3 with the
/// descriptor's metadata and, when the facade can produce one, the cover
/// image staged in a temporary file. Everything is passed as a structured
/// argument vector, so titles full of quotes are just titles.
///
/// The cover scratch file is deleted when this returns.
///
/// ## Errors
///
/// This will return an error if the cover cannot be staged, or the tag
/// writer cannot be spawned or exits unhappily. Either way the MP3 itself is
/// fine, just plainer than intended.
pub(crate) fn tag_track<S: MediaSession>(
	session: &S,
	tagger: &Path,
	track: &TrackDescriptor,
	num_track: u32,
	dst: &Path,
) -> Result<(), RipStreamError> {
	// Stage the cover art, if any. The temp file cleans itself up when it
	// falls out of scope below.
	let cover = match session.cover(track.uri()) {
		Some(raw) => {
			let mut tmp = tempfile::Builder::new()
				.prefix("ripstream-cover-")
				.suffix(".jpg")
				.tempfile()
				.map_err(|_| RipStreamError::Cover)?;
			tmp.write_all(&raw).map_err(|_| RipStreamError::Cover)?;
			Some(tmp)
		},
		None => None,
	};

	let mut cmd = Command::new(tagger);
	if let Some(tmp) = cover.as_ref() {
		cmd.arg("--add-image");
		cmd.arg(format!("{}:FRONT_COVER", tmp.path().display()));
	}
	cmd.arg("-t").arg(track.title());
	cmd.arg("-a").arg(track.artist().unwrap_or(""));
	cmd.arg("-A").arg(track.album());
	cmd.arg("-n").arg(format!("{num_track:02}"));
	if let Some(year) = track.year() {
		cmd.arg("-Y").arg(year.to_string());
	}
	cmd.arg("-Q");
	cmd.arg(dst);

	let status = cmd
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.map_err(|_| RipStreamError::Tagger(tagger.to_string_lossy().into_owned()))?;

	if status.success() { Ok(()) }
	else { Err(RipStreamError::Tagger(tagger.to_string_lossy().into_owned())) }
}
