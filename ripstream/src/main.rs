/*!
# Ripstream
*/

#![forbid(unsafe_code)]

#![deny(
	clippy::correctness,
	unreachable_pub,
)]

#![warn(
	clippy::complexity,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::style,

	clippy::clone_on_ref_ptr,
	clippy::create_dir,
	clippy::filetype_is_file,
	clippy::format_push_string,
	clippy::get_unwrap,
	clippy::lossy_float_literal,
	clippy::missing_docs_in_private_items,
	clippy::needless_raw_strings,
	clippy::panic_in_result_fn,
	clippy::str_to_string,
	clippy::string_to_string,
	clippy::todo,
	clippy::unneeded_field_pattern,
	clippy::unseparated_literal_suffix,

	macro_use_extern_crate,
	missing_copy_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(clippy::redundant_pub_crate)]



mod backend;
mod cli;

use backend::LocalSession;
use cli::{
	Auth,
	Settings,
};
use dactyl::NiceElapsed;
use fyi_msg::{
	Msg,
	Progless,
};
use oxford_join::JoinFmt;
use ripstream_core::{
	KillSwitch,
	Ripper,
	RipStreamError,
	RipSummary,
};
use std::{
	borrow::Cow,
	process::ExitCode,
	sync::Arc,
	time::Instant,
};
use utc2k::FmtUtc2k;



/// # Main.
///
/// This lets us bubble up startup errors so they can be pretty-printed.
fn main() -> ExitCode {
	match main__() {
		Ok(()) => ExitCode::SUCCESS,
		Err(e @ (RipStreamError::PrintHelp | RipStreamError::PrintVersion)) => {
			println!("{e}");
			ExitCode::SUCCESS
		},
		Err(e) => {
			Msg::from(e).eprint();
			ExitCode::FAILURE
		},
	}
}

#[inline]
/// # Actual Main.
///
/// This does all the stuff.
fn main__() -> Result<(), RipStreamError> {
	let Settings { auth, uri, opts, no_summary, verbose } = cli::parse()?;

	// Last chance to bail.
	if ! no_summary { rip_summary(&auth, &uri, opts.capture())?; }

	// Log header.
	if verbose { log_header(&uri); }

	// Intercept CTRL-C so an early exit can still tidy up after itself.
	let killed = KillSwitch::default();
	{
		let inner = killed.clone();
		let _res = ctrlc::set_handler(move || inner.kill());
	}

	// Wire the engine to the backend.
	let session = LocalSession::default();
	let ripper = Ripper::new(&session, opts);
	session.register(Arc::new(ripper.callbacks()));

	// Log in.
	Msg::custom("Login", 199, "connecting…")
		.with_newline(true)
		.eprint();
	match auth {
		Auth::Password(ref user, ref pass) => ripper.login(user, pass)?,
		Auth::Stored => ripper.login_stored()?,
	}

	// Rip and rip and rip!
	let now = Instant::now();
	let progress = Progless::default();
	let summary = ripper.rip(&uri, &progress, &killed)?;
	finish_summary(&summary, now);

	if killed.killed() { Err(RipStreamError::Killed) }
	else { Ok(()) }
}



/// # Rip Summary.
///
/// Summarize and confirm the chosen settings before proceeding.
fn rip_summary(auth: &Auth, uri: &str, capture: bool) -> Result<(), RipStreamError> {
	let nice_auth = match auth {
		Auth::Password(user, _) => Cow::Owned(format!("user {user}")),
		Auth::Stored => Cow::Borrowed("stored credentials"),
	};
	let nice_capture = Cow::Borrowed(if capture { "MP3 + PCM" } else { "MP3" });
	let nice_output = Cow::Borrowed("./<artist>/<album>/<title>.mp3");

	let set = [
		("Source:", Cow::Borrowed(uri)),
		("Login:", nice_auth),
		("Format:", nice_capture),
		("Destination:", nice_output),
	];
	let max_label = set.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

	eprintln!("\x1b[1;38;5;199mRipstream…\x1b[0m");
	for (k, v) in set {
		eprintln!("  {k:max_label$} \x1b[1m{v}\x1b[0m");
	}

	// One last chance to bail!
	if Msg::custom("Ripstream", 199, "Shall we?").eprompt_with_default(true) {
		eprintln!();
		Ok(())
	}
	else {
		eprintln!();
		Err(RipStreamError::Killed)
	}
}

/// # Log Header.
///
/// Print a few basic setup details for the log. Only applies when
/// -v/--verbose is set.
fn log_header(uri: &str) {
	use std::io::Write;

	let writer = std::io::stdout();
	let mut handle = writer.lock();
	let _res = writeln!(
		&mut handle,
		concat!("#####
## Ripstream v", env!("CARGO_PKG_VERSION"), "
## Source: {uri}
## Date:   {date}
#####"),
		uri=uri,
		date=FmtUtc2k::now(),
	);
	let _res = handle.flush();
}

/// # Final Summary.
///
/// Report what made it, what didn't, and how long the whole thing took.
fn finish_summary(summary: &RipSummary, now: Instant) {
	let ripped = summary.ripped();
	if ! ripped.is_empty() {
		Msg::custom("Done", 10, &format!(
			"Ripped {} in {}.",
			JoinFmt::new(ripped.iter().map(|(t, _)| t.as_str()), ", "),
			NiceElapsed::from(now.elapsed()),
		))
			.with_newline(true)
			.eprint();
	}

	for (uri, err) in summary.skipped() {
		Msg::warning(format!("Skipped {uri}: {err}")).eprint();
	}

	if ripped.is_empty() && summary.skipped().is_empty() {
		Msg::warning("Nothing to rip!").eprint();
	}
}
