/*!
# Ripstream: Authentication Gate
*/

use crate::{
	MediaSession,
	RipStreamError,
};
use std::sync::{
	Condvar,
	Mutex,
	PoisonError,
};



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Connection State.
///
/// The connection phases reported by the session facade. Only the two
/// definitive states move the gate; the transitional ones are noise as far
/// as waiting callers are concerned.
pub enum ConnectionState {
	/// # Logged Out.
	LoggedOut,

	/// # Logging In.
	LoggingIn,

	/// # Logged In.
	LoggedIn,

	/// # Logging Out.
	LoggingOut,
}



#[derive(Debug, Default)]
/// # Gate State.
///
/// A single flag keeps the logged-in/logged-out signals mutually exclusive
/// by construction; the generation counter ticks on every definitive
/// notification so waiters can tell a fresh rejection apart from the stale
/// logged-out state they started in.
struct GateState {
	logged_in: bool,
	generation: u64,
}



#[derive(Debug, Default)]
/// # Authentication Gate.
///
/// The facade reports connection changes asynchronously from its dispatcher
/// thread; this gate translates that stream into a synchronous wait
/// primitive for the driving thread. Both signals start logged-out.
///
/// The gate imposes no timeout of its own; a login that neither lands nor
/// bounces is the provider library's problem to give up on.
pub struct AuthGate {
	state: Mutex<GateState>,
	cvar: Condvar,
}

impl AuthGate {
	/// # Record a Connection Notification.
	///
	/// Called (indirectly) from the dispatcher thread on every
	/// connection-state change. Definitive states flip the flag (atomically,
	/// under the one lock) and wake any waiters; transitional states change
	/// nothing.
	pub(crate) fn notify(&self, state: ConnectionState) {
		let logged_in = match state {
			ConnectionState::LoggedIn => true,
			ConnectionState::LoggedOut => false,
			_ => return,
		};

		let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
		guard.logged_in = logged_in;
		guard.generation += 1;
		self.cvar.notify_all();
	}

	#[must_use]
	/// # Logged In?
	pub fn is_logged_in(&self) -> bool {
		self.state.lock().unwrap_or_else(PoisonError::into_inner).logged_in
	}

	#[must_use]
	/// # Logged Out?
	pub fn is_logged_out(&self) -> bool { ! self.is_logged_in() }
}

impl AuthGate {
	/// # Log In.
	///
	/// Issue the login command and block until the logged-in signal is
	/// observed.
	///
	/// ## Errors
	///
	/// This will return an error if the command cannot be issued, or the
	/// provider answers with a (fresh) logged-out notification instead.
	pub fn login<S: MediaSession>(
		&self,
		session: &S,
		username: &str,
		password: &str,
	) -> Result<(), RipStreamError> {
		let generation = match self.pre_login() {
			Some(g) => g,
			None => return Ok(()),
		};
		session.login(username, password, true)?;
		self.wait_definitive(generation)
	}

	/// # Log In With Stored Credentials.
	///
	/// Same contract as [`AuthGate::login`], but reusing whatever the
	/// provider remembered from last time.
	///
	/// ## Errors
	///
	/// This will return an error if there are no stored credentials, or the
	/// remote rejects them.
	pub fn relogin<S: MediaSession>(&self, session: &S) -> Result<(), RipStreamError> {
		let generation = match self.pre_login() {
			Some(g) => g,
			None => return Ok(()),
		};
		session.relogin()?;
		self.wait_definitive(generation)
	}

	/// # Log Out.
	///
	/// If currently logged in, issue the logout command and block until the
	/// logged-out signal is observed; otherwise this is an idempotent no-op.
	pub fn logout<S: MediaSession>(&self, session: &S) {
		{
			let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
			if ! guard.logged_in { return; }
		}
		session.logout();

		let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
		while guard.logged_in {
			guard = self.cvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
		}
	}

	/// # Pre-Login Snapshot.
	///
	/// Return the current generation, or `None` if we're already logged in
	/// and there's nothing to do.
	fn pre_login(&self) -> Option<u64> {
		let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
		if guard.logged_in { None }
		else { Some(guard.generation) }
	}

	/// # Wait For a Definitive Answer.
	///
	/// Block until logged in, or until a logged-out notification newer than
	/// `generation` arrives, whichever comes first.
	fn wait_definitive(&self, generation: u64) -> Result<(), RipStreamError> {
		let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
		loop {
			if guard.logged_in { return Ok(()); }
			if guard.generation > generation { return Err(RipStreamError::Auth); }
			guard = self.cvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
		}
	}
}
