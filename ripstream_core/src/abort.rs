/*!
# Ripstream: Kill Switch
*/

use std::sync::{
	Arc,
	atomic::{
		AtomicBool,
		Ordering::{
			Acquire,
			Release,
		},
	},
};



#[derive(Debug, Clone, Default)]
/// # Kill Switch.
///
/// This is a short-circuit for long-running operations across multiple
/// threads. (Driving is single-threaded, but delivery isn't.)
///
/// The main program's CTRL-C intercept sets the value, allowing Ripstream to
/// tidy up (close the open sink, log out) before dying.
pub struct KillSwitch(Arc<AtomicBool>);

impl KillSwitch {
	#[must_use]
	/// # Dead?
	pub fn killed(&self) -> bool { self.0.load(Acquire) }

	/// # Kill!
	///
	/// Flip the switch. There is no unflipping it.
	pub fn kill(&self) { self.0.store(true, Release); }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_kill() {
		let killed = KillSwitch::default();
		let clone = killed.clone();
		assert!(! killed.killed());
		clone.kill();
		assert!(killed.killed(), "Clones should share the same switch.");
	}
}
