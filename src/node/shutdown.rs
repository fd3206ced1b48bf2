use tokio::sync::watch;

/// Cooperative cancellation signal checked by the synchronizer between steps.
#[derive(Debug, Clone)]
pub struct Shutdown {
	rx: watch::Receiver<bool>,
}

/// Triggers every [`Shutdown`] created alongside it.
#[derive(Debug)]
pub struct ShutdownTrigger {
	tx: watch::Sender<bool>,
}

impl Shutdown {
	pub fn new() -> (ShutdownTrigger, Shutdown) {
		let (tx, rx) = watch::channel(false);
		(ShutdownTrigger { tx }, Shutdown { rx })
	}

	pub fn is_cancelled(&self) -> bool {
		*self.rx.borrow()
	}
}

impl ShutdownTrigger {
	pub fn cancel(&self) {
		// Receivers may all be gone already.
		let _ = self.tx.send(true);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cancel_is_seen_by_clones() {
		let (trigger, shutdown) = Shutdown::new();
		let other = shutdown.clone();
		assert!(!shutdown.is_cancelled());
		trigger.cancel();
		assert!(shutdown.is_cancelled());
		assert!(other.is_cancelled());
	}
}
