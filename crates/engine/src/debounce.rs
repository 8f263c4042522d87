//! Per-document debounce timers.
//!
//! Each `(document, class)` pair holds at most one armed timer. Arming again
//! re-arms with a fresh generation (last-write-wins); a sleep that outlives
//! its generation posts an event the engine recognizes as stale, so a
//! disarmed timer never acts. Firing posts onto the engine's event queue;
//! timer tasks never run engine logic inline.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use crate::events::EngineEvent;
use crate::store::DocumentId;

/// Which debounce timer a slot belongs to.
///
/// The two classes have different delays and different cancellation triggers:
/// the edit timer is re-armed by the next edit, the idle timer is cancelled by
/// any cursor movement or edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TimerClass {
	/// Armed by document changes.
	Edit,
	/// Armed by cursor rest in an unchanged document.
	Idle,
}

/// Armed timer slots with monotonic generations.
pub(crate) struct DebounceScheduler {
	events: mpsc::UnboundedSender<EngineEvent>,
	slots: HashMap<(DocumentId, TimerClass), u64>,
	clock: u64,
}

impl DebounceScheduler {
	pub(crate) fn new(events: mpsc::UnboundedSender<EngineEvent>) -> Self {
		Self {
			events,
			slots: HashMap::new(),
			clock: 0,
		}
	}

	/// Arms or re-arms the timer for `(doc, class)`.
	pub(crate) fn schedule(&mut self, doc: DocumentId, class: TimerClass, delay: Duration) {
		self.clock += 1;
		let generation = self.clock;
		self.slots.insert((doc, class), generation);

		let events = self.events.clone();
		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			let _ = events.send(EngineEvent::TimerFired {
				doc,
				class,
				generation,
			});
		});
		trace!(doc = ?doc, class = ?class, generation, delay_ms = delay.as_millis() as u64, "timer armed");
	}

	/// Disarms the timer for `(doc, class)`; a disarmed timer never acts.
	pub(crate) fn cancel(&mut self, doc: DocumentId, class: TimerClass) {
		if self.slots.remove(&(doc, class)).is_some() {
			trace!(doc = ?doc, class = ?class, "timer cancelled");
		}
	}

	/// Consumes the slot if `generation` is still the armed one.
	///
	/// Returns false for fires that were superseded or cancelled.
	pub(crate) fn take_if_current(
		&mut self,
		doc: DocumentId,
		class: TimerClass,
		generation: u64,
	) -> bool {
		if self.slots.get(&(doc, class)) == Some(&generation) {
			self.slots.remove(&(doc, class));
			true
		} else {
			false
		}
	}

	#[cfg(test)]
	pub(crate) fn armed_generation(&self, doc: DocumentId, class: TimerClass) -> Option<u64> {
		self.slots.get(&(doc, class)).copied()
	}
}
