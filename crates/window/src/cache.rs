//! Sliding window cache.
//!
//! [`SlidingWindow`] keeps a ring of [`ItemWrapper`]s for the cached range
//! around whatever the renderer shows, and turns window motion into the
//! minimal set of wrapper creations, disposals, requests and cancellations.
//!
//! The window is owned by one thread and is not internally synchronized.
//! Producers resolve requests on their own threads; those completions, and
//! change notices from the backing collection, queue up until the owner
//! calls [`SlidingWindow::pump`].

use std::collections::HashMap;
use std::ops::Range;

use mosaic_worker::IdClock;
use tokio::sync::{broadcast, mpsc};

use crate::ranges::{self, WindowRanges};
use crate::{
	ChangeNotifier, Completion, ConfigError, ContentProducer, ItemSource, ItemWrapper, PumpReport, Settled, SourceChange, WindowConfig,
	WindowError, WindowEvent,
};

/// Wrapper type stored by a window over source `S` and producer `P`.
pub type WindowItem<S, P> = ItemWrapper<<S as ItemSource>::Descriptor, <P as ContentProducer<<S as ItemSource>::Descriptor>>::Content>;

/// Windowed cache of load state machines over a backing collection.
pub struct SlidingWindow<S, P>
where
	S: ItemSource,
	P: ContentProducer<S::Descriptor>,
{
	source: S,
	producer: P,
	config: WindowConfig,
	ring: Vec<Option<WindowItem<S, P>>>,
	ranges: WindowRanges,
	active_requests: usize,
	draining: HashMap<u64, WindowItem<S, P>>,
	ids: IdClock,
	completion_tx: mpsc::UnboundedSender<Completion>,
	completion_rx: mpsc::UnboundedReceiver<Completion>,
	change_rx: mpsc::UnboundedReceiver<SourceChange>,
	events: broadcast::Sender<WindowEvent>,
	paused: bool,
}

impl<S, P> SlidingWindow<S, P>
where
	S: ItemSource,
	P: ContentProducer<S::Descriptor>,
	P::Content: Send + 'static,
{
	/// Creates an empty window over `source`.
	///
	/// Nothing is requested until the first [`Self::set_active_window`].
	pub fn new(mut source: S, producer: P, config: WindowConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		let (change_tx, change_rx) = mpsc::unbounded_channel();
		source.set_change_listener(ChangeNotifier::new(change_tx));
		let (completion_tx, completion_rx) = mpsc::unbounded_channel();
		let (events, _) = broadcast::channel(config.event_buffer);
		let size = source.count();
		let ring = std::iter::repeat_with(|| None).take(config.capacity).collect();

		Ok(Self {
			source,
			producer,
			config,
			ring,
			ranges: WindowRanges {
				active: 0..0,
				cached: 0..0,
				size,
			},
			active_requests: 0,
			draining: HashMap::new(),
			ids: IdClock::new(),
			completion_tx,
			completion_rx,
			change_rx,
			events,
			paused: false,
		})
	}

	/// Subscribes the render layer to window events.
	pub fn subscribe(&self) -> broadcast::Receiver<WindowEvent> {
		self.events.subscribe()
	}

	/// Logical size of the sequence.
	pub fn size(&self) -> usize {
		self.ranges.size
	}

	pub fn capacity(&self) -> usize {
		self.ring.len()
	}

	pub fn config(&self) -> &WindowConfig {
		&self.config
	}

	pub fn active_range(&self) -> Range<usize> {
		self.ranges.active.clone()
	}

	pub fn cached_range(&self) -> Range<usize> {
		self.ranges.cached.clone()
	}

	pub fn source(&self) -> &S {
		&self.source
	}

	/// Mutable access to the backing collection. Changes it reports are
	/// applied on the next [`Self::pump`].
	pub fn source_mut(&mut self) -> &mut S {
		&mut self.source
	}

	pub fn producer(&self) -> &P {
		&self.producer
	}

	pub fn is_paused(&self) -> bool {
		self.paused
	}

	/// Outstanding requests for active slots, as last budgeted.
	pub fn active_request_count(&self) -> usize {
		self.active_requests
	}

	/// Wrappers currently in the ring.
	pub fn live_wrappers(&self) -> usize {
		self.ring.iter().flatten().count()
	}

	/// Recycled wrappers still waiting for their in-flight request to drain.
	pub fn draining_wrappers(&self) -> usize {
		self.draining.len()
	}

	/// Moves the active range to `[start, end)`.
	///
	/// Requires `start <= end`, `end - start <= capacity` and `end <= size`.
	/// Violations are returned and leave the window untouched.
	pub fn set_active_window(&mut self, start: usize, end: usize) -> Result<(), WindowError> {
		if start > end {
			return Err(violation(WindowError::InvalidWindow { start, end }));
		}
		if end - start > self.capacity() {
			return Err(violation(WindowError::WindowTooLarge {
				len: end - start,
				capacity: self.capacity(),
			}));
		}
		if end > self.ranges.size {
			return Err(violation(WindowError::OutOfBounds { end, size: self.ranges.size }));
		}

		let active = start..end;
		let moved = self.ranges.active != active;
		self.ranges.active = active;
		let target = WindowRanges::centered(&self.ranges.active, self.capacity(), self.ranges.size);
		let recenter = self.ranges.should_recenter(&target, self.config.recenter_threshold);
		if !moved && !recenter {
			return Ok(());
		}

		if recenter {
			self.set_cached(target);
		}
		self.update_all_requests();
		Ok(())
	}

	/// Wrapper for an active slot.
	pub fn get(&self, slot: usize) -> Result<&WindowItem<S, P>, WindowError> {
		if !self.ranges.active.contains(&slot) {
			return Err(violation(WindowError::SlotNotActive {
				slot,
				active: self.ranges.active.clone(),
			}));
		}
		self.wrapper_at(slot).ok_or(WindowError::Paused)
	}

	/// Wrapper for any cached position, active or not.
	pub fn wrapper_at(&self, index: usize) -> Option<&WindowItem<S, P>> {
		let slot = index % self.ring.len();
		self.ring[slot].as_ref().filter(|w| w.index() == index)
	}

	/// Whether every active slot holds content or a settled error.
	pub fn is_all_active_slots_filled(&self) -> bool {
		self.ranges.active.clone().all(|index| self.wrapper_at(index).is_some_and(|w| w.state().is_settled()))
	}

	/// Applies queued completions and upstream change notices.
	pub fn pump(&mut self) -> PumpReport {
		let mut report = PumpReport::default();
		while let Ok(change) = self.change_rx.try_recv() {
			report.changes += 1;
			match change {
				SourceChange::SizeChanged(size) => self.on_size_changed(size),
				SourceChange::ContentChanged => self.on_content_changed(),
				SourceChange::Dirty => self.on_dirty(),
			}
		}
		while let Ok(done) = self.completion_rx.try_recv() {
			report.completions += 1;
			self.on_completion(done);
		}
		report
	}

	/// Applies a new logical size and resynchronizes every cached wrapper.
	pub fn on_size_changed(&mut self, size: usize) {
		if size == self.ranges.size {
			return;
		}
		tracing::debug!(old = self.ranges.size, new = size, "window.size_changed");
		self.ranges.clamp_to(size);
		self.emit(WindowEvent::SizeChanged(size));
		self.resync();
	}

	/// Re-reads every cached descriptor, recycling and recreating its wrapper.
	pub fn on_content_changed(&mut self) {
		tracing::debug!(cached = ?self.ranges.cached, "window.content_changed");
		self.resync();
	}

	/// Asks the renderer to repaint without touching any data.
	pub fn on_dirty(&mut self) {
		self.emit(WindowEvent::ContentInvalidated);
	}

	/// Releases every wrapper and stops issuing requests.
	///
	/// Ranges keep tracking [`Self::set_active_window`] while paused.
	pub fn pause(&mut self) {
		if self.paused {
			return;
		}
		tracing::debug!(cached = ?self.ranges.cached, "window.pause");
		for index in self.ranges.cached.clone() {
			self.free_slot(index);
		}
		self.paused = true;
		self.active_requests = 0;
	}

	/// Recreates wrappers for the cached range and requests content again.
	pub fn resume(&mut self) {
		if !self.paused {
			return;
		}
		tracing::debug!(cached = ?self.ranges.cached, "window.resume");
		self.paused = false;
		for index in self.ranges.cached.clone() {
			self.prepare_slot(index);
		}
		self.update_all_requests();
	}

	fn set_cached(&mut self, target: Range<usize>) {
		let old = std::mem::replace(&mut self.ranges.cached, target.clone());
		tracing::debug!(old = ?old, new = ?target, active = ?self.ranges.active, "window.recenter");
		for index in ranges::leaving(&old, &target).into_iter().flatten() {
			self.free_slot(index);
		}
		for index in ranges::entering(&old, &target).into_iter().flatten() {
			self.prepare_slot(index);
		}
	}

	fn resync(&mut self) {
		let mut previous = Vec::new();
		for index in self.ranges.cached.clone() {
			if let Some(wrapper) = self.take_slot(index) {
				previous.push((index, wrapper.state()));
				self.retire(wrapper);
			}
		}

		let target = WindowRanges::centered(&self.ranges.active, self.capacity(), self.ranges.size);
		self.ranges.cached = target.clone();
		for index in target {
			self.prepare_slot(index);
		}
		self.update_all_requests();
		for (index, old) in previous {
			if let Some(new) = self.wrapper_at(index).map(|w| w.state()) {
				self.emit(WindowEvent::ContentChanged { slot: index, old, new });
			}
		}
	}

	fn prepare_slot(&mut self, index: usize) {
		if self.paused {
			return;
		}
		let descriptor = if self.config.kind.uses_cover() {
			self.source.cover_items_at(index).into_iter().next()
		} else {
			self.source.item_at(index)
		};
		let wrapper = ItemWrapper::new(self.ids.next(), index, descriptor, self.config.kind, self.completion_tx.clone());
		let slot = index % self.ring.len();
		if let Some(stale) = self.ring[slot].replace(wrapper) {
			tracing::warn!(slot = stale.index(), "window.ring_collision");
			self.retire(stale);
		}
	}

	fn take_slot(&mut self, index: usize) -> Option<WindowItem<S, P>> {
		let slot = index % self.ring.len();
		match &self.ring[slot] {
			Some(wrapper) if wrapper.index() == index => self.ring[slot].take(),
			_ => None,
		}
	}

	fn free_slot(&mut self, index: usize) {
		if let Some(wrapper) = self.take_slot(index) {
			self.retire(wrapper);
		}
	}

	fn retire(&mut self, mut wrapper: WindowItem<S, P>) {
		if !wrapper.recycle(&self.producer) {
			self.draining.insert(wrapper.id(), wrapper);
		}
	}

	fn update_all_requests(&mut self) {
		if self.paused {
			return;
		}
		self.active_requests = 0;
		for index in self.ranges.active.clone() {
			if self.request_slot(index) {
				self.active_requests += 1;
			}
		}
		if self.active_requests == 0 {
			self.request_non_active();
		} else {
			self.cancel_non_active();
		}
	}

	fn request_slot(&mut self, index: usize) -> bool {
		let slot = index % self.ring.len();
		match self.ring[slot].as_mut() {
			Some(wrapper) if wrapper.index() == index => wrapper.request_load(&self.producer),
			_ => false,
		}
	}

	fn request_non_active(&mut self) {
		for index in ranges::fill_order(&self.ranges.active, &self.ranges.cached) {
			self.request_slot(index);
		}
	}

	fn cancel_non_active(&mut self) {
		for index in ranges::fill_order(&self.ranges.active, &self.ranges.cached) {
			let slot = index % self.ring.len();
			if let Some(wrapper) = self.ring[slot].as_mut().filter(|w| w.index() == index) {
				wrapper.cancel_load();
			}
		}
	}

	fn on_completion(&mut self, done: Completion) {
		let slot = done.index % self.ring.len();
		let applied = match self.ring[slot].as_mut() {
			Some(wrapper) if wrapper.id() == done.id => {
				let old = wrapper.state();
				let settled = wrapper.on_complete(&self.producer);
				Some((old, wrapper.state(), settled))
			}
			_ => None,
		};

		let Some((old, new, settled)) = applied else {
			self.drain_retired(done);
			return;
		};
		match settled {
			Settled::Installed | Settled::Failed(_) => {
				if let Settled::Failed(err) = &settled {
					tracing::warn!(slot = done.index, error = %err, "window.load_failed");
				}
				self.emit(WindowEvent::ContentChanged { slot: done.index, old, new });
				if self.ranges.active.contains(&done.index) && self.active_requests > 0 {
					self.active_requests -= 1;
					if self.active_requests == 0 {
						self.request_non_active();
					}
				}
			}
			Settled::Reissued | Settled::Idle | Settled::Disposed | Settled::Stale => {}
		}
	}

	fn drain_retired(&mut self, done: Completion) {
		let Some(mut wrapper) = self.draining.remove(&done.id) else {
			tracing::trace!(slot = done.index, id = done.id, "window.stale_completion");
			return;
		};
		if wrapper.on_complete(&self.producer) == Settled::Stale {
			self.draining.insert(done.id, wrapper);
		}
	}

	fn emit(&self, event: WindowEvent) {
		let _ = self.events.send(event);
	}
}

fn violation(err: WindowError) -> WindowError {
	tracing::warn!(error = %err, "window.contract_violation");
	err
}
