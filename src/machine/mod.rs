//! The traffic-light state machine.
//!
//! A [`TrafficLight`] runs two independent inputs through one critical
//! section:
//!
//! - **Timer completions** advance the [`LightState`] along the
//!   [`TransitionTable`], using whatever [`Direction`] is current when the
//!   timer fires.
//! - **Connectivity signals** set the direction and nothing else. They never
//!   move the light and never reset the running countdown.
//!
//! Both inputs may arrive on any thread. Each is applied under the machine's
//! lock, in arrival order, and the resulting [`Snapshot`] is published before
//! the lock is released.
//!
//! # Example
//!
//! ```rust
//! use stoplight::clock::SimulatedClock;
//! use stoplight::config::MachineConfig;
//! use stoplight::core::LightState;
//! use stoplight::environment::Environment;
//! use stoplight::machine::TrafficLight;
//! use stoplight::monitor::ControllableMonitor;
//! use std::sync::Arc;
//!
//! let clock = Arc::new(SimulatedClock::new());
//! let env = Environment::new(clock.clone(), Arc::new(ControllableMonitor::new()));
//! let light = TrafficLight::start(&env, MachineConfig::default()).unwrap();
//!
//! assert_eq!(light.snapshot().light_state, LightState::Green);
//! clock.advance_ms(2000);
//! assert_eq!(light.snapshot().light_state, LightState::Yellow);
//! ```

mod error;
mod snapshot;

pub use error::MachineError;
pub use snapshot::Snapshot;

use crate::builder::TrafficLightBuilder;
use crate::clock::{Clock, TimerHandle};
use crate::config::MachineConfig;
use crate::core::{Direction, LightState, StateHistory, StateTransition, TransitionTable};
use crate::environment::{Environment, MonitorRegistry};
use crate::monitor::{
    ConnectivityEvent, ConnectivityMonitor, EventSink, MonitorError, MonitorSignal, Subscription,
};
use crate::sync::lock;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;
use uuid::Uuid;

/// A running traffic light.
///
/// Created and started together by [`TrafficLight::start`]; there is no
/// armed-but-idle state. Runs until [`stop`](Self::stop) is called or the
/// value is dropped.
pub struct TrafficLight {
    core: Arc<Core>,
}

struct Core {
    id: Uuid,
    clock: Arc<dyn Clock>,
    monitors: MonitorRegistry,
    table: TransitionTable,
    projection: watch::Sender<Snapshot>,
    faults: AtomicU64,
    /// Serializes rebinds so only one new subscription is in flight.
    rebind: Mutex<()>,
    inner: Mutex<Inner>,
}

/// The monitor a machine listens to and its live subscription.
struct Binding {
    monitor: Arc<dyn ConnectivityMonitor>,
    subscription: Subscription,
}

struct Inner {
    light: LightState,
    direction: Direction,
    running: bool,
    history: StateHistory<LightState>,
    /// Generation of the pending timer. Callbacks carrying any other value are stale.
    timer_generation: u64,
    timer: Option<TimerHandle>,
    /// Epoch of the active subscription.
    subscription_epoch: u64,
    /// Epoch of a subscription being set up by a rebind. Its signals apply
    /// as soon as the monitor emits them.
    pending_epoch: Option<u64>,
    next_epoch: u64,
    binding: Option<Binding>,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.light, self.direction)
    }

    fn accepts(&self, epoch: u64) -> bool {
        self.running && (self.subscription_epoch == epoch || self.pending_epoch == Some(epoch))
    }
}

/// Outcome of applying a connectivity event to the direction flag.
#[derive(Debug, PartialEq, Eq)]
enum DirectionChange {
    Changed(Direction),
    Unchanged,
}

fn apply_event(current: Direction, event: ConnectivityEvent) -> DirectionChange {
    let next = Direction::from_reversed(event == ConnectivityEvent::Disconnected);
    if next == current {
        DirectionChange::Unchanged
    } else {
        DirectionChange::Changed(next)
    }
}

impl TrafficLight {
    /// Builder for a machine; see [`TrafficLightBuilder`].
    pub fn builder() -> TrafficLightBuilder {
        TrafficLightBuilder::new()
    }

    /// Start a machine: subscribe to the registry's current monitor, enter
    /// green with `reversed = false`, and schedule the green timer.
    ///
    /// A monitor that emits during subscribe (fixed and controllable ones do)
    /// has its signal applied before the first timer is scheduled.
    pub fn start(env: &Environment, config: MachineConfig) -> Result<Self, MachineError> {
        let config = config.validated()?;
        let (projection, _) = watch::channel(Snapshot::INITIAL);
        let core = Arc::new(Core {
            id: Uuid::new_v4(),
            clock: Arc::clone(env.clock()),
            monitors: env.monitors().clone(),
            table: config.timings.table(),
            projection,
            faults: AtomicU64::new(0),
            rebind: Mutex::new(()),
            inner: Mutex::new(Inner {
                light: LightState::Green,
                direction: Direction::Forward,
                running: true,
                history: StateHistory::with_limit(config.history_limit),
                timer_generation: 0,
                timer: None,
                subscription_epoch: 0,
                pending_epoch: None,
                next_epoch: 0,
                binding: None,
            }),
        });

        let monitor = core.monitors.get();
        info!(
            "traffic light {} starting on monitor '{}'",
            core.id,
            monitor.name()
        );
        let machine = Self { core };
        let subscription = machine.core.subscribe(monitor.as_ref(), 0)?;

        let mut inner = lock(&machine.core.inner);
        inner.binding = Some(Binding {
            monitor,
            subscription,
        });
        machine.core.schedule(&mut inner);
        drop(inner);
        Ok(machine)
    }

    pub fn id(&self) -> Uuid {
        self.core.id
    }

    /// Current light state and direction flag.
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.core.inner).snapshot()
    }

    /// Receiver that observes every published [`Snapshot`].
    pub fn watch(&self) -> watch::Receiver<Snapshot> {
        self.core.projection.subscribe()
    }

    /// Timed transitions taken so far, oldest first, bounded by the configured limit.
    pub fn history(&self) -> StateHistory<LightState> {
        lock(&self.core.inner).history.clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.core.inner).running
    }

    /// Number of monitor faults received since start.
    pub fn monitor_faults(&self) -> u64 {
        self.core.faults.load(Ordering::Relaxed)
    }

    /// Switch to the monitor currently in the registry.
    ///
    /// Subscribes to the registry's instance first and releases the current
    /// subscription only once that succeeds. On error the machine keeps
    /// listening to its current monitor. Rebinding to the instance already
    /// bound does nothing. The light state and the pending timer are not
    /// touched; the new monitor's first signal only sets the direction.
    ///
    /// Concurrent calls are applied one at a time.
    pub fn rebind_monitor(&self) -> Result<(), MachineError> {
        let _rebinding = lock(&self.core.rebind);
        let monitor = self.core.monitors.get();
        let epoch = {
            let mut inner = lock(&self.core.inner);
            if !inner.running {
                return Err(MachineError::Stopped);
            }
            let bound = inner
                .binding
                .as_ref()
                .is_some_and(|binding| Arc::ptr_eq(&binding.monitor, &monitor));
            if bound {
                debug!(
                    "traffic light {} already bound to monitor '{}'",
                    self.core.id,
                    monitor.name()
                );
                return Ok(());
            }
            inner.next_epoch += 1;
            inner.pending_epoch = Some(inner.next_epoch);
            inner.next_epoch
        };

        info!(
            "traffic light {} rebinding to monitor '{}'",
            self.core.id,
            monitor.name()
        );
        let subscription = match self.core.subscribe(monitor.as_ref(), epoch) {
            Ok(subscription) => subscription,
            Err(err) => {
                lock(&self.core.inner).pending_epoch = None;
                warn!(
                    "traffic light {} could not rebind to '{}', keeping current monitor: {err}",
                    self.core.id,
                    monitor.name()
                );
                return Err(err.into());
            }
        };

        let previous = {
            let mut inner = lock(&self.core.inner);
            inner.pending_epoch = None;
            if !inner.running {
                drop(inner);
                subscription.unsubscribe();
                return Err(MachineError::Stopped);
            }
            inner.subscription_epoch = epoch;
            inner.binding.replace(Binding {
                monitor,
                subscription,
            })
        };
        if let Some(previous) = previous {
            previous.subscription.unsubscribe();
        }
        Ok(())
    }

    /// Cancel the pending timer and release the monitor subscription.
    ///
    /// Idempotent. No timer or signal is processed once this returns.
    pub fn stop(&self) {
        let (timer, binding) = {
            let mut inner = lock(&self.core.inner);
            if !inner.running {
                return;
            }
            inner.running = false;
            (inner.timer.take(), inner.binding.take())
        };
        if let Some(timer) = timer {
            self.core.clock.cancel(timer);
        }
        if let Some(binding) = binding {
            binding.subscription.unsubscribe();
        }
        info!("traffic light {} stopped", self.core.id);
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for TrafficLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.core.inner);
        f.debug_struct("TrafficLight")
            .field("id", &self.core.id)
            .field("light", &inner.light)
            .field("direction", &inner.direction)
            .field("running", &inner.running)
            .finish()
    }
}

impl Core {
    /// Subscribe to `monitor` with signals tagged by `epoch`.
    ///
    /// Must be called without holding `inner`: monitors may emit synchronously.
    fn subscribe(
        self: &Arc<Self>,
        monitor: &dyn ConnectivityMonitor,
        epoch: u64,
    ) -> Result<Subscription, MonitorError> {
        let weak = Arc::downgrade(self);
        let sink: EventSink = Arc::new(move |signal: MonitorSignal| {
            if let Some(core) = weak.upgrade() {
                core.on_signal(epoch, signal);
            }
        });
        monitor.subscribe(sink)
    }

    /// Schedule the timer for the current light state.
    fn schedule(self: &Arc<Self>, inner: &mut Inner) {
        inner.timer_generation += 1;
        let generation = inner.timer_generation;
        let delay = self.table.delay(inner.light);
        let weak: Weak<Core> = Arc::downgrade(self);
        let handle = self.clock.schedule_after(
            delay,
            Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.on_timer(generation);
                }
            }),
        );
        inner.timer = Some(handle);
        debug!(
            "traffic light {} scheduled {} timer ({delay:?}, generation {generation})",
            self.id, inner.light
        );
    }

    fn on_timer(self: &Arc<Self>, generation: u64) {
        let mut inner = lock(&self.inner);
        if !inner.running || inner.timer_generation != generation || inner.timer.is_none() {
            debug!(
                "traffic light {} ignoring stale timer (generation {generation})",
                self.id
            );
            return;
        }
        inner.timer = None;

        let from = inner.light;
        let to = self.table.target(from, inner.direction);
        let transition = StateTransition {
            from,
            to,
            timestamp: self.clock.now(),
            reversed: inner.direction.is_reversed(),
        };
        inner.history = inner.history.record(transition);
        inner.light = to;
        debug!("traffic light {} transitioned {from} -> {to}", self.id);

        self.projection.send_replace(inner.snapshot());
        self.schedule(&mut inner);
    }

    fn on_signal(&self, epoch: u64, signal: MonitorSignal) {
        let mut inner = lock(&self.inner);
        if !inner.accepts(epoch) {
            debug!(
                "traffic light {} ignoring signal from released subscription {epoch}: {signal:?}",
                self.id
            );
            return;
        }

        match signal {
            MonitorSignal::Event(event) => match apply_event(inner.direction, event) {
                DirectionChange::Changed(direction) => {
                    inner.direction = direction;
                    info!(
                        "traffic light {} now {direction:?} after {event:?} (light {})",
                        self.id, inner.light
                    );
                    self.projection.send_replace(inner.snapshot());
                }
                DirectionChange::Unchanged => {
                    debug!(
                        "traffic light {} already {:?}; {event:?} changes nothing",
                        self.id, inner.direction
                    );
                }
            },
            MonitorSignal::Fault(reason) => {
                self.faults.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "traffic light {} monitor fault, keeping {:?}: {reason}",
                    self.id, inner.direction
                );
            }
        }
    }
}
