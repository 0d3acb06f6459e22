//! Live connectivity monitor backed by a polling probe.

use super::{
    ConnectivityMonitor, EventSink, MonitorError, MonitorSignal, Reachability, SubscriberSlot,
    Subscription,
};
use crate::config::{ConfigViolation, LiveMonitorConfig};
use log::{debug, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const NAME: &str = "live";

/// Errors a probe can report instead of a status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("No probe targets configured")]
    NoTargets,

    #[error("Probe failed: {0}")]
    Probe(String),
}

/// Boxed future returned by [`ReachabilityProbe::probe`].
pub type BoxProbeFuture = Pin<Box<dyn Future<Output = Result<Reachability, ProbeError>> + Send>>;

/// One reachability measurement.
///
/// Each call returns a fresh future that the monitor's polling task awaits.
/// Any `Fn() -> Future` closure is a probe.
pub trait ReachabilityProbe: Send + Sync + 'static {
    fn probe(&self) -> BoxProbeFuture;
}

impl<F, Fut> ReachabilityProbe for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reachability, ProbeError>> + Send + 'static,
{
    fn probe(&self) -> BoxProbeFuture {
        Box::pin(self())
    }
}

/// Probe that treats any successful TCP connect as "satisfied".
#[derive(Clone, Debug)]
pub struct TcpProbe {
    targets: Arc<[SocketAddr]>,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(targets: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self {
            targets: targets.into(),
            timeout,
        }
    }

    pub fn from_config(config: &LiveMonitorConfig) -> Self {
        Self::new(config.targets.clone(), config.connect_timeout())
    }
}

impl ReachabilityProbe for TcpProbe {
    fn probe(&self) -> BoxProbeFuture {
        let targets = Arc::clone(&self.targets);
        let timeout = self.timeout;
        Box::pin(async move {
            if targets.is_empty() {
                return Err(ProbeError::NoTargets);
            }
            for target in targets.iter() {
                match time::timeout(timeout, TcpStream::connect(*target)).await {
                    Ok(Ok(_)) => return Ok(Reachability::Satisfied),
                    Ok(Err(err)) => debug!("connectivity probe to {target} failed: {err}"),
                    Err(_) => debug!("connectivity probe to {target} timed out after {timeout:?}"),
                }
            }
            Ok(Reachability::Unsatisfied)
        })
    }
}

/// Monitor that polls a [`ReachabilityProbe`] from a tokio task.
///
/// On subscribe it probes immediately and emits the result, then emits again
/// only when the status changes. A failing probe emits one
/// [`MonitorSignal::Fault`] and stays quiet until a probe succeeds again.
/// Unsubscribing cancels the task, including an in-flight probe; the caller
/// never waits on it.
pub struct LiveMonitor<P: ReachabilityProbe = TcpProbe> {
    probe: Arc<P>,
    poll_interval: Duration,
    runtime: Handle,
    slot: Arc<SubscriberSlot>,
}

impl LiveMonitor<TcpProbe> {
    /// TCP-probing monitor on the current runtime, rejecting unusable settings.
    pub fn from_config(config: &LiveMonitorConfig) -> Result<Self, MonitorError> {
        let violations = config.violations();
        if !violations.is_empty() {
            return Err(invalid(violations));
        }
        Self::new(TcpProbe::from_config(config), config.poll_interval())
    }
}

impl<P: ReachabilityProbe> LiveMonitor<P> {
    /// Monitor whose polling task runs on the current tokio runtime.
    pub fn new(probe: P, poll_interval: Duration) -> Result<Self, MonitorError> {
        let runtime = Handle::try_current().map_err(|_| MonitorError::NoRuntime {
            monitor: NAME.to_string(),
        })?;
        Self::with_handle(probe, poll_interval, runtime)
    }

    pub fn with_handle(
        probe: P,
        poll_interval: Duration,
        runtime: Handle,
    ) -> Result<Self, MonitorError> {
        if poll_interval.is_zero() {
            return Err(invalid(vec![ConfigViolation::ZeroPollInterval]));
        }
        Ok(Self {
            probe: Arc::new(probe),
            poll_interval,
            runtime,
            slot: Arc::new(SubscriberSlot::new(NAME)),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

fn invalid(violations: Vec<ConfigViolation>) -> MonitorError {
    MonitorError::InvalidSettings {
        monitor: NAME.to_string(),
        violations,
    }
}

impl<P: ReachabilityProbe> ConnectivityMonitor for LiveMonitor<P> {
    fn name(&self) -> &str {
        NAME
    }

    fn subscribe(&self, sink: EventSink) -> Result<Subscription, MonitorError> {
        let ticket = self.slot.attach(sink)?;
        let token = CancellationToken::new();
        self.runtime.spawn(poll(
            Arc::clone(&self.probe),
            Arc::clone(&self.slot),
            ticket,
            self.poll_interval,
            token.clone(),
        ));

        let slot = Arc::clone(&self.slot);
        Ok(Subscription::new(move || {
            token.cancel();
            slot.detach(ticket);
        }))
    }
}

async fn poll<P: ReachabilityProbe>(
    probe: Arc<P>,
    slot: Arc<SubscriberSlot>,
    ticket: u64,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<Reachability> = None;
    let mut faulted = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = token.cancelled() => break,
        }
        let result = tokio::select! {
            result = probe.probe() => result,
            _ = token.cancelled() => break,
        };

        let delivered = match result {
            Ok(status) => {
                faulted = false;
                if last == Some(status) {
                    true
                } else {
                    last = Some(status);
                    slot.emit_for(ticket, MonitorSignal::from(status))
                }
            }
            Err(err) if !faulted => {
                faulted = true;
                warn!("live connectivity probe failed: {err}");
                slot.emit_for(ticket, MonitorSignal::Fault(err.to_string()))
            }
            Err(_) => true,
        };
        if !delivered {
            break;
        }
    }
    debug!("live connectivity polling stopped (subscription {ticket})");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::ConnectivityEvent;
    use std::collections::VecDeque;
    use std::future::{ready, Ready};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Probe that replays a script and then repeats its last entry.
    fn scripted(
        script: Vec<Result<Reachability, ProbeError>>,
    ) -> impl Fn() -> Ready<Result<Reachability, ProbeError>> + Send + Sync + 'static {
        let script = Mutex::new(VecDeque::from(script));
        move || {
            let mut script = script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            };
            ready(next)
        }
    }

    fn channel_sink() -> (EventSink, mpsc::UnboundedReceiver<MonitorSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: EventSink = Arc::new(move |signal: MonitorSignal| {
            let _ = tx.send(signal);
        });
        (sink, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn emits_initial_status_then_changes_only() {
        let monitor = LiveMonitor::new(
            scripted(vec![
                Ok(Reachability::Satisfied),
                Ok(Reachability::Satisfied),
                Ok(Reachability::Unsatisfied),
                Err(ProbeError::Probe("socket error".to_string())),
                Err(ProbeError::Probe("socket error".to_string())),
                Ok(Reachability::Unsatisfied),
                Ok(Reachability::Satisfied),
            ]),
            Duration::from_millis(100),
        )
        .unwrap();
        let (sink, mut rx) = channel_sink();
        let subscription = monitor.subscribe(sink).unwrap();

        assert_eq!(
            rx.recv().await,
            Some(MonitorSignal::Event(ConnectivityEvent::Connected))
        );
        assert_eq!(
            rx.recv().await,
            Some(MonitorSignal::Event(ConnectivityEvent::Disconnected))
        );
        assert_eq!(
            rx.recv().await,
            Some(MonitorSignal::Fault("Probe failed: socket error".to_string()))
        );
        assert_eq!(
            rx.recv().await,
            Some(MonitorSignal::Event(ConnectivityEvent::Connected))
        );

        // Releasing drops the sink, which closes the channel.
        subscription.unsubscribe();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn first_status_arrives_without_waiting_an_interval() {
        let monitor = LiveMonitor::new(
            scripted(vec![Ok(Reachability::Unsatisfied)]),
            Duration::from_secs(60),
        )
        .unwrap();
        let (sink, mut rx) = channel_sink();
        let _subscription = monitor.subscribe(sink).unwrap();
        let started = time::Instant::now();

        assert_eq!(
            rx.recv().await,
            Some(MonitorSignal::Event(ConnectivityEvent::Disconnected))
        );
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let monitor = LiveMonitor::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                ready(Ok::<_, ProbeError>(Reachability::Satisfied))
            },
            Duration::from_millis(100),
        )
        .unwrap();
        let (sink, mut rx) = channel_sink();
        let subscription = monitor.subscribe(sink).unwrap();
        assert!(rx.recv().await.is_some());
        time::sleep(Duration::from_millis(350)).await;

        subscription.unsubscribe();
        // Let the task observe cancellation before sampling the count.
        tokio::task::yield_now().await;
        let polled = calls.load(Ordering::SeqCst);
        assert!(polled >= 4);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), polled);
    }

    #[tokio::test(start_paused = true)]
    async fn single_subscriber_until_released() {
        let monitor = LiveMonitor::new(
            scripted(vec![Ok(Reachability::Satisfied)]),
            Duration::from_millis(10),
        )
        .unwrap();
        let (sink, _rx) = channel_sink();
        let first = monitor.subscribe(sink.clone()).unwrap();

        assert!(matches!(
            monitor.subscribe(sink.clone()),
            Err(MonitorError::AlreadySubscribed { .. })
        ));

        first.unsubscribe();
        let (sink, mut rx) = channel_sink();
        let _second = monitor.subscribe(sink).unwrap();
        assert_eq!(
            rx.recv().await,
            Some(MonitorSignal::Event(ConnectivityEvent::Connected))
        );
    }

    #[tokio::test]
    async fn zero_poll_interval_is_rejected() {
        let result = LiveMonitor::new(scripted(vec![Ok(Reachability::Satisfied)]), Duration::ZERO);
        assert!(matches!(
            result,
            Err(MonitorError::InvalidSettings { ref violations, .. })
                if violations == &vec![ConfigViolation::ZeroPollInterval]
        ));
    }

    #[tokio::test]
    async fn from_config_reports_every_violation() {
        let config = LiveMonitorConfig {
            targets: Vec::new(),
            connect_timeout_ms: 1500,
            poll_interval_ms: 0,
        };
        match LiveMonitor::from_config(&config) {
            Err(MonitorError::InvalidSettings { violations, .. }) => assert_eq!(
                violations,
                vec![
                    ConfigViolation::NoProbeTargets,
                    ConfigViolation::ZeroPollInterval
                ]
            ),
            Err(other) => panic!("Expected invalid settings, got {other:?}"),
            Ok(_) => panic!("Expected invalid settings, got a monitor"),
        }
    }

    #[tokio::test]
    async fn from_config_accepts_defaults() {
        let monitor = LiveMonitor::from_config(&LiveMonitorConfig::default()).unwrap();
        assert_eq!(monitor.poll_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn new_outside_runtime_is_rejected() {
        let result = LiveMonitor::new(
            scripted(vec![Ok(Reachability::Satisfied)]),
            Duration::from_millis(100),
        );
        assert!(matches!(result, Err(MonitorError::NoRuntime { .. })));
    }

    #[test]
    fn with_handle_polls_on_the_given_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let monitor = LiveMonitor::with_handle(
            scripted(vec![Ok(Reachability::Unsatisfied)]),
            Duration::from_millis(100),
            runtime.handle().clone(),
        )
        .unwrap();
        let (sink, mut rx) = channel_sink();
        let _subscription = monitor.subscribe(sink).unwrap();

        let first = runtime.block_on(rx.recv());
        assert_eq!(
            first,
            Some(MonitorSignal::Event(ConnectivityEvent::Disconnected))
        );
    }

    #[tokio::test]
    async fn tcp_probe_reports_listening_target_as_satisfied() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let probe = TcpProbe::new(
            vec![listener.local_addr().unwrap()],
            Duration::from_millis(500),
        );
        assert_eq!(probe.probe().await, Ok(Reachability::Satisfied));
    }

    #[tokio::test]
    async fn tcp_probe_reports_closed_target_as_unsatisfied() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let probe = TcpProbe::new(vec![addr], Duration::from_millis(500));
        assert_eq!(probe.probe().await, Ok(Reachability::Unsatisfied));
    }

    #[tokio::test]
    async fn tcp_probe_without_targets_is_an_error() {
        let probe = TcpProbe::new(Vec::new(), Duration::from_millis(500));
        assert_eq!(probe.probe().await, Err(ProbeError::NoTargets));
    }
}
