use std::sync::Arc;
use tagwatch_core::domain::{Event, RepoRef, RepoStatus, Ticket};
use tagwatch_core::ports::Clock;
use tagwatch_core::StatusResolver;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Runs resolutions off the control loop.
///
/// Each resolution is a blocking task that owns nothing but its inputs and
/// reports back through the event channel; the control loop is the only
/// writer of dashboard state.
#[derive(Clone)]
pub struct RefreshService {
    resolver: Arc<StatusResolver>,
    clock: Arc<dyn Clock>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl RefreshService {
    pub fn new(
        resolver: Arc<StatusResolver>,
        clock: Arc<dyn Clock>,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            resolver,
            clock,
            event_tx,
        }
    }

    /// Spawn one background resolution; must be called inside a tokio runtime
    pub fn spawn(&self, ticket: Ticket, target: RepoRef) {
        let resolver = self.resolver.clone();
        let clock = self.clock.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let target_for_task = target.clone();
            let result =
                tokio::task::spawn_blocking(move || resolver.resolve(&target_for_task)).await;

            let status = match result {
                Ok(status) => status,
                Err(e) => {
                    error!("Resolution task for {} failed: {}", target, e);
                    RepoStatus::failed(target, "", "resolution task failed", clock.now())
                }
            };

            debug!("Resolution {} finished: {}", ticket, status.state);
            if event_tx.send(Event::StatusResolved { ticket, status }).is_err() {
                debug!("Event receiver dropped, discarding result {}", ticket);
            }
        });
    }
}
