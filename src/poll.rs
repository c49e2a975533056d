/*!
 * Coordinator readiness polling
 */

use rmbridge_interface::{ApplicationId, ApplicationMaster, ResourceManagerProtocol};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};

/// Pause between two coordinator queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long and how often to ask for the coordinator's state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,

    /// Upper bound on total waiting time (None = unbounded)
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
        }
    }
}

impl PollPolicy {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Query the coordinator until it is running or will never run
///
/// One query per cycle, and no pause after a ready answer. Query errors end
/// the wait immediately; only not-ready states are retried.
///
/// # Errors
///
/// - `BridgeError::Cancelled` if `cancel` fires before or during a pause
/// - `BridgeError::DeadlineExceeded` once `policy.deadline` has elapsed
/// - whatever the failing query maps to otherwise
pub async fn wait_until_ready<R>(
    rm: &R,
    application_id: &ApplicationId,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<ApplicationMaster>
where
    R: ResourceManagerProtocol + ?Sized,
{
    let started = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled {
                application_id: *application_id,
            });
        }

        let master = rm.get_application_master(application_id).await?;
        debug!("Application master of {} is {}", application_id, master.state);

        if master.state.is_ready() {
            return Ok(master);
        }

        let pause = match policy.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    return Err(deadline_exceeded(application_id, started));
                }
                policy.interval.min(remaining)
            }
            None => policy.interval,
        };

        info!("Waiting for application master to start");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(BridgeError::Cancelled {
                    application_id: *application_id,
                });
            }
            _ = tokio::time::sleep(pause) => {}
        }

        if let Some(deadline) = policy.deadline {
            if started.elapsed() >= deadline {
                return Err(deadline_exceeded(application_id, started));
            }
        }
    }
}

fn deadline_exceeded(application_id: &ApplicationId, started: Instant) -> BridgeError {
    BridgeError::DeadlineExceeded {
        application_id: *application_id,
        waited: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmbridge_interface::testing::{Operation, ScriptedResourceManager};
    use rmbridge_interface::{ApplicationState, ProtocolError};

    async fn scripted(states: Vec<ApplicationState>) -> (ScriptedResourceManager, ApplicationId) {
        let rm = ScriptedResourceManager::new();
        let app_id = rm.get_new_application_id().await.unwrap();
        rm.script_master_states(app_id, states);
        (rm, app_id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_running() {
        let (rm, app_id) = scripted(vec![
            ApplicationState::New,
            ApplicationState::New,
            ApplicationState::Running,
        ])
        .await;
        let started = Instant::now();

        let master = wait_until_ready(&rm, &app_id, &PollPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(master.state, ApplicationState::Running);
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 3);
        // Two pauses of the default interval
        assert_eq!(started.elapsed(), 2 * DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_state_returns_without_pause() {
        let (rm, app_id) = scripted(vec![ApplicationState::Failed]).await;
        let started = Instant::now();

        let master = wait_until_ready(&rm, &app_id, &PollPolicy::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(master.state, ApplicationState::Failed);
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_ready_state_stops_polling() {
        for state in [
            ApplicationState::Running,
            ApplicationState::Killed,
            ApplicationState::Failed,
            ApplicationState::Completed,
        ] {
            let (rm, app_id) = scripted(vec![ApplicationState::Launched, state]).await;
            let master =
                wait_until_ready(&rm, &app_id, &PollPolicy::default(), &CancellationToken::new())
                    .await
                    .unwrap();
            assert_eq!(master.state, state);
            assert_eq!(rm.calls(Operation::GetApplicationMaster), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pause() {
        let (rm, app_id) = scripted(vec![ApplicationState::New]).await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let result = wait_until_ready(&rm, &app_id, &PollPolicy::default(), &cancel).await;

        assert!(matches!(result, Err(BridgeError::Cancelled { application_id }) if application_id == app_id));
        // Queried at t=0 and t=2, cancelled during the second pause
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_issues_no_query() {
        let (rm, app_id) = scripted(vec![ApplicationState::New]).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = wait_until_ready(&rm, &app_id, &PollPolicy::default(), &cancel).await;

        assert!(matches!(result, Err(BridgeError::Cancelled { .. })));
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let (rm, app_id) = scripted(vec![ApplicationState::Initializing]).await;
        let policy = PollPolicy::default().with_deadline(Duration::from_secs(3));

        let result = wait_until_ready(&rm, &app_id, &policy, &CancellationToken::new()).await;

        match result {
            Err(BridgeError::DeadlineExceeded { waited, .. }) => {
                assert_eq!(waited, Duration::from_secs(3));
            }
            other => panic!("expected DeadlineExceeded, got {:?}", other),
        }
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_not_retried() {
        let (rm, app_id) = scripted(vec![ApplicationState::New]).await;
        rm.fail_next(
            Operation::GetApplicationMaster,
            ProtocolError::Transport("connection reset".to_string()),
        );
        let started = Instant::now();

        let result =
            wait_until_ready(&rm, &app_id, &PollPolicy::default(), &CancellationToken::new()).await;

        assert!(matches!(result, Err(BridgeError::Transport(_))));
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_after_not_ready_answers() {
        let (rm, app_id) = scripted(vec![ApplicationState::New]).await;
        let cancel = CancellationToken::new();

        let handle = {
            let rm = rm.clone();
            tokio::spawn(async move {
                wait_until_ready(&rm, &app_id, &PollPolicy::default(), &cancel).await
            })
        };

        // Let the first query and part of the first pause happen
        tokio::time::sleep(Duration::from_secs(1)).await;
        rm.fail_next(
            Operation::GetApplicationMaster,
            ProtocolError::Transport("broken pipe".to_string()),
        );

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(BridgeError::Transport(_))));
        assert_eq!(rm.calls(Operation::GetApplicationMaster), 2);
    }
}
