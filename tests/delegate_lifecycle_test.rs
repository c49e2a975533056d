/*!
 * Integration tests for the application lifecycle protocol
 *
 * These tests drive a ResourceDelegate over the scripted in-memory resource
 * manager to verify:
 * - Id allocation through independent submission sessions
 * - Exactly-once submission, including on failure
 * - Coordinator polling in virtual time (pauses, cancellation, deadlines)
 * - Error mapping (precondition, submission, transport)
 */

use rmbridge::{
    config::BridgeConfig,
    error::{BridgeError, ErrorCategory, EXIT_FATAL},
    JobState, PollPolicy, ResourceDelegate,
};
use rmbridge_interface::testing::{Operation, ScriptedResourceManager, SCRIPTED_CLUSTER_TIMESTAMP};
use rmbridge_interface::{
    ApplicationId, ApplicationState, ApplicationSubmissionContext, ProtocolError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn delegate_over(rm: &ScriptedResourceManager) -> ResourceDelegate {
    ResourceDelegate::with_protocol(Arc::new(rm.clone()), &BridgeConfig::default())
}

fn context(name: &str) -> ApplicationSubmissionContext {
    let mut context = ApplicationSubmissionContext::new(name);
    context.user = "alice".to_string();
    context.commands = vec!["$JAVA_HOME/bin/java -Xmx512m AppMaster".to_string()];
    context
}

#[tokio::test]
async fn test_sessions_keep_distinct_ids() -> anyhow::Result<()> {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let first = delegate.new_job_id().await?;
    let second = delegate.new_job_id().await?;
    assert_ne!(first.application_id(), second.application_id());
    assert_eq!(rm.calls(Operation::GetNewApplicationId), 2);

    // Submitting the second does not disturb the first
    let second_id = delegate
        .submit_application(second, context("second"))
        .await?;
    let first_id = delegate.submit_application(first, context("first")).await?;

    let submitted = rm.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].application_id, Some(second_id));
    assert_eq!(submitted[1].application_id, Some(first_id));
    assert_eq!(submitted[1].application_name, "first");
    Ok(())
}

#[tokio::test]
async fn test_job_id_matches_allocated_application_id() -> anyhow::Result<()> {
    let rm = ScriptedResourceManager::new();
    let session = delegate_over(&rm).new_job_id().await?;

    let job_id = session.job_id();
    assert_eq!(job_id.tracker_identifier, SCRIPTED_CLUSTER_TIMESTAMP);
    assert_eq!(job_id.id, session.application_id().id);
    Ok(())
}

#[tokio::test]
async fn test_context_with_own_id_is_precondition_error() {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let session = delegate.new_job_id().await.unwrap();
    let mut context = context("sneaky");
    context.application_id = Some(ApplicationId::new(42, 42));

    let result = delegate.submit_application(session, context).await;

    match result {
        Err(err @ BridgeError::Precondition(_)) => {
            assert_eq!(err.category(), ErrorCategory::Validation);
            assert_eq!(err.exit_code(), EXIT_FATAL);
        }
        other => panic!("expected Precondition, got {:?}", other),
    }
    assert_eq!(rm.calls(Operation::SubmitApplication), 0);
}

#[tokio::test]
async fn test_failed_submission_is_issued_once() {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);
    rm.fail_next(
        Operation::SubmitApplication,
        ProtocolError::Transport("connection reset by peer".to_string()),
    );

    let session = delegate.new_job_id().await.unwrap();
    let result = delegate.submit_application(session, context("etl")).await;

    assert!(matches!(result, Err(BridgeError::Transport(_))));
    assert_eq!(rm.calls(Operation::SubmitApplication), 1);
    assert!(rm.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_new_new_running_takes_three_queries_and_two_pauses() -> anyhow::Result<()> {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let session = delegate.new_job_id().await?;
    let app_id = delegate.submit_application(session, context("wordcount")).await?;
    rm.script_master_states(
        app_id,
        [
            ApplicationState::New,
            ApplicationState::New,
            ApplicationState::Running,
        ],
    );

    let started = Instant::now();
    let master = delegate
        .get_application_master(&app_id, &CancellationToken::new())
        .await?;

    assert_eq!(master.state, ApplicationState::Running);
    assert_eq!(master.application_id, app_id);
    assert_eq!(rm.calls(Operation::GetApplicationMaster), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(4));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_immediate_failure_takes_one_query() -> anyhow::Result<()> {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let session = delegate.new_job_id().await?;
    let app_id = delegate.submit_application(session, context("doomed")).await?;
    rm.script_master_states(app_id, [ApplicationState::Failed]);

    let started = Instant::now();
    let master = delegate
        .get_application_master(&app_id, &CancellationToken::new())
        .await?;

    assert_eq!(master.state, ApplicationState::Failed);
    assert_eq!(rmbridge::convert::job_state(master.state), JobState::Failed);
    assert_eq!(rm.calls(Operation::GetApplicationMaster), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_configured_interval_is_used() -> anyhow::Result<()> {
    let rm = ScriptedResourceManager::new();
    let mut config = BridgeConfig::default();
    config.poll.interval_ms = 250;
    let delegate = ResourceDelegate::with_protocol(Arc::new(rm.clone()), &config);

    let session = delegate.new_job_id().await?;
    let app_id = delegate.submit_application(session, context("quick")).await?;
    rm.script_master_states(
        app_id,
        [
            ApplicationState::Launched,
            ApplicationState::Launched,
            ApplicationState::Launched,
            ApplicationState::Completed,
        ],
    );

    let started = Instant::now();
    delegate
        .get_application_master(&app_id, &CancellationToken::new())
        .await?;

    assert_eq!(started.elapsed(), Duration::from_millis(750));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_ends_the_wait() {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let session = delegate.new_job_id().await.unwrap();
    let app_id = delegate
        .submit_application(session, context("stuck"))
        .await
        .unwrap();
    rm.script_master_states(app_id, [ApplicationState::Initializing]);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let result = delegate.get_application_master(&app_id, &cancel).await;

    assert!(matches!(result, Err(BridgeError::Cancelled { .. })));
    // Queries at t=0, 2 and 4; cancelled during the third pause
    assert_eq!(rm.calls(Operation::GetApplicationMaster), 3);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_ends_the_wait() {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm)
        .with_poll_policy(PollPolicy::default().with_deadline(Duration::from_secs(10)));

    let session = delegate.new_job_id().await.unwrap();
    let app_id = delegate
        .submit_application(session, context("slow"))
        .await
        .unwrap();
    rm.script_master_states(app_id, [ApplicationState::New]);

    let result = delegate
        .get_application_master(&app_id, &CancellationToken::new())
        .await;

    match result {
        Err(BridgeError::DeadlineExceeded {
            application_id,
            waited,
        }) => {
            assert_eq!(application_id, app_id);
            assert_eq!(waited, Duration::from_secs(10));
        }
        other => panic!("expected DeadlineExceeded, got {:?}", other),
    }
    // t=0, 2, 4, 6, 8
    assert_eq!(rm.calls(Operation::GetApplicationMaster), 5);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_while_polling_propagates() {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let session = delegate.new_job_id().await.unwrap();
    let app_id = delegate
        .submit_application(session, context("flaky"))
        .await
        .unwrap();
    rm.fail_next(
        Operation::GetApplicationMaster,
        ProtocolError::Transport("deadline exceeded".to_string()),
    );

    let result = delegate
        .get_application_master(&app_id, &CancellationToken::new())
        .await;

    let err = result.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(rm.calls(Operation::GetApplicationMaster), 1);
}

#[tokio::test]
async fn test_polling_unknown_application_is_remote_error() {
    let rm = ScriptedResourceManager::new();
    let delegate = delegate_over(&rm);

    let result = delegate
        .get_application_master(&ApplicationId::new(1, 999), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(BridgeError::Remote(_))));
}
