//! Run status polling.

use tracing::{debug, warn};

use super::{CompletionSettings, ExecStatus};
use crate::api::RunsApi;
use crate::transport::RequestOptions;
use crate::types::RunStatus;

/// Map a run status to its pipeline result, or `None` while the run is live.
pub fn exec_status(status: &RunStatus) -> Option<ExecStatus> {
    match status {
        RunStatus::Queued | RunStatus::InProgress => None,
        RunStatus::Completed => Some(ExecStatus::Success),
        RunStatus::Expired => Some(ExecStatus::Expired),
        RunStatus::Cancelled => Some(ExecStatus::Cancelled),
        RunStatus::Failed => Some(ExecStatus::Failed),
        RunStatus::Other(_) => Some(ExecStatus::Other),
    }
}

/// Poll a run until it reaches a terminal status.
///
/// Sleeps `poll_interval` between attempts. Without `max_poll_attempts`
/// this never gives up on a live run. A failed status check ends polling
/// with [`ExecStatus::Failed`]; hitting the attempt cap ends it with
/// [`ExecStatus::Error`].
pub(crate) async fn wait_for_run(
    runs: &RunsApi,
    session_id: &str,
    run_id: &str,
    settings: &CompletionSettings,
    options: &RequestOptions,
) -> ExecStatus {
    let mut attempts: u32 = 0;

    loop {
        attempts = next_attempt(attempts);

        let run = match runs.get(session_id, run_id, options).await {
            Ok(envelope) if envelope.is_success() => envelope.data.and_then(|d| d.run),
            Ok(envelope) => {
                warn!(
                    run_id = %run_id,
                    code = envelope.code,
                    msg = %envelope.msg,
                    "Run status check returned an error"
                );
                return ExecStatus::Failed;
            }
            Err(_) => return ExecStatus::Failed,
        };

        let Some(run) = run else {
            warn!(run_id = %run_id, "Run status check returned no run");
            return ExecStatus::Failed;
        };

        if let Some(result) = exec_status(&run.status) {
            debug!(run_id = %run_id, status = %run.status, attempts, "Run finished");
            return result;
        }

        if let Some(max) = settings.max_poll_attempts {
            if attempts >= max {
                warn!(
                    run_id = %run_id,
                    status = %run.status,
                    attempts,
                    "Run still not finished, giving up"
                );
                return ExecStatus::Error;
            }
        }

        debug!(run_id = %run_id, status = %run.status, attempts, "Run in progress");
        tokio::time::sleep(settings.poll_interval).await;
    }
}

/// Saturating attempt counter step.
fn next_attempt(attempts: u32) -> u32 {
    attempts.saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_statuses_keep_polling() {
        assert_eq!(exec_status(&RunStatus::Queued), None);
        assert_eq!(exec_status(&RunStatus::InProgress), None);
    }

    #[test]
    fn test_terminal_mapping() {
        assert_eq!(exec_status(&RunStatus::Completed), Some(ExecStatus::Success));
        assert_eq!(exec_status(&RunStatus::Expired), Some(ExecStatus::Expired));
        assert_eq!(exec_status(&RunStatus::Cancelled), Some(ExecStatus::Cancelled));
        assert_eq!(exec_status(&RunStatus::Failed), Some(ExecStatus::Failed));
        assert_eq!(
            exec_status(&RunStatus::Other("REQUIRES_ACTION".into())),
            Some(ExecStatus::Other)
        );
    }

    #[test]
    fn test_attempt_counter_saturates() {
        assert_eq!(next_attempt(0), 1);
        assert_eq!(next_attempt(u32::MAX), u32::MAX);
    }
}
