use crate::collector::task::CollectorTask;
use crate::scm::ScmClient;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Parse a cron expression (seconds field first, e.g. `0 0/5 * * * *`).
///
/// # Errors
/// Errors if the expression is not valid cron syntax.
pub fn parse(expression: &str) -> anyhow::Result<Schedule> {
    Schedule::from_str(expression)
        .map_err(|err| anyhow::anyhow!("invalid cron expression `{expression}`: {err}"))
}

/// First fire time of `schedule` strictly after `after`.
#[must_use]
pub fn next_fire(schedule: &Schedule, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(after).next()
}

/// Run a cycle of `task` at every fire time of `expression`, forever.
///
/// A failed cycle is logged and the next fire time is awaited as usual. Cycles never overlap:
/// the next fire time is computed once the previous cycle is over.
///
/// # Errors
/// Errors if the expression is invalid or the schedule has no further fire time.
pub async fn run_scheduled<S: ScmClient>(
    task: &CollectorTask<S>,
    expression: &str,
) -> anyhow::Result<()> {
    let schedule = parse(expression)?;
    tracing::info!("Scheduling cycles with `{expression}`");
    loop {
        let now = Utc::now();
        let Some(next) = next_fire(&schedule, &now) else {
            anyhow::bail!("cron expression `{expression}` has no upcoming fire time");
        };
        tracing::debug!(next = %next, "Waiting for next cycle");
        async_std::task::sleep((next - now).to_std().unwrap_or_default()).await;
        if let Err(err) = task.run().await {
            tracing::error!("Collection cycle failed");
            tracing::error!("{:?}", err);
        }
    }
}
