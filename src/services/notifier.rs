//! Rest completion notification sink

use tracing::info;

use crate::state::TimerContext;

/// Something that tells the user their rest is over.
///
/// Called once per completed timer, on a blocking thread. Errors are logged
/// by the caller and never affect timer state.
pub trait NotificationSink: Send + Sync {
    fn notify_rest_complete(&self, context: Option<&TimerContext>) -> anyhow::Result<()>;
}

/// Sink that only writes the completion to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify_rest_complete(&self, context: Option<&TimerContext>) -> anyhow::Result<()> {
        info!("{}", completion_message(context));
        Ok(())
    }
}

/// Human-readable completion text, naming the movement and workout if known
pub fn completion_message(context: Option<&TimerContext>) -> String {
    let context = match context {
        Some(context) if !context.is_empty() => context,
        _ => return "Rest complete. Time for your next set!".to_string(),
    };

    let mut message = String::from("Rest complete");
    if let Some(movement) = &context.movement_id {
        message.push_str(&format!(" for {}", movement));
    }
    if let Some(workout) = &context.workout_id {
        message.push_str(&format!(" ({})", workout));
    }
    message.push_str(". Time for your next set!");
    message
}
