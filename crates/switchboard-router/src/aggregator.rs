use std::sync::atomic::{AtomicU64, Ordering};

use switchboard_core::content::ContentBlock;
use switchboard_core::events::SessionNotification;
use switchboard_core::progress::{ExecutionStats, ProgressStep, StepKind, StepStatus};

/// Step descriptions are clipped to this many characters.
pub const DESCRIPTION_LIMIT: usize = 200;

/// Title shared by every step derived from streamed text.
pub(crate) const THINKING_TITLE: &str = "Thinking";

/// Title for the step synthesized from a stats-only notification.
pub(crate) const TOOL_COMPLETED_TITLE: &str = "Tool completed";

/// Per-request step id source. Ids start at 1 and stay unique within the
/// request even when folds interleave across await points.
#[derive(Debug)]
pub struct StepIdGen {
    next: AtomicU64,
}

impl StepIdGen {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for StepIdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of folding one notification: the new accumulated text and the
/// steps the notification produced, in arrival order.
#[derive(Debug)]
pub struct FoldOutcome {
    pub accumulated: String,
    pub steps: Vec<ProgressStep>,
}

/// Fold one session notification into the request's progress stream.
///
/// Text blocks append to the accumulated transcript and each yields a
/// thinking step whose snapshot is the full text so far. Tool-use blocks
/// yield in-progress tool steps, enriched with execution stats when the
/// notification carries them. A notification with stats and no content
/// marks a tool completion. Anything else becomes a heartbeat so the UI
/// always sees the current streamed text.
pub fn fold_notification(
    prior_accumulated: &str,
    notification: &SessionNotification,
    ids: &StepIdGen,
) -> FoldOutcome {
    let mut accumulated = prior_accumulated.to_string();
    let mut steps = Vec::new();
    let text_status = if notification.is_complete() {
        StepStatus::Completed
    } else {
        StepStatus::InProgress
    };

    for block in notification.blocks() {
        match block {
            ContentBlock::Text { text } => {
                accumulated.push_str(text);
                steps.push(
                    ProgressStep::new(ids.next_id(), StepKind::Thinking, THINKING_TITLE, text_status)
                        .with_description(clip_description(text))
                        .with_snapshot(accumulated.clone()),
                );
            }
            ContentBlock::ToolUse { name } => {
                let mut step = ProgressStep::new(
                    ids.next_id(),
                    StepKind::ToolCall,
                    name.clone(),
                    StepStatus::InProgress,
                );
                if let Some(stats) = &notification.tool_response_stats {
                    step = step.with_stats(ExecutionStats::from(stats));
                    if let Some(subagent) = &stats.subagent_id {
                        step = step.with_subagent(subagent.clone());
                    }
                }
                steps.push(step);
            }
        }
    }

    // Tool results arrive as stats with no content blocks.
    if steps.is_empty() {
        if let Some(stats) = &notification.tool_response_stats {
            let mut step = ProgressStep::new(
                ids.next_id(),
                StepKind::ToolCall,
                TOOL_COMPLETED_TITLE,
                StepStatus::Completed,
            )
            .with_stats(ExecutionStats::from(stats));
            if let Some(subagent) = &stats.subagent_id {
                step = step.with_subagent(subagent.clone());
            }
            steps.push(step);
        }
    }

    if steps.is_empty() {
        steps.push(
            ProgressStep::new(
                ids.next_id(),
                StepKind::Thinking,
                THINKING_TITLE,
                StepStatus::InProgress,
            )
            .with_snapshot(accumulated.clone()),
        );
    }

    FoldOutcome { accumulated, steps }
}

/// First `DESCRIPTION_LIMIT` characters, with an ellipsis when clipped.
fn clip_description(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(DESCRIPTION_LIMIT).collect();
    clipped.push('…');
    clipped
}
