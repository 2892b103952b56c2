use crate::models::{ProgressStatus, ProgressSummary, TaskRecord, TaskStatus, UploadBatch};
use std::collections::{HashMap, HashSet};

/// Derive the progress of an upload batch from a task list snapshot.
///
/// A file counts once, under the state of its most recent terminal record in
/// snapshot order, so a failed attempt followed by a successful retry counts
/// as completed only. Records for other files or other partitions are
/// ignored, and an empty batch reports `IN_PROGRESS` at 0%.
pub fn compute_progress(batch: &UploadBatch, tasks: &[TaskRecord]) -> ProgressSummary {
    // Batches built by hand may still repeat an id
    let total_files = batch.file_ids.iter().collect::<HashSet<_>>().len();

    let mut terminal: HashMap<&str, TaskStatus> = HashMap::with_capacity(total_files);
    for task in tasks {
        if !task.state.is_terminal() || task.partition() != batch.partition {
            continue;
        }
        if batch.contains(task.file_id()) {
            terminal.insert(task.file_id(), task.state);
        }
    }

    let completed_files = terminal
        .values()
        .filter(|state| **state == TaskStatus::Completed)
        .count();
    let failed_files = terminal.len() - completed_files;
    let done = completed_files + failed_files;

    let progress = if total_files > 0 {
        // round(100 * done / total) with halves rounded up
        ((200 * done + total_files) / (2 * total_files)).min(100) as u8
    } else {
        0
    };

    let status = if total_files == 0 {
        ProgressStatus::InProgress
    } else if completed_files == total_files {
        ProgressStatus::Success
    } else if done == total_files {
        ProgressStatus::Failed
    } else {
        ProgressStatus::InProgress
    };

    ProgressSummary {
        status,
        progress,
        completed_files,
        failed_files,
    }
}
