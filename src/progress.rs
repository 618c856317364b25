use tracing::info;

/// Receives a notification after each chunk's oracle response
pub trait ProgressReporter {
    /// `completed` is 1-based and reaches `total` on the last chunk
    fn chunk_completed(&mut self, completed: usize, total: usize);
}

impl<F> ProgressReporter for F
where
    F: FnMut(usize, usize),
{
    fn chunk_completed(&mut self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Reports progress through the tracing log
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn chunk_completed(&mut self, completed: usize, total: usize) {
        let percent = completed as f64 / total.max(1) as f64 * 100.0;
        info!("Progress: {}/{} chunks ({:.0}%)", completed, total, percent);
    }
}
