use std::sync::Arc;

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// A stderr reporter in verbose mode, nothing otherwise.
pub fn stderr_progress(verbose: bool) -> Option<ProgressCallback> {
    verbose.then(|| Arc::new(|msg: &str| eprintln!("{msg}")) as ProgressCallback)
}

pub fn report(progress: Option<&ProgressCallback>, msg: &str) {
    if let Some(cb) = progress {
        cb(msg);
    }
}
