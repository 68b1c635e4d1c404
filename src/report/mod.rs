//! Process-wide report plumbing.
//!
//! The annotator and verifier never touch any of this. It is the small
//! facade the diagnostics layer writes through:
//!
//! - where reports go (stderr, stdout, or `<path>.<pid>`);
//! - a hook that receives the one-line summary after an error report;
//! - a callback run right before strict mode kills the process;
//! - stack-trace printing.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::sync::Mutex;

type SummaryHook = Arc<dyn Fn(&str) + Send + Sync>;
type DeathCallback = Arc<dyn Fn() + Send + Sync>;

enum ReportTarget {
    Stderr,
    Stdout,
    File { path: PathBuf, file: File },
}

struct ReportState {
    target: ReportTarget,
    summary_hook: Option<SummaryHook>,
    death_callback: Option<DeathCallback>,
}

fn state() -> &'static Mutex<ReportState> {
    static STATE: OnceLock<Mutex<ReportState>> = OnceLock::new();
    STATE.get_or_init(|| {
        Mutex::new(ReportState {
            target: ReportTarget::Stderr,
            summary_hook: None,
            death_callback: None,
        })
    })
}

/// Redirect reports.
///
/// `None` or `"stderr"` writes to stderr, `"stdout"` to stdout. Any other
/// path opens `<path>.<pid>` for appending, so forked processes do not share
/// a file.
pub fn set_report_path(path: Option<&Path>) -> io::Result<()> {
    let target = match path {
        None => ReportTarget::Stderr,
        Some(p) if p == Path::new("stderr") => ReportTarget::Stderr,
        Some(p) if p == Path::new("stdout") => ReportTarget::Stdout,
        Some(p) => {
            let path = pid_path(p);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            ReportTarget::File { path, file }
        }
    };

    #[cfg(feature = "log")]
    {
        match &target {
            ReportTarget::File { path, .. } => log::debug!("reports go to {}", path.display()),
            ReportTarget::Stdout => log::debug!("reports go to stdout"),
            ReportTarget::Stderr => log::debug!("reports go to stderr"),
        }
    }

    state().lock().target = target;
    Ok(())
}

/// The report file currently in use, if reports go to a file.
pub fn report_path() -> Option<PathBuf> {
    match &state().lock().target {
        ReportTarget::File { path, .. } => Some(path.clone()),
        ReportTarget::Stderr | ReportTarget::Stdout => None,
    }
}

fn pid_path(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{}", std::process::id()));
    PathBuf::from(name)
}

/// Write `text` to the report sink. Write errors are ignored.
pub fn write_report(text: &str) {
    let mut state = state().lock();
    let _ = match &mut state.target {
        ReportTarget::Stderr => io::stderr().write_all(text.as_bytes()),
        ReportTarget::Stdout => io::stdout().write_all(text.as_bytes()),
        ReportTarget::File { file, .. } => {
            file.write_all(text.as_bytes()).and_then(|_| file.flush())
        }
    };
}

/// Install a hook that receives error summaries instead of the report sink.
pub fn set_error_summary_hook<F>(hook: F)
where
    F: Fn(&str) + Send + Sync + 'static,
{
    state().lock().summary_hook = Some(Arc::new(hook));
}

/// Remove the error summary hook.
pub fn clear_error_summary_hook() {
    state().lock().summary_hook = None;
}

/// Report the one-line summary of an error that was just reported.
///
/// Goes to the installed hook, or as `SUMMARY: contshadow: ...` to the
/// report sink.
pub fn report_error_summary(summary: &str) {
    let hook = state().lock().summary_hook.clone();
    match hook {
        Some(hook) => hook(summary),
        None => write_report(&format!("SUMMARY: contshadow: {}\n", summary)),
    }
}

/// Install a callback that runs right before strict mode panics.
pub fn set_death_callback<F>(callback: F)
where
    F: Fn() + Send + Sync + 'static,
{
    state().lock().death_callback = Some(Arc::new(callback));
}

/// Remove the death callback.
pub fn clear_death_callback() {
    state().lock().death_callback = None;
}

/// Run the death callback, if any. The report lock is not held while it runs.
pub fn run_death_callback() {
    let callback = state().lock().death_callback.clone();
    if let Some(callback) = callback {
        callback();
    }
}

/// Print the current stack trace to the report sink.
pub fn print_stack_trace() {
    write_report(&stack_trace_text());
}

#[cfg(feature = "debug")]
fn stack_trace_text() -> String {
    crate::debug::backtrace::capture_stack_trace()
}

#[cfg(not(feature = "debug"))]
fn stack_trace_text() -> String {
    "[contshadow] stack trace unavailable: enable the `debug` feature\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_path() {
        let path = pid_path(Path::new("/tmp/reports/shadow"));
        assert_eq!(
            path,
            PathBuf::from(format!("/tmp/reports/shadow.{}", std::process::id()))
        );
    }

    #[test]
    fn test_summary_hook_and_death_callback() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static SUMMARIES: AtomicUsize = AtomicUsize::new(0);
        static DEATHS: AtomicUsize = AtomicUsize::new(0);

        set_error_summary_hook(|_summary| {
            SUMMARIES.fetch_add(1, Ordering::SeqCst);
        });
        report_error_summary("CS101 region [0x0, 0x18)");
        clear_error_summary_hook();
        assert!(SUMMARIES.load(Ordering::SeqCst) >= 1);

        set_death_callback(|| {
            DEATHS.fetch_add(1, Ordering::SeqCst);
        });
        run_death_callback();
        clear_death_callback();
        run_death_callback();
        assert_eq!(DEATHS.load(Ordering::SeqCst), 1);
    }
}
