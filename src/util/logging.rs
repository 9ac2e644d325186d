//! Log subscriber setup.
//!
//! Every line carries the microseconds elapsed since process start, a one letter
//! severity, the kernel thread id and the name of the worker (or `wlg` for the
//! orchestrator), e.g.:
//!
//! ```text
//! 0001234.567 I  41233:wlg     : Setup workers..
//! 0001301.002 D  41240:I001    : sleeping for       412 [us]
//! ```

use std::fmt;

use anyhow::Result;
use anyhow::anyhow;
use tracing::Level;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::FormatEvent;
use tracing_subscriber::fmt::format::FormatFields;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::registry::LookupSpan;

use crate::util::clock::Timer;
use crate::util::sched::Sched;

/// Name used for events emitted outside of a worker thread.
pub const ORCHESTRATOR_TAG: &str = "wlg";

/// Formats events as single human readable lines relative to a start timer.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadFormatter {
    timer: Timer,
}

impl WorkloadFormatter {
    pub fn new(timer: Timer) -> Self {
        Self { timer }
    }
}

fn level_letter(level: &Level) -> char {
    match *level {
        Level::ERROR => 'E',
        Level::WARN => 'W',
        Level::INFO => 'I',
        Level::DEBUG => 'D',
        _ => 'T',
    }
}

/// Name shown for the calling thread.
fn thread_tag(name: Option<&str>) -> &str {
    match name {
        Some("main") | None => ORCHESTRATOR_TAG,
        Some(name) => name,
    }
}

/// Write the line prefix, up to and including the `": "` separator.
fn write_prefix(
    writer: &mut impl fmt::Write,
    elapsed_us: f64,
    level: &Level,
    tid: i32,
    name: &str,
) -> fmt::Result {
    write!(
        writer,
        "{:011.3} {} {:6}:{:<8.8}: ",
        elapsed_us,
        level_letter(level),
        tid,
        name
    )
}

impl<S, N> FormatEvent<S, N> for WorkloadFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let thread = std::thread::current();
        write_prefix(
            &mut writer,
            self.timer.elapsed_us(),
            event.metadata().level(),
            Sched::current_tid().as_raw(),
            thread_tag(thread.name()),
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber.
///
/// INFO by default, DEBUG when `verbose` is set; `RUST_LOG` overrides both.
pub fn init(timer: Timer, verbose: bool) -> Result<()> {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .event_format(WorkloadFormatter::new(timer))
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_layout() {
        let mut line = String::new();
        write_prefix(&mut line, 1234.5678, &Level::INFO, 42, "I007").unwrap();
        assert_eq!(line, "0001234.568 I     42:I007    : ");
    }

    #[test]
    fn test_prefix_truncates_long_names() {
        let mut line = String::new();
        write_prefix(&mut line, 0.0, &Level::DEBUG, 7, "averyverylongname").unwrap();
        assert_eq!(line, "0000000.000 D      7:averyver: ");
    }

    #[test]
    fn test_thread_tag() {
        assert_eq!(thread_tag(None), ORCHESTRATOR_TAG);
        assert_eq!(thread_tag(Some("main")), ORCHESTRATOR_TAG);
        assert_eq!(thread_tag(Some("B001")), "B001");
    }

    #[test]
    fn test_level_letters() {
        assert_eq!(level_letter(&Level::ERROR), 'E');
        assert_eq!(level_letter(&Level::INFO), 'I');
        assert_eq!(level_letter(&Level::DEBUG), 'D');
    }
}
