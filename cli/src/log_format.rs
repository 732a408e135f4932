//! Plain-text event format for the log file: each line carries the span
//! path and the numeric ids of the root and innermost span, so the lines of
//! one REPL turn can be grepped together.

use std::fmt;

use tracing_core::Subscriber;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// `TIMESTAMP LEVEL [turn>tool trace_id=1 span_id=3] target: fields`.
/// The bracket is omitted for events outside any span.
pub struct SpanPathFormat {
    timer: SystemTime,
    with_target: bool,
    with_ids: bool,
}

impl Default for SpanPathFormat {
    fn default() -> Self {
        Self {
            timer: SystemTime,
            with_target: true,
            with_ids: true,
        }
    }
}

impl SpanPathFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, on: bool) -> Self {
        self.with_target = on;
        self
    }

    /// Drop the trace/span ids and keep only the span names.
    pub fn with_ids(mut self, on: bool) -> Self {
        self.with_ids = on;
        self
    }
}

impl<S, N> FormatEvent<S, N> for SpanPathFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing_core::Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        write!(writer, " {:>5}", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            let spans: Vec<_> = scope.from_root().collect();
            let path: Vec<&str> = spans.iter().map(|s| s.name()).collect();
            write!(writer, " [{}", path.join(">"))?;
            if self.with_ids {
                if let (Some(root), Some(leaf)) = (spans.first(), spans.last()) {
                    write!(
                        writer,
                        " trace_id={} span_id={}",
                        root.id().into_u64(),
                        leaf.id().into_u64()
                    )?;
                }
            }
            write!(writer, "]")?;
        }

        if self.with_target {
            write!(writer, " {}:", event.metadata().target())?;
        }
        write!(writer, " ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone)]
    struct VecWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for VecWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture(format: SpanPathFormat, emit: impl FnOnce()) -> String {
        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
        let writer = {
            let sink = Arc::clone(&sink);
            move || VecWriter(Arc::clone(&sink))
        };
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(writer)
                .with_ansi(false),
        );
        tracing::subscriber::with_default(subscriber, emit);
        let out = sink.lock().unwrap().clone();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nested_spans_are_joined_from_the_root() {
        let output = capture(SpanPathFormat::new(), || {
            let turn = tracing::info_span!("turn");
            let _t = turn.enter();
            let tool = tracing::info_span!("tool");
            let _g = tool.enter();
            tracing::info!(name = "calculator", "tool call");
        });
        assert!(output.contains("[turn>tool trace_id="));
        assert!(output.contains("span_id="));
        assert!(output.contains("INFO"));
        assert!(output.contains("name=\"calculator\""));
    }

    #[test]
    fn events_outside_spans_have_no_bracket() {
        let output = capture(SpanPathFormat::new().with_target(false), || {
            tracing::warn!("standalone");
        });
        assert!(!output.contains('['));
        assert!(output.contains("WARN"));
        assert!(output.trim_end().ends_with("standalone"));
    }

    #[test]
    fn ids_can_be_switched_off() {
        let output = capture(SpanPathFormat::new().with_ids(false), || {
            let span = tracing::info_span!("turn");
            let _g = span.enter();
            tracing::info!("inside");
        });
        assert!(output.contains("[turn]"));
        assert!(!output.contains("trace_id"));
    }
}
