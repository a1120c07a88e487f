use core::fmt;
use core::fmt::Write as _;
use std::fs::OpenOptions;
use std::sync::Once;
use tracing::field::{Field, Visit};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt as tracingfmt};


#[macro_export]
macro_rules! unimplemented_log {
    ( $($arg:tt)* ) => {{
        tracing::warn!(
            "unimplemented: {}",
            format_args!($($arg)*),
        );
    }};
}

/// if `cond` is false, logs a warning with your message.
#[macro_export]
macro_rules! assert_warn {
    ($cond:expr, $($arg:tt)+) => {{
        if !$cond {
            tracing::warn!(
                target: module_path!(),
                "assertion warning: `{}` failed: {} at {}:{}",
                stringify!($cond),
                format_args!($($arg)+),
                file!(),
                line!(),
            );
        }
    }};
}

/// Splits an event into the radio position columns (`frame`, `tn`, `chan`)
/// and the remaining text
#[derive(Default)]
struct GsmFieldVisitor {
    frame: Option<String>,
    tn: Option<String>,
    chan: Option<String>,
    message: String,
    rest: String,
}

impl Visit for GsmFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "chan" => self.chan = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            name => {
                let _ = write!(self.rest, " {}={}", name, value);
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "frame" => self.frame = Some(format!("{:?}", value)),
            "tn" => self.tn = Some(format!("{:?}", value)),
            "chan" => self.chan = Some(format!("{:?}", value)),
            "message" => self.message = format!("{:?}", value),
            name => {
                let _ = write!(self.rest, " {}={:?}", name, value);
            }
        }
    }
}

/// Fixed width position prefix: frame number, timeslot and logical channel.
/// Missing fields are left blank so messages stay aligned.
fn position_columns(frame: Option<&str>, tn: Option<&str>, chan: Option<&str>) -> String {
    let tn = tn.map(|t| format!("t{}", t)).unwrap_or_default();
    format!("{:>7} {:<2} {:<12}", frame.unwrap_or(""), tn, chan.unwrap_or(""))
}

/// "crates/gsm-entities/src/sched/lchan_xcch.rs" becomes "[entities/sched] lchan_xcch.rs"
fn short_location(file_path: &str) -> String {
    let Some(src_idx) = file_path.find("/src/") else {
        return file_path.to_string();
    };
    let before_src = &file_path[..src_idx];
    let after_src = &file_path[src_idx + 5..];

    let crate_name = match before_src.rfind("gsm-") {
        Some(gsm_idx) => &before_src[gsm_idx + 4..],
        None => before_src.rsplit('/').next().unwrap_or("unknown"),
    };

    match after_src.rfind('/') {
        Some(last_slash) => {
            let first_module = after_src[..last_slash].split('/').next().unwrap_or("");
            format!("[{}/{}] {}", crate_name, first_module, &after_src[last_slash + 1..])
        }
        None => format!("[{}] {}", crate_name, after_src),
    }
}

struct AlignedFormatter;

impl<S, N> FormatEvent<S, N> for AlignedFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let mut fields = GsmFieldVisitor::default();
        event.record(&mut fields);

        let (color_level, color_reset) = if writer.has_ansi_escapes() {
            let color = match *metadata.level() {
                tracing::Level::ERROR => "\x1b[31m",
                tracing::Level::WARN => "\x1b[33m",
                tracing::Level::INFO => "\x1b[32m",
                tracing::Level::DEBUG => "\x1b[34m",
                tracing::Level::TRACE => "\x1b[35m",
            };
            (color, "\x1b[0m")
        } else {
            ("", "")
        };

        // Format: "LEVEL fn tn chan [crate/module] file:line: message"
        let location = format!(
            "{}{:<5}{} {} {}:{}:",
            color_level,
            metadata.level(),
            color_reset,
            position_columns(fields.frame.as_deref(), fields.tn.as_deref(), fields.chan.as_deref()),
            short_location(metadata.file().unwrap_or("unknown")),
            metadata.line().unwrap_or(0)
        );

        // Arrows mark primitives crossing a SAP, pull them left a little
        let mut padding = 80;
        if fields.message.starts_with("->") || fields.message.starts_with("<-") {
            padding -= 3;
        }

        write!(writer, "{:<width$} {}{}", location, fields.message, fields.rest, width = padding)?;
        writeln!(writer)
    }
}

static INIT_LOG: Once = Once::new();

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    setup_logging(EnvFilter::new("trace"), None);
}

/// Sets up default logging to stdout and optionally, a verbose log file
/// Returns a guard, that needs to be kept alive for logging to file to work
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    let stdout_filter = get_default_stdout_filter();
    let logfile_and_filter = verbose_logfile.map(|file| (file, get_default_logfile_filter()));
    setup_logging(stdout_filter, logfile_and_filter)
}

/// Builds an EnvFilter from a fixed list of directives that are known to parse
fn filter_with_directives(default: &str, directives: &[&str]) -> EnvFilter {
    directives.iter().fold(EnvFilter::new(default), |filter, d| match d.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    })
}

pub fn get_default_stdout_filter() -> EnvFilter {
    filter_with_directives("info", &[
        // Per-frame machinery
        "gsm_entities::messagerouter=warn",
        "gsm_entities::clock=info",
        "gsm_entities::phy=info",

        // Codec stages trace every block
        "gsm_entities::codec=info",

        // Scheduler: the burst loop and lchan handlers run every TDMA frame
        "gsm_entities::sched::trx_sched=info",
        "gsm_entities::sched::sched_bs=info",
        "gsm_entities::sched::dl_queue=warn",
        "gsm_entities::sched::lchan_xcch=info",
        "gsm_entities::sched::lchan_tchf=info",
        "gsm_entities::sched::lchan_pdtch=info",
        "gsm_entities::sched::lchan_rach=debug",
        "gsm_entities::sched::lchan_sync=info",
        "gsm_entities::cbch=info",
    ])
}

fn get_default_logfile_filter() -> EnvFilter {
    filter_with_directives("debug", &[
        // One line per burst even at debug level
        "gsm_entities::sched::trx_sched=info",
    ])
}

/// Sets up logging to stdout and optionally, a verbose log file
/// If an output file  is requested, returns Some<WorkerGuard>. Keep this value alive
/// or logging to file may cease working. If no output file is provided, returns None.
fn setup_logging(stdout_filter: EnvFilter, outfile: Option<(String, EnvFilter)>) -> Option<WorkerGuard> {
    if let Some((outfile, outfile_filter)) = outfile {
        let file = match OpenOptions::new().create(true).append(true).open(&outfile) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", outfile, e);
                return setup_logging(stdout_filter, None);
            }
        };
        let (file_writer, guard) = tracing_appender::non_blocking(file);

        INIT_LOG.call_once(|| {
            let file_layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(file_writer)
                .with_ansi(false);
            let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter);

            tracing_subscriber::registry()
                .with(file_layer.with_filter(outfile_filter))
                .with(stdout_layer.with_filter(stdout_filter))
                .init();
        });

        Some(guard)
    } else {
        INIT_LOG.call_once(|| {
            let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter);

            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(stdout_filter))
                .init();
        });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_columns_align() {
        let full = position_columns(Some("1234567"), Some("3"), Some("SDCCH/4(2)"));
        let empty = position_columns(None, None, None);
        assert_eq!(full, "1234567 t3 SDCCH/4(2)  ");
        assert_eq!(full.len(), empty.len());
        assert_eq!(position_columns(Some("42"), None, Some("TCH/F")), "     42    TCH/F       ");
    }

    #[test]
    fn test_short_location() {
        assert_eq!(short_location("crates/gsm-entities/src/sched/lchan_xcch.rs"), "[entities/sched] lchan_xcch.rs");
        assert_eq!(short_location("crates/gsm-core/src/bits.rs"), "[core] bits.rs");
        assert_eq!(short_location("build.rs"), "build.rs");
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fields_are_split_from_message() {
        let capture = Capture::default();
        let writer = capture.clone();
        let layer = tracingfmt::layer()
            .event_format(AlignedFormatter)
            .with_ansi(false)
            .with_writer(move || writer.clone());
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(frame = 17, tn = 2u8, chan = "BCCH", rssi = -60, "tx_data: sending");
        });

        let line = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(line.starts_with("INFO       17 t2 BCCH         "), "{}", line);
        assert!(line.contains("debug.rs:"), "{}", line);
        assert!(line.trim_end().ends_with("tx_data: sending rssi=-60"), "{}", line);
        assert!(!line.contains("frame="));
        assert!(!line.contains("chan="));
    }
}
