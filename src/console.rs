//! Kernel console.
//!
//! The kernel owns no output device. The platform installs a sink once at
//! boot (a UART transmit routine, a semihosting call, a ring buffer) and the
//! print macros format through it. Until a sink is installed output is
//! dropped.

use core::fmt::{self, Write};
use spin::Once;

static SINK: Once<fn(&str)> = Once::new();

/// Install the console sink.
///
/// Only the first call takes effect; returns whether this call installed
/// `sink`.
pub fn set_sink(sink: fn(&str)) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });
    installed
}

/// Whether a sink has been installed.
pub fn has_sink() -> bool {
    SINK.is_completed()
}

/// Send a string to the sink.
pub fn send_str(s: &str) {
    if let Some(sink) = SINK.get() {
        sink(s);
    }
}

/// Console writer for use with `write!` macro.
pub struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        send_str(s);
        Ok(())
    }
}

/// Print a formatted string to the kernel console.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let _ = write!($crate::console::ConsoleWriter, $($arg)*);
    }};
}

/// Print a formatted string to the kernel console with a newline.
#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {{
        $crate::kprint!($($arg)*);
        $crate::kprint!("\n");
    }};
}

/// Scheduler tracing, compiled in with the `trace` feature.
#[cfg(feature = "trace")]
macro_rules! ktrace {
    ($($arg:tt)*) => {
        $crate::kprintln!($($arg)*)
    };
}

/// Scheduler tracing, compiled in with the `trace` feature.
#[cfg(not(feature = "trace"))]
macro_rules! ktrace {
    ($($arg:tt)*) => {
        if false {
            $crate::kprintln!($($arg)*)
        }
    };
}

pub(crate) use ktrace;
