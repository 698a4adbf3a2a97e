use std::io::Write;

use crate::framework::ProcessHalt;

/// Exit code of a completed graceful shutdown.
pub const EXIT_OK: i32 = 0;

/// Exit code when the shutdown sequence hit an unrecoverable error
/// (`EX_SOFTWARE` from sysexits.h).
pub const EXIT_FATAL: i32 = 70;

/// Terminates the real process.
///
/// On Unix this is `_exit(2)`: no `atexit` handlers, no destructors, no
/// flushing of stdio buffers beyond the explicit flush done here.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl ProcessHalt for ProcessExit {
    fn halt(&self, code: i32) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();

        // SAFETY: `_exit` takes no pointers and never returns.
        #[cfg(unix)]
        unsafe {
            libc::_exit(code);
        }

        #[cfg(not(unix))]
        std::process::exit(code);
    }
}
