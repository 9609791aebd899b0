// SPDX-License-Identifier: MIT
//
// Terminal queries and panic-safe restore.
//
// Safety: this module uses `unsafe` for ioctl (TIOCGWINSZ), isatty, and a
// raw fd write. These are the POSIX interfaces for the job and each unsafe
// block is a single call.
#![allow(unsafe_code)]
//
// A screen hides the cursor while drawing. If the program panics mid-frame
// the panic hook puts the cursor and colors back before the message prints.
// It writes straight to fd 1 so a panic raised while stdout's lock is held
// can't deadlock it.

use std::sync::Once;

use crate::geometry::Size;

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Terminal size in cells via `ioctl(TIOCGWINSZ)`.
///
/// `None` when stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size::new(ws.ws_col, ws.ws_row))
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdout is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic restore ───────────────────────────────────────────────────────────

/// Reset SGR attributes, show the cursor.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[0m\x1b[?25h";

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install (once per process) a panic hook that restores the cursor and
/// colors, then defers to the previous hook.
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        use std::io::Write;
        let mut out = std::io::stdout();
        let _ = out.write_all(EMERGENCY_RESTORE);
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_size_is_positive_when_known() {
        // Under a test runner stdout is usually a pipe; either answer is
        // fine as long as a known size is never zero.
        if let Some(size) = get_size() {
            assert!(size.width > 0 && size.height > 0);
        }
    }

    #[test]
    fn panic_hook_installs_once() {
        install_panic_hook();
        install_panic_hook();
        assert!(PANIC_HOOK_INSTALLED.is_completed());
    }

    #[test]
    fn restore_sequence_resets_and_shows_cursor() {
        assert!(EMERGENCY_RESTORE.starts_with(b"\x1b[0m"));
        assert!(EMERGENCY_RESTORE.ends_with(b"\x1b[?25h"));
    }
}
