//! ANSI stripping, terminal sizing, and timestamp helpers.

/// Strip ANSI escape sequences from a string.
///
/// CSI sequences (`ESC [` ... final byte in `@`..`~`) are dropped whole; a
/// lone `ESC` swallows the following character.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            for inner in chars.by_ref() {
                if ('@'..='~').contains(&inner) {
                    break;
                }
            }
        }
    }
    out
}

/// Width of the controlling terminal in columns.
///
/// Asks the terminal first, then `COLUMNS`, then falls back to 80.
#[must_use]
pub fn terminal_columns() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| usize::from(w))
        .or_else(|| {
            std::env::var("COLUMNS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
        })
        .filter(|&n| n > 0)
        .unwrap_or(80)
}

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub(super) fn format_local_datetime() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Version string embedded by the build script.
#[must_use]
pub fn version() -> &'static str {
    option_env!("BOOTSTRAP_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")))
}
