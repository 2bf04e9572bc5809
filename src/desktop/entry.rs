//! XDG desktop entry rendering.
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::config::DesktopConfig;

/// The icon a desktop entry refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconRef {
    /// An extracted icon at an absolute path.
    File(PathBuf),
    /// A themed icon name.
    Named(String),
}

impl fmt::Display for IconRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Characters that force an `Exec` argument to be quoted.
const RESERVED: &[char] = &[
    ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(',
    ')', '`',
];

/// Quote one `Exec` argument per the desktop entry specification.
///
/// Arguments containing reserved characters are wrapped in double quotes
/// with `"`, `` ` ``, `$` and `\` backslash-escaped. Field codes are
/// disarmed by doubling `%`. The string-value escape for `\` is applied last,
/// so a literal backslash inside quotes is written as four.
#[must_use]
pub fn quote_exec_arg(arg: &str) -> String {
    let arg = arg.replace('%', "%%");
    let quoted = if arg.contains(RESERVED) {
        let mut out = String::with_capacity(arg.len() + 2);
        out.push('"');
        for c in arg.chars() {
            if matches!(c, '"' | '`' | '$' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        out
    } else {
        arg
    };
    quoted.replace('\\', "\\\\")
}

/// Escape a plain string value: backslash and control characters.
fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Join list values with a trailing `;` each, escaping embedded separators.
fn list_value(items: &[String]) -> String {
    items.iter().fold(String::new(), |mut out, item| {
        out.push_str(&escape_value(item).replace(';', "\\;"));
        out.push(';');
        out
    })
}

/// Render the complete desktop entry for the stable link at `link`.
///
/// The output depends only on its inputs, so regenerating an unchanged
/// entry yields identical bytes.
#[must_use]
pub fn render(desktop: &DesktopConfig, link: &Path, icon: &IconRef) -> String {
    let mut out = String::from("[Desktop Entry]\n");
    let mut line = |key: &str, value: &str| {
        let _ = writeln!(out, "{key}={value}");
    };

    line("Type", "Application");
    line("Name", &escape_value(&desktop.name));
    line("Comment", &escape_value(&desktop.comment));
    line(
        "Exec",
        &format!("{} %F", quote_exec_arg(&link.to_string_lossy())),
    );
    line("Icon", &escape_value(&icon.to_string()));
    line("Terminal", "false");
    line("Categories", &list_value(&desktop.categories));
    line("MimeType", &list_value(&desktop.mime_types));
    line("StartupNotify", "true");
    line("StartupWMClass", &escape_value(&desktop.wm_class));
    line("Keywords", &list_value(&desktop.keywords));
    out
}
