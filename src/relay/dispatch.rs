//! Mode selection.

use std::fmt;

use crate::http::request::RequestMethod;

/// Fetch mode resolved once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// HEAD probe returning metadata only.
    Info,
    /// Upstream bytes returned verbatim.
    Raw,
    /// Decoded body plus status block, JSON-encoded.
    Contents,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Info => "info",
            Mode::Raw => "raw",
            Mode::Contents => "contents",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the fetch mode. HEAD takes precedence over any declared format.
pub fn select_mode(format: &str, method: RequestMethod) -> Mode {
    if method == RequestMethod::Head || format == "info" {
        Mode::Info
    } else if format == "raw" {
        Mode::Raw
    } else {
        Mode::Contents
    }
}
