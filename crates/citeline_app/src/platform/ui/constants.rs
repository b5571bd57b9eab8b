use std::time::Duration;

pub const PROMPT: &str = "citeline> ";
pub const USER_PREFIX: &str = "> ";
pub const STATUS_PREFIX: &str = "  ~ ";
pub const VIEWER_PREFIX: &str = "viewer: ";
pub const NOTICE_PREFIX: &str = "! ";
pub const SOURCES_HEADER: &str = "sources:";
pub const BULLET: &str = "-";
pub const CODE_INDENT: &str = "    ";
pub const SNIPPET_WIDTH: usize = 60;

/// Render/poll cadence of the main loop.
pub const TICK_INTERVAL: Duration = Duration::from_millis(75);
