//! Engine configuration constants.
//!
//! Defaults and fixed names shared by config, links and the binary.

use std::time::Duration;

/// Time between refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(180);

/// Detail labels longer than this many characters are truncated.
pub const DEFAULT_MAX_SUBJECT_LENGTH: usize = 45;

/// Marker appended to truncated labels.
pub const ELLIPSIS: &str = "...";

/// Base of every resource link; the detail path is appended to it.
pub const DEFAULT_RESOURCE_BASE_URL: &str = "https://my.activecloud.com/ru/staff/index.php?";

/// Path segment between the base URL and the detail id.
pub const DETAIL_VIEW_PATH: &str = "Tickets/Ticket/View";

/// Command run to produce a snapshot when none is configured.
pub const DEFAULT_SOURCE_PROGRAM: &str = "levelbar-source";

/// Command used to open resource links in the default viewer.
pub const DEFAULT_OPENER: &str = "xdg-open";

/// Directory under the user config dir holding `config.ron`.
pub const CONFIG_DIR_NAME: &str = "levelbar";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.ron";
