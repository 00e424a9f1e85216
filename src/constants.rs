// src/constants.rs

/// The name of the application directory inside the system config directory.
pub const APP_DIR_NAME: &str = "entry";

/// The name of the main configuration file (inside the app directory).
pub const CONFIG_FILENAME: &str = "config.toml";

/// The name of the directory holding per-profile configuration files.
pub const PROFILES_DIR_NAME: &str = "profiles";

/// The file extension used by profile configuration files.
pub const PROFILE_EXTENSION: &str = "toml";

/// The name of the history file (inside the app directory).
pub const HISTORY_FILENAME: &str = "history.json";

/// Maximum number of entries kept in the history file.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Environment variable selecting a configuration profile.
pub const PROFILE_ENV_VAR: &str = "ENTRY_PROFILE";

/// Environment variable overriding the history file location.
pub const HISTORY_PATH_ENV_VAR: &str = "ENTRY_HISTORY_PATH";

/// Schema version written into new configuration files.
pub const CONFIG_VERSION: &str = "1";

/// Suffix appended to dry-run lines for commands that would run detached.
pub const BACKGROUND_MARKER: &str = " (background)";

/// Rule label recorded in history when the configured default command runs.
pub const DEFAULT_COMMAND_LABEL: &str = "default";

/// Rule label recorded in history when the platform opener runs.
pub const SYSTEM_OPENER_LABEL: &str = "system";
