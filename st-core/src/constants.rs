//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "Secure Talk";

/// Directory name used under the platform data/config dirs.
pub const APP_DIR_NAME: &str = "SecureTalk";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rolling log file prefix.
pub const LOG_FILE_NAME: &str = "securetalk.log";

/// Language code returned when detection fails.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Target language that asks for informal Hinglish output.
pub const HINGLISH_LANGUAGE: &str = "en-IN";

/// Default delay before the single translation retry, in milliseconds.
pub const DEFAULT_TRANSLATION_RETRY_DELAY_MS: u64 = 2_000;

/// HTTP status a push service uses for an expired subscription.
pub const PUSH_EXPIRED_STATUS: u16 = 410;

/// Domain used to synthesize account emails from usernames.
pub const DEFAULT_EMAIL_DOMAIN: &str = "securetalk.app";

/// Maximum group name length in characters.
pub const MAX_GROUP_NAME_CHARS: usize = 64;

/// Default flow server port.
pub const DEFAULT_SERVER_PORT: u16 = 3400;

/// Flow names as exposed by the registry and the flow server.
pub mod flows {
    pub const TRANSLATE_MESSAGE: &str = "translateMessage";
    pub const DETECT_LANGUAGE: &str = "detectLanguage";
    pub const GENERATE_README: &str = "generateReadme";
    pub const SEND_PUSH_NOTIFICATION: &str = "sendPushNotification";
    pub const CREATE_GROUP: &str = "createGroup";

    /// All flow names.
    pub const ALL: &[&str] = &[
        TRANSLATE_MESSAGE,
        DETECT_LANGUAGE,
        GENERATE_README,
        SEND_PUSH_NOTIFICATION,
        CREATE_GROUP,
    ];
}

/// Top-level and nested collection names in the document store.
pub mod collections {
    pub const USERS: &str = "users";
    pub const USERNAMES: &str = "usernames";
    pub const GROUPS: &str = "groups";
    pub const CHATS: &str = "chats";
    pub const CONTACTS: &str = "contacts";
    pub const MESSAGES: &str = "messages";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
}
