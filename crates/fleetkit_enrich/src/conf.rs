//! Fleet API defaults and response keys.

/// Default fleet API origin.
pub const C_API_BASE_URL_DEFAULT: &str = "https://api.baubuddy.de";
/// Path segments of the active-vehicles endpoint.
pub const TUP_PATH_ACTIVE_RESOURCES: [&str; 6] =
    ["dev", "index.php", "v1", "vehicles", "select", "active"];
/// Path segments of the label endpoint; the label id is appended.
pub const TUP_PATH_LABELS: [&str; 4] = ["dev", "index.php", "v1", "labels"];
/// Default HTTP timeout in milliseconds.
pub const N_API_TIMEOUT_MS_DEFAULT: u64 = 30_000;

/// Color field carried by label records.
pub const C_KEY_LABEL_COLOR_CODE: &str = "colorCode";
