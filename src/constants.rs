// API URLs
// Default fallback URL for the server API. Prefer environment variables.
pub const SERVER_API_URL: &str = "http://localhost:8080";

// Server endpoint paths
pub const GENERATE_PATH: &str = "/api/generate";
pub const HISTORY_PATH: &str = "/api/history";
pub const USER_STATUS_PATH: &str = "/api/user/status";
pub const EXECUTE_PATH: &str = "/api/execute";

// Environment variable consulted for the server base URL
pub const SERVER_URL_ENV: &str = "TESTGEN_SERVER_URL";

// Local history cap; the oldest entry is dropped once the cap is reached
pub const MAX_HISTORY_ITEMS: usize = 50;

// How long a streaming read may sit idle before the attempt is abandoned
pub const DEFAULT_IDLE_READ_TIMEOUT_SECS: u64 = 120;

// Shown when the server reports a failure without a usable message
pub const GENERATION_FAILED_MESSAGE: &str = "Generation failed";

// Keychain coordinates for the persisted access token
pub const KEYRING_SERVICE: &str = "testgen-client";
pub const TOKEN_KEY: &str = "api_token";

// Buffered lifecycle events per subscriber before lagging kicks in
pub const SESSION_EVENT_CAPACITY: usize = 64;
