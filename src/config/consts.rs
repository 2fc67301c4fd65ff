// src/config/consts.rs

// Remote
pub const BASE_URL: &str = "http://libzw.csu.edu.cn";
pub const AREA_ID: u32 = 95;
pub const API_PATH: &str = "/api.php/v3areas/";
pub const PAGE_PATH: &str = "/web/seat2/area/";

// Request headers (the direct path pretends to be the page's own XHR)
pub const USER_AGENT: &str = "Mozilla/5.0";
pub const XHR_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

// Timeouts
pub const FETCH_TIMEOUT_SECS: u64 = 10;
pub const PAGE_LOAD_TIMEOUT_SECS: u64 = 10;
pub const DRIVER_START_TIMEOUT_SECS: u64 = 10;
pub const DRIVER_POLL_MS: u64 = 200;

// WebDriver
pub const WEBDRIVER_HOST: &str = "127.0.0.1";
pub const WEBDRIVER_PORT: u16 = 9515;
pub const BROWSER_NAME: &str = "chrome";

// Local store
pub const STORE_DIR: &str = "data";
pub const STORE_EXT: &str = "csv";
pub const LOG_SUBDIR: &str = ".log";
pub const LOG_FILE: &str = "debug.log";
pub const LOG_ENV: &str = "SEAT_WATCH_LOG";

// DaySeries layout
pub const DAY_HEADER: [&str; 6] = [
    "minute", "id", "name", "TotalCount", "UnavailableSpace", "AvailableSpace",
];
pub const DATE_FORMAT: &str = "%Y-%m-%d";
