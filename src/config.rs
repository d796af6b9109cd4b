use std::path::PathBuf;

pub const BASE_URL: &str = "https://mydramalist.com";
pub const DEFAULT_MAX_PAGES: u32 = 250;
pub const DEFAULT_DB_PATH: &str = "data/dramas.sqlite";
/// The site serves bot-looking agents a challenge page; present a plain
/// browser agent instead.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Resolved run settings. The pipeline consumes these as-is; flag parsing
/// and defaulting happen at the CLI boundary.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub base_url: String,
    pub pages: u32,
    pub persist: bool,
    pub db_path: PathBuf,
    pub json_out: Option<PathBuf>,
    pub user_agent: String,
}
