pub mod command;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use dotenv::dotenv;

pub use command::Command;

use crate::{
    error::Result,
    feed::FeedCache,
    session::{FileTokenStore, MemoryTokenStore, Session, TokenStore},
};

#[derive(Debug, Clone, Parser)]
#[command(name = "petfeed", version, about = "Pet adoption feed from the command line")]
pub struct Config {
    /// Backend base url
    #[arg(long, env = "PETFEED_API", default_value = "http://localhost:3000", global = true)]
    api: String,
    /// Bearer token, overrides the stored one
    #[arg(long, env = "PETFEED_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
    /// Where the token is kept [default: "<config dir>/petfeed/token"]
    #[arg(long, env = "PETFEED_TOKEN_FILE", global = true)]
    token_file: Option<PathBuf>,
    /// Feed cache directory [default: "<cache dir>/petfeed"]
    #[arg(short, long, global = true)]
    cache: Option<PathBuf>,
    /// Do not read or write the feed cache
    #[arg(long, global = true)]
    no_cache: bool,
    /// Limit request concurrency
    #[arg(long, default_value = "5", global = true)]
    limit: usize,
    /// Milliseconds a publication stays locked after a like
    #[arg(long, default_value = "200", global = true)]
    settle_ms: u64,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Parse the configuration from the environment and command line arguments
    pub fn parse() -> Self {
        dotenv().ok();
        <Self as Parser>::parse()
    }
    /// Create a logger with the configured verbosity level
    pub fn init_logger(&self) {
        env_logger::Builder::new()
            .filter_level(self.verbose.log_level_filter())
            .format_target(false)
            .format_timestamp(None)
            .init();
    }
    pub fn api(&self) -> &str {
        &self.api
    }
    pub const fn limit(&self) -> usize {
        self.limit
    }
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        match self.token_file.clone().or_else(FileTokenStore::default_path) {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::default()),
        }
    }
    /// Load the session once, at start up
    pub fn session(&self) -> Result<Session> {
        match &self.token {
            Some(token) => Ok(Session::with_token(token.trim())),
            None => Session::load(self.token_store()),
        }
    }
    pub fn cache(&self) -> FeedCache {
        if self.no_cache {
            return FeedCache::disabled();
        }
        let dir = self
            .cache
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("petfeed")))
            .unwrap_or_else(|| PathBuf::from("."));
        FeedCache::new(Some(dir))
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;
    use crate::test::token_for;

    #[test]
    fn token_flag_wins_over_store() {
        let token = token_for(r#"{"uid":"flag"}"#);
        let config = Config::try_parse_from(["petfeed", "--token", &token, "feed"]).unwrap();
        assert_eq!(config.session().unwrap().user_id().as_deref(), Some("flag"));
    }

    #[test]
    fn reads_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, token_for(r#"{"sub":"stored"}"#)).unwrap();

        let args: Vec<OsString> = vec![
            "petfeed".into(),
            "--token-file".into(),
            path.into_os_string(),
            "me".into(),
        ];
        let config = Config::try_parse_from(args).unwrap();
        assert_eq!(config.session().unwrap().user_id().as_deref(), Some("stored"));
    }

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["petfeed", "--no-cache", "feed"]).unwrap();
        assert_eq!(config.api(), "http://localhost:3000");
        assert_eq!(config.limit(), 5);
        assert_eq!(config.settle_delay(), Duration::from_millis(200));
        assert!(config.cache().load().is_none());
    }
}
