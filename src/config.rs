// src/config.rs
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Command line flags, each with an environment fallback.
#[derive(Debug, Parser)]
#[command(name = "resize-proxy", about = "On-demand image resizing proxy with a disk cache")]
pub struct Args {
    /// Comma separated list of hosts that may be proxied (empty allows all)
    #[arg(long, env = "ALLOW_DOMAINS", default_value = "")]
    pub allow_domains: String,

    /// Base url used when `url` does not start with http(s)://
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<Url>,

    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: String,

    #[arg(long, env = "CACHE_DIR", default_value = "./cache")]
    pub cache_dir: PathBuf,

    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    #[arg(long, env = "STALE_WHILE_REVALIDATE", default_value_t = 86_400)]
    pub stale_while_revalidate: u64,

    #[arg(long, env = "STALE_IF_ERROR", default_value_t = 604_800)]
    pub stale_if_error: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub listen_addr: String,
    // 已转小写的主机名；为空表示允许所有域名
    pub allow_domains: HashSet<String>,
    pub base_url: Option<Url>,
    pub upstream_timeout: Duration,
    pub stale_while_revalidate: u64,
    pub stale_if_error: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            listen_addr: "0.0.0.0:8080".to_string(),
            allow_domains: HashSet::new(),
            base_url: None,
            upstream_timeout: Duration::from_secs(10),
            stale_while_revalidate: 86_400,
            stale_if_error: 604_800,
        }
    }

    /// 精确匹配主机名（忽略大小写），不做子串匹配
    pub fn is_domain_allowed(&self, host: &str) -> bool {
        self.allow_domains.is_empty() || self.allow_domains.contains(&host.to_ascii_lowercase())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            cache_dir: args.cache_dir,
            listen_addr: args.listen,
            allow_domains: parse_allow_domains(&args.allow_domains),
            base_url: args.base_url,
            upstream_timeout: Duration::from_secs(args.upstream_timeout_secs),
            stale_while_revalidate: args.stale_while_revalidate,
            stale_if_error: args.stale_if_error,
        }
    }
}

pub fn parse_allow_domains(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|d| d.trim().to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}
