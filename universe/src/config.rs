use std::net::SocketAddr;
use std::str::FromStr;
use std::time;

use envconfig::Envconfig;
use url::Url;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "127.0.0.1:3000")]
    pub address: SocketAddr,

    #[envconfig(default = "https://pyblish-web.firebaseio.com")]
    pub feed_url: String,

    #[envconfig(default = "https://forums.pyblish.com")]
    pub forum_url: String,

    #[envconfig(default = "5000")]
    pub request_timeout: EnvMsDuration,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

/// Fixed per-source knobs the classifier and parsers need. Passed by value
/// through the request state, no process-wide mutable configuration.
#[derive(Clone, Debug)]
pub struct SourceSettings {
    pub forum_url: String,
    pub forum_host: String,
    pub default_target: String,
}

impl SourceSettings {
    pub fn new(forum_url: &str, default_target: &str) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(forum_url)?;
        let forum_host = parsed
            .host_str()
            .ok_or(url::ParseError::EmptyHost)?
            .to_owned();

        Ok(SourceSettings {
            forum_url: forum_url.trim_end_matches('/').to_owned(),
            forum_host,
            default_target: default_target.to_owned(),
        })
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            forum_url: String::from("https://forums.pyblish.com"),
            forum_host: String::from("forums.pyblish.com"),
            default_target: String::from("https://github.com/pyblish"),
        }
    }
}
