/*
 * config.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Sfoglia.
 *
 * Sfoglia is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Sfoglia is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Sfoglia.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Fetch configuration: timeouts, redirect budget, user agent, content decoders.
//! Optionally loaded from ~/.sfoglia/config.xml (root \<sfoglia\>). All XML reading uses the
//! quick_xml parser; unknown elements are ignored.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::protocol::http::Decoders;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one or more fetches. `Default` gives a single request per fetch (no redirects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Bound on TCP connect and on the TLS handshake.
    pub connect_timeout: Duration,
    /// Bound on each individual read from the socket.
    pub read_timeout: Duration,
    /// Redirects followed per fetch; 0 means any 3xx fails as an HTTP error.
    pub max_redirects: u32,
    /// Sent as User-Agent when set.
    pub user_agent: Option<String>,
    pub decoders: Decoders,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_redirects: 0,
            user_agent: Some(default_user_agent()),
            decoders: Decoders::available(),
        }
    }
}

/// Sfoglia/<version> (<os>).
pub fn default_user_agent() -> String {
    format!(
        "Sfoglia/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

impl FetchConfig {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = max;
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn decoders(mut self, decoders: Decoders) -> Self {
        self.decoders = decoders;
        self
    }

    /// Load from an XML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Self::from_xml(&content)
    }

    /// Parse `<sfoglia><connect-timeout>secs</connect-timeout>...</sfoglia>` over the defaults.
    pub fn from_xml(content: &str) -> Result<Self, ConfigError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut config = Self::default();
        let mut element_name = Vec::<u8>::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Err(e) => return Err(ConfigError::Xml(e.to_string())),
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) => {
                    element_name.clear();
                    element_name.extend_from_slice(e.name().as_ref());
                }
                Ok(Event::Text(e)) => {
                    if element_name.is_empty() {
                        continue;
                    }
                    let text = e
                        .unescape()
                        .map_err(|e| ConfigError::Xml(e.to_string()))?
                        .trim()
                        .to_string();
                    match element_name.as_slice() {
                        b"connect-timeout" => {
                            config.connect_timeout = parse_seconds("connect-timeout", &text)?
                        }
                        b"read-timeout" => {
                            config.read_timeout = parse_seconds("read-timeout", &text)?
                        }
                        b"max-redirects" => {
                            config.max_redirects = text.parse().map_err(|_| ConfigError::Value {
                                element: "max-redirects",
                                value: text.clone(),
                            })?
                        }
                        b"user-agent" => {
                            config.user_agent = if text.is_empty() { None } else { Some(text) }
                        }
                        b"brotli" => match text.as_str() {
                            "true" => config.decoders = Decoders::available(),
                            "false" => config.decoders = config.decoders.without_brotli(),
                            _ => {
                                return Err(ConfigError::Value {
                                    element: "brotli",
                                    value: text.clone(),
                                })
                            }
                        },
                        _ => {}
                    }
                    element_name.clear();
                }
                Ok(Event::End(_)) => element_name.clear(),
                _ => {}
            }
            buf.clear();
        }
        Ok(config)
    }
}

fn parse_seconds(element: &'static str, text: &str) -> Result<Duration, ConfigError> {
    text.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::Value {
            element,
            value: text.to_string(),
        })
}

/// Default config directory: ~/.sfoglia.
pub fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|h| h.join(".sfoglia"))
}

/// Default config file: ~/.sfoglia/config.xml.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|d| d.join("config.xml"))
}

/// Errors reading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Xml(String),
    /// Element present but its value could not be parsed.
    Value { element: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Xml(m) => write!(f, "XML parse error: {}", m),
            ConfigError::Value { element, value } => {
                write!(f, "invalid value {:?} for <{}>", value, element)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = FetchConfig::default();
        assert_eq!(c.max_redirects, 0);
        assert_eq!(c.connect_timeout, Duration::from_secs(15));
        assert!(c.user_agent.as_deref().unwrap_or("").starts_with("Sfoglia/"));
    }

    #[test]
    fn xml_overrides_defaults() {
        let c = FetchConfig::from_xml(
            r#"<?xml version="1.0"?>
            <sfoglia>
              <connect-timeout>5</connect-timeout>
              <read-timeout>7</read-timeout>
              <max-redirects>3</max-redirects>
              <user-agent>Test &amp; Co</user-agent>
              <brotli>false</brotli>
              <unknown>ignored</unknown>
            </sfoglia>"#,
        )
        .unwrap();
        assert_eq!(c.connect_timeout, Duration::from_secs(5));
        assert_eq!(c.read_timeout, Duration::from_secs(7));
        assert_eq!(c.max_redirects, 3);
        assert_eq!(c.user_agent.as_deref(), Some("Test & Co"));
        assert!(!c.decoders.has_brotli());
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = FetchConfig::from_xml("<sfoglia><max-redirects>many</max-redirects></sfoglia>");
        assert!(matches!(
            err,
            Err(ConfigError::Value { element: "max-redirects", .. })
        ));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let c = FetchConfig::load(Path::new("/nonexistent/sfoglia/config.xml")).unwrap();
        assert_eq!(c, FetchConfig::default());
    }
}
