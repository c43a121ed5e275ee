use std::collections::HashMap;
use std::fs;
use std::str::FromStr;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "DEEPDROP_CONFIG";
/// Config file used when `DEEPDROP_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "deepdrop.conf";
/// Environment variable holding the relay port.
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 3000;

/// INI-style configuration: `key = value` lines, optional `[section]` headers,
/// `#` comments. Keys before the first section are globals.
#[derive(Debug)]
pub struct Config {
    pub globals: HashMap<String, String>,
    pub sections: HashMap<String, HashMap<String, String>>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Error reading file {path}: {e}"))?;
        Ok(Self::parse(&content))
    }

    /// Load the file named by `DEEPDROP_CONFIG` (or `deepdrop.conf`).
    ///
    /// A missing file yields an empty config; every key has a default.
    pub fn load_from_env() -> Self {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::load(&path).unwrap_or_else(|_| Self::empty())
    }

    pub fn parse(content: &str) -> Self {
        let mut globals = HashMap::new();
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current_section: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = &line[1..line.len() - 1];
                current_section = Some(name.trim().to_string());
                continue;
            }

            if let Some(pos) = line.find('=') {
                let key = line[..pos].trim().to_string();
                let value = line[pos + 1..].trim().trim_matches('"').to_string();

                match &current_section {
                    None => {
                        globals.insert(key, value);
                    }
                    Some(sec) => {
                        sections.entry(sec.clone()).or_default().insert(key, value);
                    }
                }
            }
        }
        Config { globals, sections }
    }

    pub fn empty() -> Self {
        Self {
            globals: HashMap::new(),
            sections: HashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|sec| sec.get(key))
            .map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section, key).filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn get_global(&self, key: &str) -> Option<&str> {
        self.globals.get(key).map(|s| s.as_str())
    }

    #[must_use]
    pub fn get_non_empty_or_default<'a>(
        &'a self,
        section: &str,
        key: &str,
        default: &'a str,
    ) -> &'a str {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .unwrap_or(default)
    }

    /// Section value (or global fallback) parsed as `T`; unparsable values are
    /// treated as absent.
    #[must_use]
    pub fn get_parsed<T: FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.get_non_empty(section, key)
            .or_else(|| self.get_global(key).filter(|s| !s.is_empty()))
            .and_then(|v| v.parse().ok())
    }

    /// Relay bind address: `[relay] bind_addr`, else `0.0.0.0:$PORT`.
    #[must_use]
    pub fn relay_bind_addr(&self) -> String {
        if let Some(addr) = self.get_non_empty("relay", "bind_addr") {
            return addr.to_owned();
        }
        format!("0.0.0.0:{}", port_from_env())
    }
}

/// `PORT` from the environment, falling back to 3000 when unset or invalid.
pub fn port_from_env() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
