//! INI-style configuration files.
//!
//! A config is a set of named sections, each mapping keys to string values.
//! The `general` section always exists and collects entries that appear
//! before the first `[section]` header. Sections and keys are kept sorted,
//! which is also the order they are saved and iterated in.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::string::FromUtf8Error;

const GENERAL: &str = "general";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Utf8(FromUtf8Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Utf8(err) => write!(f, "invalid UTF-8: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Utf8(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<FromUtf8Error> for ConfigError {
    fn from(err: FromUtf8Error) -> ConfigError {
        ConfigError::Utf8(err)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSection {
    entries: BTreeMap<String, String>,
    /// Kept for the caller's benefit; never written out.
    comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    sections: BTreeMap<String, ConfigSection>,
}

impl Default for Config {
    fn default() -> Config {
        let mut sections = BTreeMap::new();
        sections.insert(GENERAL.to_string(), ConfigSection::default());
        Config { sections }
    }
}

impl Config {
    fn section_mut(&mut self, name: &str) -> &mut ConfigSection {
        self.sections.entry(name.to_string()).or_default()
    }

    /// Copies every section and entry of `other` over this config.
    fn merge(&mut self, other: &Config) {
        for (name, section) in other.sections.iter() {
            let target = self.section_mut(name);
            for (key, value) in section.entries.iter() {
                target.entries.insert(key.clone(), value.clone());
            }
        }
    }
}

fn trim_name(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t')
}

fn trim_value(s: &str) -> &str {
    s.trim_start_matches(|c| c == ' ' || c == '\t')
        .trim_end_matches(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n')
}

/// Parses a config one line at a time.
pub fn load_config_from<R: BufRead>(mut reader: R) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let mut current = GENERAL.to_string();
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        let line = String::from_utf8(raw.clone())?;
        let line = trim_value(&line);

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            if let Some(end) = rest.find(']') {
                current = trim_name(&rest[..end]).to_string();
                config.section_mut(&current);
            }
            continue;
        }

        if let Some(eq) = line.find('=') {
            let key = trim_value(&line[..eq]);
            let value = trim_value(&line[eq + 1..]);
            if !key.is_empty() {
                config
                    .section_mut(&current)
                    .entries
                    .insert(key.to_string(), value.to_string());
            }
        }
    }

    Ok(config)
}

/// Writes every section, including empty ones, followed by a blank line.
pub fn save_config_to<W: Write>(mut writer: W, config: &Config) -> Result<(), ConfigError> {
    for (name, section) in config.sections.iter() {
        writeln!(writer, "[{}]", name)?;
        for (key, value) in section.entries.iter() {
            writeln!(writer, "{}={}", key, value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn al_create_config() -> Config {
    Config::default()
}

pub fn al_destroy_config(config: Option<Config>) {
    drop(config)
}

pub fn al_load_config_file<P: AsRef<Path>>(filename: P) -> Option<Config> {
    let path = filename.as_ref();
    let result = File::open(path)
        .map_err(ConfigError::from)
        .and_then(|file| load_config_from(BufReader::new(file)));
    match result {
        Ok(config) => {
            debug!("Loaded config {}", path.display());
            Some(config)
        }
        Err(err) => {
            warn!("Could not load config {}: {}", path.display(), err);
            None
        }
    }
}

/// Reads a config from an already open stream. `origin` only names it in
/// log output.
pub fn al_load_config_f(file: &mut dyn BufRead, origin: &str) -> Option<Config> {
    match load_config_from(file) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!("Could not load config {}: {}", origin, err);
            None
        }
    }
}

pub fn al_save_config_file<P: AsRef<Path>>(filename: P, config: &Config) -> bool {
    let path = filename.as_ref();
    let result = File::create(path)
        .map_err(ConfigError::from)
        .and_then(|file| save_config_to(BufWriter::new(file), config));
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!("Could not save config {}: {}", path.display(), err);
            false
        }
    }
}

pub fn al_save_config_f(file: &mut dyn Write, config: &Config) -> bool {
    save_config_to(file, config).is_ok()
}

/// Does nothing if the section already exists.
pub fn al_add_config_section(config: &mut Config, name: &str) {
    config.section_mut(name);
}

/// `None` attaches the comment to the `general` section.
pub fn al_add_config_comment(config: &mut Config, section: Option<&str>, comment: &str) {
    config
        .section_mut(section.unwrap_or(GENERAL))
        .comments
        .push(comment.to_string());
}

pub fn al_remove_config_section(config: &mut Config, section: &str) -> bool {
    config.sections.remove(section).is_some()
}

pub fn al_remove_config_key(config: &mut Config, section: Option<&str>, key: &str) -> bool {
    config
        .sections
        .get_mut(section.unwrap_or(GENERAL))
        .map_or(false, |s| s.entries.remove(key).is_some())
}

/// `None` looks in the `general` section. A missing section or key gives
/// `default_value`.
pub fn al_get_config_value<'a>(
    config: &'a Config,
    section: Option<&str>,
    key: &str,
    default_value: Option<&'a str>,
) -> Option<&'a str> {
    config
        .sections
        .get(section.unwrap_or(GENERAL))
        .and_then(|s| s.entries.get(key))
        .map(String::as_str)
        .or(default_value)
}

/// Creates the section if needed and overwrites any existing value.
pub fn al_set_config_value(config: &mut Config, section: Option<&str>, key: &str, value: &str) {
    config
        .section_mut(section.unwrap_or(GENERAL))
        .entries
        .insert(key.to_string(), value.to_string());
}

/// Snapshot of the section names taken by `al_get_first_config_section`.
#[derive(Debug, Clone, Default)]
pub struct ConfigSectionCursor {
    names: Vec<String>,
    next: usize,
}

/// Snapshot of one section's keys taken by `al_get_first_config_entry`.
#[derive(Debug, Clone, Default)]
pub struct ConfigEntryCursor {
    keys: Vec<String>,
    next: usize,
}

fn advance(items: &[String], next: &mut usize) -> Option<String> {
    let item = items.get(*next)?.clone();
    *next += 1;
    Some(item)
}

pub fn al_get_first_config_section(config: &Config, iterator: &mut ConfigSectionCursor) -> Option<String> {
    *iterator = ConfigSectionCursor {
        names: config.sections.keys().cloned().collect(),
        next: 0,
    };
    al_get_next_config_section(iterator)
}

pub fn al_get_next_config_section(iterator: &mut ConfigSectionCursor) -> Option<String> {
    advance(&iterator.names, &mut iterator.next)
}

pub fn al_get_first_config_entry(
    config: &Config,
    section: Option<&str>,
    iterator: &mut ConfigEntryCursor,
) -> Option<String> {
    let keys = config
        .sections
        .get(section.unwrap_or(GENERAL))
        .map(|s| s.entries.keys().cloned().collect())
        .unwrap_or_default();
    *iterator = ConfigEntryCursor { keys, next: 0 };
    al_get_next_config_entry(iterator)
}

pub fn al_get_next_config_entry(iterator: &mut ConfigEntryCursor) -> Option<String> {
    advance(&iterator.keys, &mut iterator.next)
}

/// A new config holding both inputs. Entries from `cfg2` win.
pub fn al_merge_config(cfg1: &Config, cfg2: &Config) -> Config {
    let mut merged = cfg1.clone();
    merged.merge(cfg2);
    merged
}

pub fn al_merge_config_into(master: &mut Config, add: &Config) {
    master.merge(add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Config {
        load_config_from(Cursor::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn general_section_always_exists() {
        let config = al_create_config();
        let mut cursor = ConfigSectionCursor::default();
        assert_eq!(al_get_first_config_section(&config, &mut cursor).as_deref(), Some("general"));
        assert_eq!(al_get_next_config_section(&mut cursor), None);
    }

    #[test]
    fn parsing_trims_and_skips_comments() {
        let config = parse(
            "top = level\r\n\
             ; comment\n\
             # another\n\
             \n\
             [ video ]\n\
             \twidth\t=  640 \r\n\
             height=480\n\
             junk line\n\
             [audio]\n\
             volume=\n",
        );
        assert_eq!(al_get_config_value(&config, None, "top", None), Some("level"));
        assert_eq!(al_get_config_value(&config, Some("video"), "width", None), Some("640"));
        assert_eq!(al_get_config_value(&config, Some("video"), "height", None), Some("480"));
        assert_eq!(al_get_config_value(&config, Some("audio"), "volume", None), Some(""));
        assert_eq!(al_get_config_value(&config, Some("video"), "depth", Some("32")), Some("32"));
        assert_eq!(al_get_config_value(&config, Some("missing"), "x", None), None);
    }

    #[test]
    fn repeated_keys_overwrite() {
        let config = parse("[a]\nk=1\n[b]\n[a]\nk=2\n");
        assert_eq!(al_get_config_value(&config, Some("a"), "k", None), Some("2"));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let result = load_config_from(Cursor::new(vec![b'k', b'=', 0xff, b'\n']));
        assert!(matches!(result, Err(ConfigError::Utf8(_))));
    }

    #[test]
    fn save_writes_every_section_in_order() {
        let mut config = al_create_config();
        al_set_config_value(&mut config, Some("zeta"), "b", "2");
        al_set_config_value(&mut config, Some("zeta"), "a", "1");
        al_add_config_section(&mut config, "alpha");
        al_add_config_comment(&mut config, Some("alpha"), "not saved");

        let mut out = Vec::new();
        save_config_to(&mut out, &config).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[alpha]\n\n[general]\n\n[zeta]\na=1\nb=2\n\n"
        );
    }

    #[test]
    fn file_round_trip() {
        let mut config = al_create_config();
        al_set_config_value(&mut config, Some("player"), "name", "ada");
        al_set_config_value(&mut config, Some("player"), "lives", "3");
        al_set_config_value(&mut config, Some("keys"), "fire", "space");
        al_set_config_value(&mut config, Some("keys"), "jump", "up");

        let path = std::env::temp_dir().join(format!("allegro-shim-{}.cfg", std::process::id()));
        assert!(al_save_config_file(&path, &config));
        let loaded = al_load_config_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, Some(config));
    }

    #[test]
    fn missing_file_gives_none() {
        assert_eq!(al_load_config_file("/nonexistent/dir/settings.cfg"), None);
    }

    #[test]
    fn stream_helpers() {
        let mut reader = Cursor::new(b"[s]\nk=v\n".to_vec());
        let config = al_load_config_f(&mut reader, "memory").unwrap();
        let mut out = Vec::new();
        assert!(al_save_config_f(&mut out, &config));
        assert_eq!(parse(std::str::from_utf8(&out).unwrap()), config);
    }

    #[test]
    fn removal() {
        let mut config = parse("k=v\n[s]\na=1\n");
        assert!(al_remove_config_key(&mut config, None, "k"));
        assert!(!al_remove_config_key(&mut config, None, "k"));
        assert!(al_remove_config_section(&mut config, "s"));
        assert!(!al_remove_config_section(&mut config, "s"));
        assert!(!al_remove_config_key(&mut config, Some("s"), "a"));
    }

    #[test]
    fn entry_cursor_walks_keys() {
        let config = parse("[s]\nb=2\na=1\nc=3\n");
        let mut cursor = ConfigEntryCursor::default();
        let mut keys = Vec::new();
        let mut key = al_get_first_config_entry(&config, Some("s"), &mut cursor);
        while let Some(k) = key {
            keys.push(k);
            key = al_get_next_config_entry(&mut cursor);
        }
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(al_get_first_config_entry(&config, Some("none"), &mut cursor), None);
    }

    #[test]
    fn merge_prefers_the_second_config() {
        let first = parse("[s]\na=1\nb=1\n[only_first]\nx=1\n");
        let second = parse("[s]\nb=2\nc=2\n");
        let merged = al_merge_config(&first, &second);
        assert_eq!(al_get_config_value(&merged, Some("s"), "a", None), Some("1"));
        assert_eq!(al_get_config_value(&merged, Some("s"), "b", None), Some("2"));
        assert_eq!(al_get_config_value(&merged, Some("s"), "c", None), Some("2"));
        assert_eq!(al_get_config_value(&merged, Some("only_first"), "x", None), Some("1"));

        let mut master = first.clone();
        al_merge_config_into(&mut master, &second);
        assert_eq!(master, merged);
    }
}
