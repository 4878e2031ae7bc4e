// i18n.rs
//
// Runtime string tables:
// - assets/i18n/<lang>.json ({ "key": "value" }) or
//   assets/i18n.json ({ "<lang>": { "key": "value" } })
// - searched next to the executable, then in the working directory
// - English is compiled in and used as the fallback table
// - tr("key") / tr_with("key", &[("name", ..)]) with {name} placeholders
//
// Language selection: --lang <code>, env PANORAMA_LANG, default "en".

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

const BUILTIN_EN: &str = include_str!("../assets/i18n/en.json");

#[derive(Debug, Clone)]
struct Tables {
    lang: String,
    map: HashMap<String, String>,
    fallback: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<Tables>> = OnceCell::new();

static BUILTIN: Lazy<HashMap<String, String>> =
    Lazy::new(|| serde_json::from_str(BUILTIN_EN).unwrap_or_default());

fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.join("assets"));
        }
    }
    dirs.push(PathBuf::from("assets"));
    dirs
}

fn read_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn read_multi(path: &Path, lang: &str) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let mut all: HashMap<String, HashMap<String, String>> = serde_json::from_str(&text).ok()?;
    all.remove(lang)
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    for dir in candidate_dirs() {
        if let Some(m) = read_map(&dir.join("i18n").join(format!("{lang}.json"))) {
            return m;
        }
        if let Some(m) = read_multi(&dir.join("i18n.json"), lang) {
            return m;
        }
    }
    HashMap::new()
}

fn builtin() -> &'static HashMap<String, String> {
    &BUILTIN
}

/// Install tables for `lang`. Later calls replace the current language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let mut fallback = builtin().clone();
    if lang != FALLBACK_LANG {
        fallback.extend(load_lang(FALLBACK_LANG));
    }
    let map = load_lang(&lang);
    if map.is_empty() && lang != FALLBACK_LANG {
        log::warn!("no strings for language {lang:?}, using {FALLBACK_LANG}");
    }

    let tables = Tables {
        lang,
        map,
        fallback,
    };
    match I18N.get() {
        Some(lock) => {
            if let Ok(mut w) = lock.write() {
                *w = tables;
            }
        }
        None => {
            let _ = I18N.set(RwLock::new(tables));
        }
    }
}

pub fn current_lang() -> String {
    I18N.get()
        .and_then(|l| l.read().ok().map(|t| t.lang.clone()))
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

/// Localized text for `key`; the key itself when nothing matches.
/// Before `init` only the compiled-in English table is consulted.
pub fn tr(key: &str) -> String {
    let Some(lock) = I18N.get() else {
        return builtin().get(key).cloned().unwrap_or_else(|| key.to_string());
    };
    let Ok(t) = lock.read() else {
        return key.to_string();
    };
    t.map
        .get(key)
        .or_else(|| t.fallback.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// `tr` with `{name}` placeholders substituted. Unknown placeholders stay.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        s = s.replace(&format!("{{{k}}}"), v);
    }
    s
}

pub fn resolve_lang_from_args() -> String {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--lang" {
            if let Some(v) = it.next() {
                return v;
            }
        }
    }

    if let Ok(v) = std::env::var("PANORAMA_LANG") {
        if !v.trim().is_empty() {
            return v;
        }
    }

    FALLBACK_LANG.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let m = builtin();
        assert!(m.contains_key("app.title"));
    }

    #[test]
    fn builtin_table_is_parsed_once() {
        assert!(std::ptr::eq(builtin(), builtin()));
    }

    #[test]
    fn placeholders_and_missing_keys() {
        init("en");
        assert_eq!(tr("no.such.key"), "no.such.key");
        let s = tr_with("log.image_loaded_size", &[("w", "8".into()), ("h", "4".into())]);
        assert!(s.contains('8') && s.contains('4'));
        assert!(!s.contains("{w}"));
    }
}
