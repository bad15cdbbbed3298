//! Embedded UI message catalogs.

use std::sync::OnceLock;

use serde_json::Value;
use tracing::error;

use crate::domain::Locale;

static EN: OnceLock<Value> = OnceLock::new();
static PL: OnceLock<Value> = OnceLock::new();

fn parse(locale: Locale, raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        error!(%locale, error = %e, "message catalog is not valid JSON");
        Value::Object(Default::default())
    })
}

/// The full catalog for `locale`.
pub fn messages(locale: Locale) -> &'static Value {
    match locale {
        Locale::En => EN.get_or_init(|| parse(locale, include_str!("../../messages/en.json"))),
        Locale::Pl => PL.get_or_init(|| parse(locale, include_str!("../../messages/pl.json"))),
    }
}

/// Looks up a dotted key such as `meta.home.title`.
pub fn text(locale: Locale, key: &str) -> Option<&'static str> {
    key.split('.')
        .try_fold(messages(locale), |node, part| node.get(part))
        .and_then(Value::as_str)
}

/// Like [`text`], falling back to the default locale and then to the key itself.
pub fn text_or_key(locale: Locale, key: &str) -> String {
    text(locale, key)
        .or_else(|| text(Locale::DEFAULT, key))
        .unwrap_or(key)
        .to_string()
}
