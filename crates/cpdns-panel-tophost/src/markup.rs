//! Record table extraction from the panel's DNS page
//!
//! The page renders one table row per record. The cells that matter carry
//! ids of the form `name-<id>` (displayed host label) and `value-<id>`
//! (displayed record value); `<id>` is the panel-internal record id the
//! mutation endpoint expects.

use cpdns_core::types::{PanelRecord, RecordTable};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static NAME_CELL: LazyLock<Regex> = LazyLock::new(|| cell_pattern("name"));
static VALUE_CELL: LazyLock<Regex> = LazyLock::new(|| cell_pattern("value"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([xX][0-9a-fA-F]+|[0-9]+);").expect("valid entity regex"));

fn cell_pattern(prefix: &str) -> Regex {
    Regex::new(&format!(
        r#"(?is)<td\s(?:[^>]*?\s)?id\s*=\s*["']{}-([^"']+)["'][^>]*>(.*?)</td\s*>"#,
        prefix
    ))
    .expect("valid cell regex")
}

/// Parse the record table out of the DNS page markup
///
/// Rows keep document order, so duplicate display names resolve to the
/// first row through [`RecordTable::find`]. A name cell without a matching
/// value cell yields a row with no current value. Markup without any name
/// cell yields an empty table.
pub fn parse_record_table(html: &str) -> RecordTable {
    let mut values: HashMap<String, String> = HashMap::new();
    for caps in VALUE_CELL.captures_iter(html) {
        values
            .entry(caps[1].to_string())
            .or_insert_with(|| cell_text(&caps[2]));
    }

    let records = NAME_CELL
        .captures_iter(html)
        .map(|caps| {
            let id = caps[1].to_string();
            PanelRecord {
                current_value: values.get(&id).cloned(),
                name: cell_text(&caps[2]),
                id,
            }
        })
        .collect();

    RecordTable::new(records)
}

/// Visible text of a cell: tags stripped, entities decoded, trimmed
fn cell_text(inner: &str) -> String {
    let without_tags = TAG.replace_all(inner, "");
    decode_entities(&without_tags).trim().to_string()
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures<'_>| {
        let code = &caps[1];
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        parsed
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    numeric
        .replace("&nbsp;", "\u{a0}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
