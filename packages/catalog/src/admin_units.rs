//! Typed parser for the catalog's embedded admin-unit lists.
//!
//! Newer catalog records carry a serialized list of records like
//! `[{'adm1_code': 2387, 'adm1_name': 'Attiki'}, {'adm2_code': 23456,
//! 'adm2_name': 'Larisa'}]`. The serialization is Python-repr flavored
//! (single-quoted keys and strings), so the raw text is first converted
//! to strict JSON and then deserialized into a typed shape. Malformed
//! entries fail the whole parse — an entry must carry a complete
//! code/name pair at exactly one admin level.

use serde::Deserialize;

use crate::CatalogError;

/// A code/name reference to an administrative unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUnitRef {
    /// Boundary-dataset unit code.
    pub code: i64,
    /// Unit name as recorded by the catalog.
    pub name: String,
}

/// Parsed admin-unit references for one event, split by level and
/// sorted alphabetically by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUnitList {
    /// Level-1 (region) references.
    pub adm1: Vec<AdminUnitRef>,
    /// Level-2 (sub-region) references.
    pub adm2: Vec<AdminUnitRef>,
}

impl AdminUnitList {
    /// Whether the list carries no references at either level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adm1.is_empty() && self.adm2.is_empty()
    }
}

/// One raw entry of the embedded list. Exactly one level's code/name
/// pair must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    adm1_code: Option<i64>,
    adm1_name: Option<String>,
    adm2_code: Option<i64>,
    adm2_name: Option<String>,
}

/// Parses an embedded admin-unit list into a typed, validated shape.
///
/// # Errors
///
/// Returns [`CatalogError::MalformedAdminUnits`] if the text is not a
/// list of records or any entry lacks a complete code/name pair.
pub fn parse_admin_units(raw: &str) -> Result<AdminUnitList, CatalogError> {
    let json = normalize_quotes(raw);
    let entries: Vec<RawEntry> =
        serde_json::from_str(&json).map_err(|e| CatalogError::MalformedAdminUnits {
            message: e.to_string(),
        })?;

    let mut list = AdminUnitList::default();
    for entry in entries {
        match (entry.adm1_code, entry.adm1_name, entry.adm2_code, entry.adm2_name) {
            (Some(code), Some(name), None, None) => list.adm1.push(AdminUnitRef { code, name }),
            (None, None, Some(code), Some(name)) => list.adm2.push(AdminUnitRef { code, name }),
            _ => {
                return Err(CatalogError::MalformedAdminUnits {
                    message: "entry must carry a code/name pair at exactly one level".to_string(),
                });
            }
        }
    }

    list.adm1.sort_by(|a, b| a.name.cmp(&b.name));
    list.adm2.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(list)
}

/// Converts Python-repr single-quoted strings to JSON double-quoted
/// strings.
///
/// A `'` only opens a string when the previous structural character is
/// one of `[ { , :`, and only closes it when the next non-space
/// character is one of `, } ] :`. Apostrophes inside names
/// (`"N'Djamena"`) are therefore left alone. Double quotes already
/// present are passed through.
fn normalize_quotes(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    let mut last_structural = ' ';

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' && matches!(last_structural, '[' | '{' | ',' | ':' | ' ') {
            // Scan for the closing quote: a ' whose next non-space char
            // is structural.
            let mut j = i + 1;
            let mut content = String::new();
            while j < chars.len() {
                if chars[j] == '\'' {
                    let next = chars[j + 1..].iter().find(|ch| !ch.is_whitespace());
                    if next.is_none_or(|&ch| matches!(ch, ',' | '}' | ']' | ':')) {
                        break;
                    }
                }
                content.push(chars[j]);
                j += 1;
            }
            out.push('"');
            for ch in content.chars() {
                if ch == '"' {
                    out.push('\\');
                }
                out.push(ch);
            }
            out.push('"');
            i = j + 1;
            last_structural = '"';
        } else {
            if !c.is_whitespace() {
                last_structural = c;
            }
            out.push(c);
            i += 1;
        }
    }

    out
}
