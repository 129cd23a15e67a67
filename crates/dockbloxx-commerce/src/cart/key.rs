//! Cart identity keys.
//!
//! Two cart entries are the same purchasable item exactly when their keys
//! are equal. The key is a pure function of product id, variation id and
//! the selected options, so it can be derived anywhere (server-rendered
//! pages, the cart drawer, persisted snapshots) and always agree.
//!
//! Canonical form: `<product>[:<variation>][|name=value;name=value]`.
//! Option names and values are trimmed and lower-cased, empty values are
//! dropped, and pairs are sorted.

use crate::catalog::VariantOption;
use crate::ids::{ProductId, VariationId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    /// Derive the key for a product, optional variation and selected options.
    pub fn new(
        product_id: ProductId,
        variation_id: Option<VariationId>,
        options: &[VariantOption],
    ) -> Self {
        let mut key = product_id.to_string();
        if let Some(variation) = variation_id {
            key.push(':');
            key.push_str(&variation.to_string());
        }

        let pairs = canonical_options(options);
        if !pairs.is_empty() {
            key.push('|');
            let encoded: Vec<String> = pairs
                .iter()
                .map(|(name, value)| format!("{}={}", escape(name), escape(value)))
                .collect();
            key.push_str(&encoded.join(";"));
        }

        Self(key)
    }

    /// Parse and re-canonicalise a key received from outside the store.
    ///
    /// Returns `None` for malformed input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (ids, opts) = match raw.split_once('|') {
            Some((ids, opts)) => (ids, Some(opts)),
            None => (raw, None),
        };

        let (product, variation) = match ids.split_once(':') {
            Some((p, v)) => (p, Some(v)),
            None => (ids, None),
        };
        let product_id: ProductId = product.parse().ok()?;
        let variation_id = match variation {
            Some(v) => Some(v.parse::<VariationId>().ok()?),
            None => None,
        };

        let mut options = Vec::new();
        if let Some(opts) = opts {
            for pair in opts.split(';').filter(|p| !p.is_empty()) {
                let (name, value) = pair.split_once('=')?;
                options.push(VariantOption::new(unescape(name)?, unescape(value)?));
            }
        }

        Some(Self::new(product_id, variation_id, &options))
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Product id encoded in the key.
    pub fn product_id(&self) -> Option<ProductId> {
        let end = self.0.find([':', '|']).unwrap_or(self.0.len());
        self.0.get(..end)?.parse().ok()
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn canonical_options(options: &[VariantOption]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = options
        .iter()
        .map(|o| (o.name.trim().to_lowercase(), o.value.trim().to_lowercase()))
        .filter(|(name, value)| !name.is_empty() && !value.is_empty())
        .collect();
    pairs.sort();
    pairs.dedup();
    pairs
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            '|' => out.push_str("%7C"),
            ';' => out.push_str("%3B"),
            '=' => out.push_str("%3D"),
            ':' => out.push_str("%3A"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('%') {
        out.push_str(rest.get(..pos)?);
        let code = rest.get(pos + 1..pos + 3)?;
        out.push(match code {
            "25" => '%',
            "7C" => '|',
            "3B" => ';',
            "3D" => '=',
            "3A" => ':',
            _ => return None,
        });
        rest = rest.get(pos + 3..)?;
    }
    out.push_str(rest);
    Some(out)
}
