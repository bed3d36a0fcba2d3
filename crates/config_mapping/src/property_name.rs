//! Property name derivation.
//!
//! Members of a mapping are declared with code-style names (`clientId`,
//! `getClientId`) while configuration keys use dotted, hyphenated segments
//! (`client-id`). This module implements that translation.
//!
//! # Examples
//!
//! ```rust
//! use config_mapping::{property_name, NamingStrategy};
//!
//! let strategy = NamingStrategy::KebabCase;
//! assert_eq!(property_name("getClientId", None, true, strategy), "client-id");
//! assert_eq!(property_name("clientId", None, true, strategy), "client-id");
//! assert_eq!(property_name("clientId", Some("id"), true, strategy), "id");
//! ```

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "property_name_tests.rs"]
mod tests;

/// Strategy used to turn a member name into a key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStrategy {
    /// `clientId` becomes `client-id`.
    #[default]
    KebabCase,
    /// `clientId` becomes `client_id`.
    SnakeCase,
    /// The member name is used as is.
    Verbatim,
}

impl NamingStrategy {
    /// Applies the strategy to a member name.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingStrategy::KebabCase => skewer(name, '-'),
            NamingStrategy::SnakeCase => skewer(name, '_'),
            NamingStrategy::Verbatim => name.to_string(),
        }
    }
}

/// Derives the key segment for a mapping member.
///
/// # Arguments
///
/// * `declared` - The member name as declared (`getClientId`, `clientId`)
/// * `override_name` - Explicit key segment; used verbatim when present
/// * `accessor` - Whether the member is a nullary accessor. Only accessors
///   have their `get` prefix stripped.
/// * `strategy` - How the remaining name is converted
pub fn property_name(
    declared: &str,
    override_name: Option<&str>,
    accessor: bool,
    strategy: NamingStrategy,
) -> String {
    if let Some(name) = override_name {
        return name.to_string();
    }

    let base = if accessor {
        strip_accessor_prefix(declared)
    } else {
        declared
    };
    strategy.apply(base)
}

/// Strips a `get` prefix when it is followed by an uppercase letter.
///
/// `getClientId` yields `ClientId`; `getter` and `get` are returned unchanged.
pub fn strip_accessor_prefix(name: &str) -> &str {
    match name.strip_prefix("get") {
        Some(rest) if rest.chars().next().is_some_and(char::is_uppercase) => rest,
        _ => name,
    }
}

fn is_word_separator(c: char) -> bool {
    c == '_' || c == '-'
}

/// Splits camel humps with `separator` and lowercases the result.
///
/// Runs of uppercase letters are treated as one word, so `baseURLPath`
/// becomes `base-url-path`. Path characters (`.`, `*`, `[`, `]`) pass
/// through untouched.
fn skewer(name: &str, separator: char) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_lowercase() {
            out.push(c);
        } else if c.is_uppercase() {
            if i > 0 && !is_word_separator(chars[i - 1]) {
                out.push(separator);
            }
            out.extend(c.to_lowercase());

            // Start of the last uppercase letter in `out`, if it was the last
            // character pushed.
            let mut last_upper = None;
            let mut j = i + 1;
            while j < chars.len() {
                let u = chars[j];
                if u.is_uppercase() {
                    last_upper = Some(out.len());
                    out.extend(u.to_lowercase());
                } else if u.is_ascii_digit() || u == '-' {
                    last_upper = None;
                    out.push(u);
                } else {
                    // The last uppercase letter starts the next word.
                    if let (Some(start), true) = (last_upper, u.is_lowercase()) {
                        out.insert(start, separator);
                    }
                    break;
                }
                j += 1;
            }
            i = j;
            continue;
        } else if c.is_ascii_digit() || matches!(c, '.' | '*' | '[' | ']') {
            out.push(c);
        } else if i == 0 {
            out.push(c);
        } else if !is_word_separator(chars[i - 1]) {
            out.push(separator);
        }
        i += 1;
    }

    out
}
