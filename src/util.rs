use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

/// A register name split around its first `[n]` index token.
///
/// `CH[2]` splits into prefix `CH` and index `2`; names without a token
/// keep their full text as prefix and carry no index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyKey<'a> {
    pub prefix: Cow<'a, str>,
    pub index: Option<u32>,
}

impl FamilyKey<'_> {
    /// The name opens a new family (`NAME[0]`)
    pub fn is_first(&self) -> bool {
        self.index == Some(0)
    }

    /// The name is element `index` of the family called `prefix`
    pub fn is_element(&self, prefix: &str, index: u32) -> bool {
        self.index == Some(index) && self.prefix == prefix
    }
}

fn index_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<head>[^\[]*)\[(?P<index>\d+)\](?P<tail>.*)$").unwrap())
}

pub fn family_key(name: &str) -> FamilyKey<'_> {
    let Some(caps) = index_token().captures(name) else {
        return FamilyKey {
            prefix: Cow::Borrowed(name),
            index: None,
        };
    };
    // overlong indices cannot be a family member
    let Ok(index) = caps["index"].parse::<u32>() else {
        return FamilyKey {
            prefix: Cow::Borrowed(name),
            index: None,
        };
    };
    let head = caps.name("head").map_or("", |m| m.as_str());
    let tail = caps.name("tail").map_or("", |m| m.as_str());
    let prefix = if tail.is_empty() {
        Cow::Borrowed(head)
    } else {
        Cow::Owned(format!("{head}{tail}"))
    };
    FamilyKey {
        prefix,
        index: Some(index),
    }
}

/// Drops every first-element index token from `name`.
///
/// Returns `None` when an unresolved token (any other index, or a stray
/// bracket) is left over: such names are only reachable through indexed
/// struct access.
pub fn resolve_first_index(name: &str) -> Option<Cow<'_, str>> {
    let mut resolved = Cow::Borrowed(name);
    loop {
        let key = family_key(&resolved);
        if !key.is_first() {
            break;
        }
        resolved = Cow::Owned(key.prefix.into_owned());
    }
    (!resolved.contains('[')).then_some(resolved)
}

/// Upper-cases the first character and lower-cases the rest.
///
/// This is not word-boundary aware: `PIOA` becomes `Pioa`.
pub fn camel(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Builds an upper-case constant name out of `parts` joined with `_`,
/// prefixed by `prefix` verbatim.
///
/// Returns `None` if any part still holds an unresolved index token.
pub fn constant_name(prefix: Option<&str>, parts: &[&str]) -> Option<String> {
    let mut name = prefix.unwrap_or_default().to_string();
    for (i, part) in parts.iter().enumerate() {
        if i != 0 {
            name.push('_');
        }
        name.push_str(&resolve_first_index(part)?.to_uppercase());
    }
    Some(name)
}

/// Replaces the `%s` dimension placeholder of an SVD name by `suffix`,
/// keeping surrounding brackets.
pub fn replace_index(name: &str, suffix: &str) -> String {
    name.replace("%s", suffix)
}

/// Replaces the `%s` dimension placeholder of an SVD name by `suffix`,
/// dropping surrounding brackets.
pub fn replace_suffix(name: &str, suffix: &str) -> String {
    if name.contains("[%s]") {
        name.replace("[%s]", suffix)
    } else {
        name.replace("%s", suffix)
    }
}

pub fn respace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `0x%08x` formatting used for addresses
pub fn hex(n: u32) -> String {
    format!("0x{n:08x}")
}

/// Description of an item, falling back to its name
pub fn description_or<'a>(description: &'a Option<String>, name: &'a str) -> String {
    respace(description.as_deref().unwrap_or(name))
}
