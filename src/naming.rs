//! Identifier and file name sanitization.

use std::collections::{HashMap, HashSet};

/// Turn an arbitrary node name into a lowercase identifier.
///
/// Characters outside `[a-z0-9_-]` become `_`, runs of `_` collapse, and
/// leading/trailing `_` are trimmed. Identifiers may not start with a digit
/// or `-`, so those get an `el_` prefix.
pub fn sanitize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' {
            ch
        } else {
            '_'
        };
        if ch == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(ch);
    }
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        return "element".to_string();
    }
    if cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        return format!("el_{cleaned}");
    }
    cleaned.to_string()
}

/// `snake_case_name` to `SnakeCaseName`.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// File-system friendly base name (no extension), at most 100 characters.
pub fn sanitize_file_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        let ch = if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            ch
        } else {
            '_'
        };
        if ch == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(ch);
    }
    let trimmed: String = cleaned.trim_matches('_').chars().take(100).collect();
    if trimmed.is_empty() {
        "image".to_string()
    } else {
        trimmed
    }
}

/// Hands out file names that are unique within one upload batch.
#[derive(Debug, Default)]
pub struct FileNameAllocator {
    used: HashSet<String>,
}

impl FileNameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base`, or `base_1`, `base_2`, ... when taken. No extension is added.
    pub fn allocate(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;
        while self.used.contains(&candidate) {
            candidate = format!("{base}_{counter}");
            counter += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Deterministic identifiers for generated UI elements.
///
/// Every request gets a suffix from a single increasing counter, so two
/// siblings with the same sanitized name can never collide.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: usize,
    issued: HashMap<usize, String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for the element at `index`, stable across repeated calls.
    pub fn id_for(&mut self, index: usize, name: &str) -> String {
        if let Some(id) = self.issued.get(&index) {
            return id.clone();
        }
        self.next += 1;
        let id = format!("{name}_{}", self.next);
        self.issued.insert(index, id.clone());
        id
    }
}

/// Escape text for a C# string literal on a single line.
pub fn escape_csharp(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' | '\n' | '\u{2028}' | '\u{2029}' | '\u{0085}' | '\u{000B}' | '\u{000C}'
            | '\t' => out.push(' '),
            c => out.push(c),
        }
    }
    let mut collapsed = String::with_capacity(out.len());
    for ch in out.chars() {
        if ch.is_whitespace() && collapsed.ends_with(char::is_whitespace) {
            continue;
        }
        collapsed.push(ch);
    }
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_lowercases_and_collapses() {
        assert_eq!(sanitize_name("Main Menu / Play!"), "main_menu_play");
        assert_eq!(sanitize_name("root_Button  1"), "root_button_1");
        assert_eq!(sanitize_name("__x__"), "x");
    }

    #[test]
    fn sanitize_name_prefixes_leading_digits() {
        assert_eq!(sanitize_name("2nd"), "el_2nd");
        assert_eq!(sanitize_name("-1"), "el_-1");
        assert_eq!(sanitize_name("!!!"), "element");
    }

    #[test]
    fn pascal_case_joins_segments() {
        assert_eq!(to_pascal_case("main_menu"), "MainMenu");
        assert_eq!(to_pascal_case("el_2nd"), "El2nd");
    }

    #[test]
    fn file_names_keep_unicode_letters() {
        assert_eq!(sanitize_file_name("Кнопка play.png"), "Кнопка_play_png");
        assert_eq!(sanitize_file_name("  "), "image");
        assert_eq!(sanitize_file_name(&"a".repeat(150)).len(), 100);
    }

    #[test]
    fn file_name_allocator_suffixes_duplicates() {
        let mut files = FileNameAllocator::new();
        assert_eq!(files.allocate("icon"), "icon");
        assert_eq!(files.allocate("icon"), "icon_1");
        assert_eq!(files.allocate("icon"), "icon_2");
        assert_eq!(files.allocate("logo"), "logo");
    }

    #[test]
    fn id_allocator_is_monotonic_and_stable() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.id_for(0, "root_menu"), "root_menu_1");
        assert_eq!(ids.id_for(1, "root_menu_btn"), "root_menu_btn_2");
        assert_eq!(ids.id_for(2, "root_menu_btn"), "root_menu_btn_3");
        assert_eq!(ids.id_for(0, "ignored"), "root_menu_1");
    }

    #[test]
    fn escape_csharp_handles_quotes_and_breaks() {
        assert_eq!(escape_csharp("Say \"hi\"\nnow"), "Say \\\"hi\\\" now");
        assert_eq!(escape_csharp("a\\b\t\tc"), "a\\\\b c");
    }
}
