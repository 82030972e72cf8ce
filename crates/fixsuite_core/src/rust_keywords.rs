//! Rust keyword vocabulary (for emitted identifier escaping).

/// Strict, reserved and path keywords in Rust. `self`, `Self`, `super` and `crate` cannot be raw identifiers, so the
/// naming rules escape every entry here with a trailing underscore instead of `r#`.
pub const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
    "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn", "abstract", "become", "box",
    "do", "final", "gen", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Check whether an identifier is a Rust keyword.
pub fn is_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(&name)
}
