//! PEP503 package name normalization

use regex::Regex;
use std::sync::LazyLock;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("separator pattern is valid"));

static VALID_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").expect("name pattern is valid")
});

/// Normalize a package name per PEP503: runs of `-`, `_` and `.` collapse
/// into a single `-`, and the result is lowercased.
///
/// ```
/// use warehub_core::normalize_name;
/// assert_eq!(normalize_name("Django_REST..framework"), "django-rest-framework");
/// ```
pub fn normalize_name(name: &str) -> String {
    SEPARATORS.replace_all(name, "-").to_lowercase()
}

/// Whether `name` is already in normalized form
pub fn is_normalized(name: &str) -> bool {
    normalize_name(name) == name
}

/// Whether `name` is a valid Python distribution name (PEP 508): ASCII
/// letters, digits, `-`, `_` and `.`, starting and ending alphanumeric.
pub fn is_valid_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

/// Package name derived from a repository basename.
///
/// Camel-case word boundaries become separators before normalization, so
/// `PythonPackage` maps to `python-package` and `HTTPServer` to
/// `http-server`.
pub fn default_package_name(basename: &str) -> String {
    normalize_name(&split_camel_case(basename))
}

fn split_camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }
        out.push(c);
    }

    out
}
