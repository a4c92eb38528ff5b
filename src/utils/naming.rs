//! Filename-safe naming for devices, tunnels and test profiles

/// Replace every character that is unsafe in a path segment or flent title with `_`
///
/// ASCII letters, digits, `-`, `_` and `.` are kept. An empty result becomes `_`
/// so the value can always be used as a directory name.
pub fn protect_for_filename(name: &str) -> String {
    let protected: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if protected.is_empty() {
        "_".to_string()
    } else {
        protected
    }
}
