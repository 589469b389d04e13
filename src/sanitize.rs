/// Characters rejected by Windows filenames; also covers the POSIX path
/// separator. Removed outright, not substituted.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names Windows reserves regardless of extension.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turns an arbitrary issue title into a single path segment valid on both
/// POSIX and Windows. Distinct inputs may collide after cleaning; callers
/// resolve collisions through the existence check alone.
pub fn clean_folder_name(name: &str, replace_spaces: bool, space_replacement: &str) -> String {
    let mut cleaned: String = name.chars().filter(|c| !INVALID_CHARS.contains(c)).collect();

    if replace_spaces {
        cleaned = cleaned.replace(' ', space_replacement);
    }

    // Reserved device names and leading dots (hidden on Linux) get an
    // underscore escape. Checked after space handling so "c o n" collapsed
    // to "con" is still caught.
    let upper = cleaned.to_uppercase();
    if RESERVED_NAMES.contains(&upper.as_str()) || cleaned.starts_with('.') {
        cleaned.insert(0, '_');
    }

    cleaned
}
