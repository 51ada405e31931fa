//! Declared-filename validation.
//!
//! An upload filename is untrusted input and must be a single path
//! component. The guard is a pure predicate: rules run in a fixed order
//! and the first matching rule is returned, so rejections are
//! deterministic and log-friendly.

use crate::error::FilenameError;

/// Reserved device-style names, matched case-insensitively against the
/// component before the first dot (`CON.zip` resolves to the device on
/// Windows).
const RESERVED_NAMES: &[&str] = &["CON", "PRN", "AUX", "NUL"];

/// Shell metacharacter sequences rejected as defense-in-depth. The name
/// is never passed to a shell; this guards downstream misuse.
const SHELL_SEQUENCES: &[&str] = &["|", ";", "`", "$(", "&&"];

/// Validates an untrusted upload filename.
///
/// Rejects, in order: empty names, raw null/control bytes, path-traversal
/// segments (`..` components, URL-encoded traversal), any path separator,
/// drive prefixes, percent-encoded control sequences, reserved device
/// names, and shell metacharacters.
pub fn validate_filename(name: &str) -> Result<(), FilenameError> {
    if name.is_empty() {
        return Err(FilenameError::Empty);
    }

    if name.chars().any(|c| c < '\x20' || c == '\x7f') {
        return Err(FilenameError::ControlByte);
    }

    if name.split(['/', '\\']).any(|component| component == "..")
        || name.to_ascii_lowercase().contains("%2e%2e")
    {
        return Err(FilenameError::PathTraversal(name.into()));
    }

    if name.contains(['/', '\\']) {
        return Err(FilenameError::PathSeparator(name.into()));
    }

    // `Path::join` would treat `C:name` as drive-relative on Windows.
    if name.len() >= 2 && name.as_bytes()[1] == b':' {
        return Err(FilenameError::DrivePrefix(name.into()));
    }

    if let Some(seq) = find_encoded_control(name) {
        return Err(FilenameError::EncodedControl(seq));
    }

    let stem = name.split('.').next().unwrap_or(name);
    if is_reserved_name(stem) {
        return Err(FilenameError::ReservedName(stem.into()));
    }

    for seq in SHELL_SEQUENCES {
        if name.contains(seq) {
            return Err(FilenameError::ShellMetacharacter((*seq).into()));
        }
    }

    Ok(())
}

/// Finds a `%XX` sequence encoding an ASCII control byte (`%00`–`%1f`,
/// `%7f`), returning the matched sequence.
fn find_encoded_control(name: &str) -> Option<String> {
    for (i, &b) in name.as_bytes().iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let Some(hex) = name.get(i + 1..i + 3) else {
            continue;
        };
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            continue;
        }
        if let Ok(value) = u8::from_str_radix(hex, 16) {
            if value < 0x20 || value == 0x7f {
                return Some(format!("%{hex}"));
            }
        }
    }
    None
}

fn is_reserved_name(stem: &str) -> bool {
    let upper = stem.to_ascii_uppercase();
    if RESERVED_NAMES.contains(&upper.as_str()) {
        return true;
    }
    // COM1-COM9 and LPT1-LPT9.
    if upper.len() == 4 && (upper.starts_with("COM") || upper.starts_with("LPT")) {
        return matches!(upper.as_bytes()[3], b'1'..=b'9');
    }
    false
}
