//! Length clamping for overlong names.

/// Separates a truncated body from its hash.
pub const HASH_SEPARATOR: char = '~';

/// Number of hex digits of the name hash kept in a clamped key.
pub const HASH_LENGTH: usize = 8;

/// Short, stable digest of the full logical name.
pub fn name_hash(name: &str) -> String {
    blake3::hash(name.as_bytes()).to_hex().as_str()[..HASH_LENGTH].to_string()
}

/// Join escaped units into a body of at most `budget` bytes.
///
/// A body that already fits is returned whole. Otherwise as many leading
/// units as fit are kept and `~` plus the name hash is appended, so two long
/// names sharing a prefix still get different bodies. Returns `None` when not
/// even one unit fits next to the hash.
pub fn fit(units: &[String], budget: usize, name: &str) -> Option<String> {
    let total: usize = units.iter().map(String::len).sum();
    if total <= budget {
        return Some(units.concat());
    }

    let tail = format!("{}{}", HASH_SEPARATOR, name_hash(name));
    let mut body = String::new();
    for unit in units {
        if body.len() + unit.len() + tail.len() > budget {
            break;
        }
        body.push_str(unit);
    }

    if body.is_empty() {
        return None;
    }

    body.push_str(&tail);
    Some(body)
}
