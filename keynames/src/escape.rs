//! Per-character escaping of logical names.

/// Marker written after every character that changes under lowercasing.
///
/// Case-insensitive file systems would otherwise fold `A` and `a` onto the
/// same file.
pub const CASE_MARKER: char = '_';

/// Introduces a `%XX` escape of one UTF-8 byte.
pub const ESCAPE: char = '%';

/// Device names that Windows refuses as a file name part, whatever the
/// extension.
const RESERVED: &[&str] = &[
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Check whether a character has a distinct lowercase form.
pub fn folds(c: char) -> bool {
    !c.to_lowercase().eq(std::iter::once(c))
}

/// Check whether a character may appear unescaped in a storage key.
pub fn is_safe(c: char) -> bool {
    c != ESCAPE && (c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Escape a name into units, one per input character.
///
/// Keeping the units separate lets the clamping step truncate without
/// splitting an escape sequence or detaching a case marker.
pub fn escape_units(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let forced = reserved_part_starts(&chars);

    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let at_edge = i == 0 || i + 1 == chars.len();
            let mut unit = String::new();
            if forced[i] || !is_safe(c) || (c == '.' && at_edge) {
                push_escaped(&mut unit, c);
            } else {
                unit.push(c);
                if folds(c) {
                    unit.push(CASE_MARKER);
                }
            }
            unit
        })
        .collect()
}

/// Escape a whole name without clamping.
pub fn escape(name: &str) -> String {
    escape_units(name).concat()
}

fn push_escaped(unit: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for b in c.encode_utf8(&mut buf).bytes() {
        unit.push(ESCAPE);
        unit.push(HEX[(b >> 4) as usize] as char);
        unit.push(HEX[(b & 0x0f) as usize] as char);
    }
}

/// Mark the first character of every `.`-separated part that spells a
/// reserved device name.
fn reserved_part_starts(chars: &[char]) -> Vec<bool> {
    let mut forced = vec![false; chars.len()];
    let mut start = 0;
    for end in 0..=chars.len() {
        if end == chars.len() || chars[end] == '.' {
            if end > start {
                let part: String = chars[start..end].iter().collect();
                if RESERVED.contains(&part.as_str()) {
                    forced[start] = true;
                }
            }
            start = end + 1;
        }
    }
    forced
}
