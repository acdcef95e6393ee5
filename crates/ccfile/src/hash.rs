/// Computes the archive lookup id for an asset name.
///
/// Each byte of the upper-cased name is added after rotating the running value left by
/// nine bits, i.e. `((r & 0x7F) << 9 | (r & 0xFF80) >> 7) + byte`, starting from zero.
/// Usable in `const` context so fixed ids can be spelled by name.
pub const fn name_id(name: &str) -> u16 {
    let bytes = name.as_bytes();
    let mut result = 0u16;
    let mut idx = 0usize;
    while idx < bytes.len() {
        let byte = bytes[idx].to_ascii_uppercase();
        result = result.rotate_left(9).wrapping_add(byte as u16);
        idx += 1;
    }
    result
}
