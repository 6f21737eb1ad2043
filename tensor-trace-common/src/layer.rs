use crate::LAYER_ID_NONE;

/// Extracts the transformer layer index from a tensor name of the form
/// `blk.<N>.*`. Returns [`LAYER_ID_NONE`] for any name that does not match
/// the pattern, including a value that overflows 16 bits or isn't a valid
/// non-negative integer.
pub fn extract_layer_id(name: &str) -> u16 {
    let Some(rest) = name.strip_prefix("blk.") else {
        return LAYER_ID_NONE;
    };
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 {
        return LAYER_ID_NONE;
    }
    match rest[..digits_end].parse::<u32>() {
        Ok(n) if n < LAYER_ID_NONE as u32 => n as u16,
        _ => LAYER_ID_NONE,
    }
}
