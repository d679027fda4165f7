/// Returns the set of bases an IUPAC ambiguity ("wobble") code stands for.
/// Plain bases and multi-character symbols are not wobble codes and return None.
/// # Arguments
/// * `symbol` - the definition symbol to check
pub fn wobble_bases(symbol: &str) -> Option<&'static str> {
    let mut chars = symbol.chars();
    let code = chars.next()?;
    if chars.next().is_some() {
        return None;
    }

    match code {
        'R' => Some("AG"),
        'Y' => Some("CT"),
        'S' => Some("CG"),
        'W' => Some("AT"),
        'K' => Some("GT"),
        'M' => Some("AC"),
        'B' => Some("CGT"),
        'D' => Some("AGT"),
        'H' => Some("ACT"),
        'V' => Some("ACG"),
        'N' => Some("ACGT"),
        _ => None
    }
}

/// Returns true if the symbol is an IUPAC wobble code
pub fn is_wobble(symbol: &str) -> bool {
    wobble_bases(symbol).is_some()
}
