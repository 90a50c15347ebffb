use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Opaque string id for new records (snowflake rendered in decimal).
pub fn new_id() -> String {
    snowflake_id().to_string()
}

/// Lowercase and strip diacritics: "Añil Bordado" -> "anil bordado".
///
/// Characters are decomposed (NFD) and combining marks dropped, so the
/// result only differs from the input in case and accents.
pub fn fold_text(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// URL slug: accent-folded, lowercase, ASCII alphanumerics joined by `-`.
///
/// Returns an empty string when nothing alphanumeric is left.
pub fn slugify(s: &str) -> String {
    let folded = fold_text(s);
    let mut out = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_text() {
        assert_eq!(fold_text("Añil Bordado"), "anil bordado");
        assert_eq!(fold_text("CAFÉ"), "cafe");
        assert_eq!(fold_text("ya-folded"), "ya-folded");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bolso de Rafia Ñandú"), "bolso-de-rafia-nandu");
        assert_eq!(slugify("  Cojín  bordado -- azul! "), "cojin-bordado-azul");
        assert_eq!(slugify("¿?"), "");
    }

    #[test]
    fn test_new_id_is_numeric_and_positive() {
        let id = new_id();
        let n: i64 = id.parse().unwrap();
        assert!(n > 0);
    }
}
