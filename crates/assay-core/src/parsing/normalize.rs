use std::collections::HashMap;
use std::sync::LazyLock;

/// Normalize an analyte name from a lab report to a canonical key.
///
/// Steps:
/// 1. Drop a trailing unit annotation like " (%)" or " (% w/w)"
/// 2. Spell out the delta sign ("Δ9-THC" -> "delta9-thc")
/// 3. Lowercase, replace separators with underscores and collapse them
/// 4. Look up in alias map
pub fn normalize_analyte(raw: &str) -> String {
    let mut s = raw.trim().to_string();

    // "CBD (%)" -> "CBD", but keep "(a)"-style qualifiers that are part of a name
    if let Some(idx) = s.rfind('(') {
        let after = &s[idx..];
        if after.contains('%') || after.to_lowercase().contains("mg/g") {
            s = s[..idx].trim_end().to_string();
        }
    }

    let s = s.replace(['Δ', 'δ'], "delta").to_lowercase();

    let mut result = String::with_capacity(s.len());
    let mut prev_underscore = true; // start true to skip leading underscores
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_underscore = false;
        } else if !prev_underscore {
            result.push('_');
            prev_underscore = true;
        }
    }
    if result.ends_with('_') {
        result.pop();
    }

    if let Some(canonical) = ALIASES.get(result.as_str()) {
        canonical.to_string()
    } else {
        result
    }
}

static ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Delta-9-THC
    m.insert("d9_thc", "d9_thc");
    m.insert("d9thc", "d9_thc");
    m.insert("delta9_thc", "d9_thc");
    m.insert("delta_9_thc", "d9_thc");
    m.insert("delta9thc", "d9_thc");
    m.insert("thc", "d9_thc");
    m.insert("delta_9_tetrahydrocannabinol", "d9_thc");
    m.insert("tetrahydrocannabinol", "d9_thc");

    // THCA
    m.insert("thca", "thca");
    m.insert("thc_a", "thca");
    m.insert("thca_a", "thca");
    m.insert("tetrahydrocannabinolic_acid", "thca");

    // Delta-8-THC
    m.insert("d8_thc", "d8_thc");
    m.insert("d8thc", "d8_thc");
    m.insert("delta8_thc", "d8_thc");
    m.insert("delta_8_thc", "d8_thc");
    m.insert("delta8thc", "d8_thc");
    m.insert("delta_8_tetrahydrocannabinol", "d8_thc");

    // Varins
    m.insert("thcv", "thcv");
    m.insert("tetrahydrocannabivarin", "thcv");
    m.insert("cbdv", "cbdv");
    m.insert("cannabidivarin", "cbdv");

    // CBD family
    m.insert("cbd", "cbd");
    m.insert("cannabidiol", "cbd");
    m.insert("cbda", "cbda");
    m.insert("cbd_a", "cbda");
    m.insert("cannabidiolic_acid", "cbda");

    // Minors
    m.insert("cbg", "cbg");
    m.insert("cannabigerol", "cbg");
    m.insert("cbga", "cbga");
    m.insert("cbg_a", "cbga");
    m.insert("cannabigerolic_acid", "cbga");
    m.insert("cbn", "cbn");
    m.insert("cannabinol", "cbn");
    m.insert("cbc", "cbc");
    m.insert("cannabichromene", "cbc");

    m
});
