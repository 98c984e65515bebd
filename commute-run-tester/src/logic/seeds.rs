use anyhow::{Context, Result, bail};
use chrono::Utc;

/// Resolve a list of CLI seed arguments into concrete seeds.
///
/// Supports decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and the keyword `random`, which draws a seed from the current
/// time. Duplicates are dropped while preserving order.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("random") {
            time_seed()
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16)
                .with_context(|| format!("invalid hexadecimal seed '{token}'"))?
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else {
            bail!("unrecognized seed '{token}' (expected an integer, 0x-hex, or 'random')");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        bail!("no seeds supplied");
    }
    Ok(seeds)
}

fn time_seed() -> u64 {
    let now = Utc::now();
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp());
    nanos.unsigned_abs()
}
