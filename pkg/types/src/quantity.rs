//! Parsing of resource quantity strings (`100m`, `0.5`, `200Mi`, `1G`, `500000u`).
//!
//! Only the plain decimal form with an optional SI or binary suffix is
//! accepted. Exponent notation (`1e3`) is rejected.

use anyhow::{Result, bail};

fn suffix_ratio(suffix: &str) -> Option<(u128, u128)> {
    const KI: u128 = 1024;
    let ratio = match suffix {
        "n" => (1, 1_000_000_000),
        "u" => (1, 1_000_000),
        "m" => (1, 1000),
        "" => (1, 1),
        "k" => (1_000, 1),
        "M" => (1_000_000, 1),
        "G" => (1_000_000_000, 1),
        "T" => (1_000_000_000_000, 1),
        "P" => (1_000_000_000_000_000, 1),
        "E" => (1_000_000_000_000_000_000, 1),
        "Ki" => (KI, 1),
        "Mi" => (KI.pow(2), 1),
        "Gi" => (KI.pow(3), 1),
        "Ti" => (KI.pow(4), 1),
        "Pi" => (KI.pow(5), 1),
        "Ei" => (KI.pow(6), 1),
        _ => return None,
    };
    Some(ratio)
}

/// Parse a quantity into thousandths of its base unit, rounding up.
pub fn parse_millis(quantity: &str) -> Result<u128> {
    let split = quantity
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(quantity.len());
    let (number, suffix) = quantity.split_at(split);

    if number.is_empty() {
        bail!("quantity '{}' must start with a number", quantity);
    }
    let Some((num, den)) = suffix_ratio(suffix) else {
        bail!("quantity '{}' has unknown suffix '{}'", quantity, suffix);
    };

    let (whole, fraction) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        bail!("quantity '{}' is not a valid number", quantity);
    }

    let too_large = || anyhow::anyhow!("quantity '{}' is too large", quantity);
    let mut mantissa: u128 = 0;
    for c in whole.chars().chain(fraction.chars()) {
        let digit = u128::from(c as u8 - b'0');
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(digit))
            .ok_or_else(too_large)?;
    }
    let scale = 10u128
        .checked_pow(fraction.len() as u32)
        .ok_or_else(too_large)?;

    let numerator = mantissa
        .checked_mul(num)
        .and_then(|n| n.checked_mul(1000))
        .ok_or_else(too_large)?;
    let denominator = scale.checked_mul(den).ok_or_else(too_large)?;
    Ok(numerator.div_ceil(denominator))
}

/// CPU quantity in millicores (1000 = 1 core).
pub fn parse_cpu_millis(quantity: &str) -> Result<u64> {
    let millis = parse_millis(quantity)?;
    u64::try_from(millis).map_err(|_| anyhow::anyhow!("cpu quantity '{}' is too large", quantity))
}

/// Memory quantity in bytes.
pub fn parse_memory_bytes(quantity: &str) -> Result<u64> {
    let bytes = parse_millis(quantity)?.div_ceil(1000);
    u64::try_from(bytes)
        .map_err(|_| anyhow::anyhow!("memory quantity '{}' is too large", quantity))
}
