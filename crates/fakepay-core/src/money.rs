//! Minor-unit amount formatting.

/// Format an amount in minor units as a two-decimal major-unit string (`12345` → `"123.45"`).
#[must_use]
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_decimals() {
        assert_eq!(format_minor_units(10_000), "100.00");
        assert_eq!(format_minor_units(12_345), "123.45");
        assert_eq!(format_minor_units(5), "0.05");
        assert_eq!(format_minor_units(-250), "-2.50");
        assert_eq!(format_minor_units(i64::MIN), "-92233720368547758.08");
    }
}
