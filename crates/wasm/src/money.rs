//! Quantity and price parsing, currency formatting.

/// Parse a quantity input. Blank or non-numeric text yields `None`.
pub fn parse_quantity(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|q| q.is_finite())
}

/// A quantity that drives selection: a finite number above zero.
pub fn positive_quantity(text: &str) -> Option<f64> {
    parse_quantity(text).filter(|q| *q > 0.0)
}

/// Parse a unit price such as `"$1,299.50"`.
///
/// Everything but digits and `.` is dropped, then the longest numeric
/// prefix is read (`"1.2.3"` reads as `1.2`).
pub fn parse_unit_price(raw: &str) -> Option<f64> {
    let kept: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    let mut end = kept.len();
    if let Some(first_dot) = kept.find('.')
        && let Some(second) = kept[first_dot + 1..].find('.')
    {
        end = first_dot + 1 + second;
    }

    let number = &kept[..end];
    if !number.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

/// `$` followed by the amount with two decimals.
pub fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

/// Display form of an incremented quantity: `3`, not `3.0`.
pub fn format_quantity(quantity: f64) -> String {
    format!("{quantity}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 3 "), Some(3.0));
        assert_eq!(parse_quantity("2.5"), Some(2.5));
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("abc"), None);
        assert_eq!(parse_quantity("NaN"), None);
    }

    #[test]
    fn test_positive_quantity() {
        assert_eq!(positive_quantity("1"), Some(1.0));
        assert_eq!(positive_quantity("0"), None);
        assert_eq!(positive_quantity("-2"), None);
    }

    #[test]
    fn test_parse_unit_price_strips_symbols() {
        assert_eq!(parse_unit_price("$10.00"), Some(10.0));
        assert_eq!(parse_unit_price("1,299.50"), Some(1299.5));
        assert_eq!(parse_unit_price("USD 5"), Some(5.0));
    }

    #[test]
    fn test_parse_unit_price_prefix() {
        assert_eq!(parse_unit_price("1.2.3"), Some(1.2));
        assert_eq!(parse_unit_price(".5"), Some(0.5));
    }

    #[test]
    fn test_parse_unit_price_invalid() {
        assert_eq!(parse_unit_price(""), None);
        assert_eq!(parse_unit_price("call us"), None);
        assert_eq!(parse_unit_price("."), None);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_currency(25.0), "$25.00");
        assert_eq!(format_currency(0.1 + 0.2), "$0.30");
        assert_eq!(format_quantity(3.0), "3");
        assert_eq!(format_quantity(2.5), "2.5");
    }
}
