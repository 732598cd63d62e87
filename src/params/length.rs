//! Length input in the host's notation. The model unit is the inch.

use regex::Regex;

pub const INCHES_PER_FOOT: f64 = 12.0;
const INCHES_PER_MM: f64 = 1.0 / 25.4;

const LENGTH_PATTERN: &str = r#"^\s*(?P<sign>-)?\s*(?:(?P<feet>\d+(?:\.\d*)?|\.\d+)\s*')?\s*(?:(?P<value>\d+(?:\.\d*)?|\.\d+)\s*(?P<unit>"|mm|cm|m)?)?\s*$"#;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LengthError {
    #[error("`{0}` is not a length")]
    Malformed(String),
    #[error("`{0}` mixes feet with a metric unit")]
    MixedUnits(String),
    #[error("length pattern failed to compile: {0}")]
    Pattern(String),
}

/// Parse `10'`, `1'6"`, `6"`, `25mm`, `2.5cm`, `1.2m` or a bare number
/// (inches) into inches.
pub fn parse_length(text: &str) -> Result<f64, LengthError> {
    let pattern = Regex::new(LENGTH_PATTERN).map_err(|err| LengthError::Pattern(err.to_string()))?;
    let captures = pattern
        .captures(text)
        .ok_or_else(|| LengthError::Malformed(text.to_owned()))?;

    let feet = captures.name("feet").map(|m| m.as_str());
    let value = captures.name("value").map(|m| m.as_str());
    let unit = captures.name("unit").map_or("\"", |m| m.as_str());

    if feet.is_none() && value.is_none() {
        return Err(LengthError::Malformed(text.to_owned()));
    }
    if feet.is_some() && value.is_some() && unit != "\"" {
        return Err(LengthError::MixedUnits(text.to_owned()));
    }

    let parse = |digits: &str| {
        digits
            .parse::<f64>()
            .map_err(|_| LengthError::Malformed(text.to_owned()))
    };

    let mut inches = 0.0;
    if let Some(feet) = feet {
        inches += parse(feet)? * INCHES_PER_FOOT;
    }
    if let Some(value) = value {
        let magnitude = parse(value)?;
        inches += match unit {
            "mm" => magnitude * INCHES_PER_MM,
            "cm" => magnitude * 10.0 * INCHES_PER_MM,
            "m" => magnitude * 1000.0 * INCHES_PER_MM,
            _ => magnitude,
        };
    }

    if captures.name("sign").is_some() {
        inches = -inches;
    }
    Ok(inches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn bare_numbers_are_inches() {
        assert_eq!(parse_length("0"), Ok(0.0));
        assert_eq!(parse_length(" 2.5 "), Ok(2.5));
        assert_eq!(parse_length("6\""), Ok(6.0));
    }

    #[test]
    fn feet_and_feet_inch_pairs() {
        assert_eq!(parse_length("10'"), Ok(120.0));
        assert_eq!(parse_length("1'6\""), Ok(18.0));
        assert_eq!(parse_length("1' 6"), Ok(18.0));
        assert_eq!(parse_length("-2'"), Ok(-24.0));
    }

    #[test]
    fn metric_units() {
        assert!(close(parse_length("25.4mm").unwrap(), 1.0));
        assert!(close(parse_length("2.54cm").unwrap(), 1.0));
        assert!(close(parse_length("1m").unwrap(), 1000.0 / 25.4));
    }

    #[test]
    fn rejects_garbage_and_mixed_units() {
        assert!(matches!(parse_length("ten feet"), Err(LengthError::Malformed(_))));
        assert!(matches!(parse_length(""), Err(LengthError::Malformed(_))));
        assert!(matches!(parse_length("1'20cm"), Err(LengthError::MixedUnits(_))));
    }
}
