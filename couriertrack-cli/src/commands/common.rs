//! Common types and utilities shared across CLI commands.

use couriertrack::geo::Position;

/// Parse a `LAT,LON` pair for clap.
pub fn parse_position(value: &str) -> Result<Position, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{}'", value))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;

    let position = Position::new(latitude, longitude);
    position.validate().map_err(|e| e.to_string())?;
    Ok(position)
}

/// Mask all but the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        assert_eq!(
            parse_position("21.15, 79.09").unwrap(),
            Position::new(21.15, 79.09)
        );
        assert_eq!(
            parse_position("-33.86,151.2").unwrap(),
            Position::new(-33.86, 151.2)
        );
    }

    #[test]
    fn test_parse_position_rejects_bad_input() {
        assert!(parse_position("21.15").is_err());
        assert!(parse_position("north,79").is_err());
        assert!(parse_position("91,0").is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abcdefgh"), "****efgh");
        assert_eq!(mask_secret("abc"), "***");
    }
}
