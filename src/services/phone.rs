use anyhow::Context;
use phonenumber::country;
use phonenumber::Mode;

/// Turns a stored address-book phone and its ISO country code into an E.164
/// destination number, e.g. `("2025550143", "us")` -> `"+12025550143"`.
///
/// The number is only reformatted, never validated against numbering plans.
pub fn format_phone_number(phone: &str, country_code: &str) -> anyhow::Result<String> {
    let region: country::Id = country_code
        .trim()
        .to_uppercase()
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown country code: {country_code}"))?;

    let number = phonenumber::parse(Some(region), phone.trim())
        .with_context(|| format!("failed to parse phone number for {country_code}"))?;

    Ok(number.format().mode(Mode::E164).to_string())
}

/// Masks all but the first three and last four digits, for log output.
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 7))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_us_number() {
        assert_eq!(
            format_phone_number("2025550143", "US").unwrap(),
            "+12025550143"
        );
    }

    #[test]
    fn test_format_strips_punctuation_and_accepts_lowercase_country() {
        assert_eq!(
            format_phone_number("(202) 555-0143", "us").unwrap(),
            "+12025550143"
        );
    }

    #[test]
    fn test_format_national_prefix() {
        assert_eq!(
            format_phone_number("020 7946 0018", "GB").unwrap(),
            "+442079460018"
        );
    }

    #[test]
    fn test_format_unknown_country() {
        assert!(format_phone_number("2025550143", "ZZZ").is_err());
    }

    #[test]
    fn test_format_garbage_number() {
        assert!(format_phone_number("not a number", "US").is_err());
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+12025550143"), "+12*****0143");
        assert_eq!(mask_phone_number("12345"), "*****");
    }
}
