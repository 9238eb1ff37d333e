use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Phone numbers: optional leading +, then 7 to 15 digits with optional
    /// single spaces or hyphens between digit groups
    /// - Valid: "+91 98765 43210", "9876543210", "020-2612-3456"
    /// - Invalid: "phone", "12", "+91--9876543210", "98765 43210 "
    pub static ref PHONE_REGEX: Regex =
        Regex::new(r"^\+?[0-9]+(?:[ -][0-9]+)*$").unwrap();

    /// Human-readable report identifiers: RPT-<year>-<6+ digit sequence>
    pub static ref REPORT_ID_REGEX: Regex = Regex::new(r"^RPT-[0-9]{4}-[0-9]{6,}$").unwrap();
}

/// Count the digits of a phone number accepted by [`PHONE_REGEX`]
pub fn phone_digit_count(phone: &str) -> usize {
    phone.chars().filter(|c| c.is_ascii_digit()).count()
}

/// `validator` custom rule for worker phone numbers
pub fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    let digits = phone_digit_count(phone);
    if PHONE_REGEX.is_match(phone) && (7..=15).contains(&digits) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("phone");
        err.message = Some("must be a phone number with 7 to 15 digits".into());
        Err(err)
    }
}
