//! Label patterns for CCCD field extraction.
//!
//! Labels are matched in English: bilingual cards print both languages and
//! the OCR model reads the Latin-only English labels far more reliably.
//! Label and value must sit on the same line.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 12-digit citizen identity number after "No" / "No." / "No:"
    pub static ref ID_NUMBER: Regex = Regex::new(
        r"(?i)\bNo\b\.?[ \t]*:?[ \t]*(\d{12})\b"
    ).unwrap();

    // Also matches "Full name"
    pub static ref FULL_NAME: Regex = Regex::new(
        r"(?i)\bname\b[ \t]*:?[ \t]*(\S[^\r\n]*)"
    ).unwrap();

    pub static ref DATE_OF_BIRTH: Regex = Regex::new(
        r"(?i)\bdate[ \t]+of[ \t]+birth\b[ \t]*:?[ \t]*(\d{2}/\d{2}/\d{4})\b"
    ).unwrap();

    pub static ref SEX: Regex = Regex::new(
        r"(?i)\bsex\b[ \t]*:?[ \t]*(\S[^\r\n]*)"
    ).unwrap();

    pub static ref NATIONALITY: Regex = Regex::new(
        r"(?i)\bnationality\b[ \t]*:?[ \t]*(\S[^\r\n]*)"
    ).unwrap();

    pub static ref PLACE_OF_ORIGIN: Regex = Regex::new(
        r"(?i)\bplace[ \t]+of[ \t]+origin\b[ \t]*:?[ \t]*(\S[^\r\n]*)"
    ).unwrap();

    pub static ref PLACE_OF_RESIDENCE: Regex = Regex::new(
        r"(?i)\bplace[ \t]+of[ \t]+residence\b[ \t]*:?[ \t]*(\S[^\r\n]*)"
    ).unwrap();

    pub static ref DATE_OF_EXPIRY: Regex = Regex::new(
        r"(?i)\bdate[ \t]+of[ \t]+expiry\b[ \t]*:?[ \t]*(\d{2}/\d{2}/\d{4})\b"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_number_requires_twelve_digits() {
        assert!(ID_NUMBER.is_match("No.123456789012"));
        assert!(ID_NUMBER.is_match("Số / No.: 001099012345"));
        assert!(!ID_NUMBER.is_match("No.12345678901"));
        assert!(!ID_NUMBER.is_match("No.1234567890123"));
        assert!(!ID_NUMBER.is_match("Nationality 123456789012"));
    }

    #[test]
    fn test_labels_do_not_span_lines() {
        assert!(!SEX.is_match("Sex:\nMALE"));
        assert!(!DATE_OF_BIRTH.is_match("Date of\nbirth 01/01/1990"));
    }

    #[test]
    fn test_name_label_variants() {
        let caps = FULL_NAME.captures("Họ và tên / Full name: NGUYEN VAN A").unwrap();
        assert_eq!(&caps[1], "NGUYEN VAN A");
        assert!(!FULL_NAME.is_match("Surname"));
    }
}
