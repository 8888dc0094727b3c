//! Field validators shared by the form and the status administration.
//!
//! Signatures follow `validator`'s custom-function convention so they can be
//! plugged into `#[validate(custom(function = ...))]`.

use validator::ValidationError;

const INN10_WEIGHTS: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_FIRST_WEIGHTS: [u32; 10] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN12_SECOND_WEIGHTS: [u32; 11] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8];

pub const PROGRESS_MIN: i32 = 0;
pub const PROGRESS_MAX: i32 = 100;

/// Checks a Russian taxpayer id (ИНН).
///
/// Legal entities carry 10 digits with one control digit, individuals
/// carry 12 digits with two.
pub fn validate_inn(value: &str) -> Result<(), ValidationError> {
    if inn_is_valid(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("inn");
        err.message = Some("Enter a valid INN: 10 or 12 digits with a correct checksum.".into());
        Err(err)
    }
}

pub fn inn_is_valid(value: &str) -> bool {
    let digits: Option<Vec<u32>> = value.chars().map(|c| c.to_digit(10)).collect();
    let Some(digits) = digits else {
        return false;
    };
    match digits.len() {
        10 => control_digit(&digits[..9], &INN10_WEIGHTS) == digits[9],
        12 => {
            control_digit(&digits[..10], &INN12_FIRST_WEIGHTS) == digits[10]
                && control_digit(&digits[..11], &INN12_SECOND_WEIGHTS) == digits[11]
        }
        _ => false,
    }
}

/// `(Σ digit·weight mod 11) mod 10`.
pub fn control_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    sum % 11 % 10
}

/// Rejects empty or whitespace-only text with the `required` code.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_progress(value: i32) -> Result<(), ValidationError> {
    if (PROGRESS_MIN..=PROGRESS_MAX).contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new("range");
    err.add_param("min".into(), &PROGRESS_MIN);
    err.add_param("max".into(), &PROGRESS_MAX);
    err.message = Some(format!("Progress must be between {PROGRESS_MIN} and {PROGRESS_MAX}.").into());
    Err(err)
}
