//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum accepted winner-name length, in bytes.
pub const WINNER_NAME_MAX_LEN: usize = 100;

/// Validates a winner name: non-empty, at most 100 bytes, and free of
/// control characters other than tab, CR, and LF.
pub fn validate_winner_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("winner_name_empty");
        err.message = Some("winnerName is empty".into());
        return Err(err);
    }

    if name.len() > WINNER_NAME_MAX_LEN {
        let mut err = ValidationError::new("winner_name_length");
        err.message = Some(format!("winnerName too long (>{WINNER_NAME_MAX_LEN})").into());
        return Err(err);
    }

    if name
        .chars()
        .any(|c| (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r'))
    {
        let mut err = ValidationError::new("winner_name_control");
        err.message = Some("winnerName contains control characters".into());
        return Err(err);
    }

    Ok(())
}
