//! # Control Numbers
//!
//! Human-readable document references: `FAC-000042`, `REC-000007`.
//!
//! The sequence itself lives in the database (`document_counters`) and is
//! bumped inside the same SQL transaction that inserts the document. This
//! module only knows how to format and parse the result.

use crate::error::ValidationError;
use crate::types::{Settings, TransactionKind};

/// Zero padding of the sequence part.
pub const SEQUENCE_WIDTH: usize = 6;

/// Formats `{PREFIX}-{seq:06}`. The prefix is upper-cased.
///
/// ## Example
/// ```rust
/// use orderdesk_core::control::format_control_number;
///
/// assert_eq!(format_control_number("fac", 42), "FAC-000042");
/// assert_eq!(format_control_number("REC", 1_234_567), "REC-1234567");
/// ```
pub fn format_control_number(prefix: &str, sequence: i64) -> String {
    format!(
        "{}-{:0width$}",
        prefix.trim().to_uppercase(),
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Splits a control number back into prefix and sequence.
pub fn parse_control_number(control: &str) -> Result<(String, i64), ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "control_number".to_string(),
        reason: "expected PREFIX-NNNNNN".to_string(),
    };

    let (prefix, seq) = control.rsplit_once('-').ok_or_else(invalid)?;
    if prefix.is_empty() || !seq.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let seq = seq.parse::<i64>().map_err(|_| invalid())?;

    Ok((prefix.to_string(), seq))
}

/// The prefix configured for a document kind.
pub fn prefix_for(settings: &Settings, kind: TransactionKind) -> &str {
    match kind {
        TransactionKind::Invoice => &settings.invoice_prefix,
        TransactionKind::Payment => &settings.payment_prefix,
    }
}
