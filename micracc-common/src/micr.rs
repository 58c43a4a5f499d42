//! MICR field model
//!
//! Types shared between the ground-truth sources, the recognition
//! collaborators, and the classification engine:
//! - `GroundTruthRecord`: the raw four-field MICR record for a check
//! - override strings: operator corrections in the X9 symbolic alphabet
//! - `ExpectedFields`: the (routing, account, check number) triple a
//!   recognition result is compared against
//! - `RecognitionOutcome`: per-engine recognition results

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transit symbol - frames the routing number in an override string
pub const TRANSIT_SYMBOL: char = 'T';
/// On-us symbol - terminates the account number
pub const ON_US_SYMBOL: char = 'U';
/// Amount symbol - reserved, not part of the expected triple
pub const AMOUNT_SYMBOL: char = 'A';
/// Dash symbol - reserved, not part of the expected triple
pub const DASH_SYMBOL: char = 'D';

/// Raw ground-truth record for one check, as recorded in the corpus.
///
/// All fields are optional at the document layer so that a record with
/// missing fields loads fine and only fails when a comparison actually
/// needs it (the failure then belongs to that single check, not the run).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundTruthRecord {
    /// Payor bank routing number (8 digits, without check digit)
    pub payor_bank_routing_number: Option<String>,
    /// Routing check digit (appended to the routing number)
    pub payor_bank_check_digit: Option<String>,
    /// On-us field, conventionally ending in a `/` delimiter
    pub on_us: Option<String>,
    /// Auxiliary on-us field, carries the check number when present
    pub auxiliary_on_us: Option<String>,
}

/// Expected field triple a recognition result must reproduce exactly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFields {
    pub routing_number: String,
    pub account_number: String,
    /// Absent when the ground truth carries no auxiliary on-us field
    pub check_number: Option<String>,
}

/// One engine's recognition result for a check.
///
/// Engines may return richer per-character detail; anything beyond the
/// three compared fields is ignored here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineFields {
    #[serde(default)]
    pub routing_number: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub check_number: Option<String>,
}

/// Recognition results keyed by engine name.
///
/// BTreeMap keeps iteration order stable across runs; the match test
/// walks engines in name order.
pub type RecognitionOutcome = BTreeMap<String, EngineFields>;

impl GroundTruthRecord {
    /// Derive the expected triple from the raw four-field record.
    ///
    /// - routing = `payorBankRoutingNumber` + `payorBankCheckDigit`
    /// - account = `onUs` with a trailing `/` rewritten to the on-us
    ///   symbol `U` (left unchanged when there is no trailing `/`)
    /// - check number = `auxiliaryOnUs` when present, else absent
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when the routing number, check
    /// digit, or on-us field is missing.
    pub fn expected_fields(&self) -> Result<ExpectedFields> {
        let routing = self
            .payor_bank_routing_number
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("missing payorBankRoutingNumber".to_string()))?;
        let check_digit = self
            .payor_bank_check_digit
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("missing payorBankCheckDigit".to_string()))?;
        let on_us = self
            .on_us
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("missing onUs".to_string()))?;

        let account_number = match on_us.strip_suffix('/') {
            Some(stem) => format!("{}{}", stem, ON_US_SYMBOL),
            None => on_us.to_string(),
        };

        Ok(ExpectedFields {
            routing_number: format!("{}{}", routing, check_digit),
            account_number,
            check_number: self.auxiliary_on_us.clone(),
        })
    }
}

/// Decode an operator override string into the expected triple.
///
/// Override strings use the X9 symbolic alphabet: the routing number is
/// framed by the two `T` symbols, the account number sits between the
/// second `T` and the `U` symbol, and anything after the `U` is the
/// check number (absent when empty). `A` and `D` belong to the amount
/// and dash fields and do not take part in this extraction.
///
/// # Errors
///
/// Returns `Error::InvalidInput` when either `T` delimiter or the `U`
/// delimiter is missing.
pub fn decode_override(raw: &str) -> Result<ExpectedFields> {
    let first_t = raw
        .find(TRANSIT_SYMBOL)
        .ok_or_else(|| Error::InvalidInput(format!("override missing transit symbol: {}", raw)))?;
    let second_t = raw[first_t + 1..]
        .find(TRANSIT_SYMBOL)
        .map(|i| first_t + 1 + i)
        .ok_or_else(|| {
            Error::InvalidInput(format!("override missing second transit symbol: {}", raw))
        })?;
    let on_us = raw[second_t + 1..]
        .find(ON_US_SYMBOL)
        .map(|i| second_t + 1 + i)
        .ok_or_else(|| Error::InvalidInput(format!("override missing on-us symbol: {}", raw)))?;

    let check = &raw[on_us + 1..];
    Ok(ExpectedFields {
        routing_number: raw[first_t + 1..second_t].to_string(),
        account_number: raw[second_t + 1..on_us].to_string(),
        check_number: if check.is_empty() {
            None
        } else {
            Some(check.to_string())
        },
    })
}

impl EngineFields {
    /// Exact-equality match against the expected triple. No trimming,
    /// no normalization: the engine must reproduce the strings as-is.
    pub fn matches(&self, expected: &ExpectedFields) -> bool {
        self.routing_number.as_deref() == Some(expected.routing_number.as_str())
            && self.account_number.as_deref() == Some(expected.account_number.as_str())
            && self.check_number == expected.check_number
    }
}
