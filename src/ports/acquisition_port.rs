//! Market data acquisition port.

use crate::domain::bar::RawBar;
use crate::domain::error::QuantError;
use chrono::NaiveDate;

/// Source of raw daily bars for one symbol.
///
/// Implementations own their credentials. Any failure surfaces as
/// [`QuantError::AcquisitionFailed`]; callers do not retry.
pub trait AcquisitionPort {
    fn fetch(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RawBar>, QuantError>;
}
