//! Validation operators: checks that pass the table through unchanged.

pub(crate) mod checks;
mod validators;

pub use validators::{
    CheckColumnsSatisfyRegex, CheckNumericColumns, CheckStringColumns,
    VerifyListColumnContainsOnlyInts, VerifyNoEmptyStrings, VerifyNoMissingData, VerifyNoNegatives,
};
