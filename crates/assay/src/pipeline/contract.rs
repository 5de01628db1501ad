//! Construction-time checks on stage signatures.

use crate::error::{AssayError, Result};

use super::stage::{Signature, Stage};

/// Check that a stage can sit in a pipeline.
pub fn validate_stage(stage: &dyn Stage) -> Result<()> {
    validate_signature(&stage.signature())
}

/// Check a declared signature.
///
/// Only the first parameter and the return type matter. Bound parameters
/// beyond the first are configuration and are never inspected.
pub fn validate_signature(signature: &Signature) -> Result<()> {
    let first = signature
        .params
        .first()
        .ok_or_else(|| invalid(signature, "must accept at least one argument."))?;

    if first.bound || !first.kind.is_table() {
        return Err(invalid(
            signature,
            &format!(
                "first argument must be a table, but parameter '{}' is declared as '{}'{}.",
                first.name,
                first.kind,
                if first.bound { " and is bound" } else { "" }
            ),
        ));
    }

    match &signature.returns {
        Some(returns) if !returns.is_table() => Err(invalid(
            signature,
            &format!(
                "has return type annotation '{}', but must return a Table.",
                returns
            ),
        )),
        _ => Ok(()),
    }
}

fn invalid(signature: &Signature, message: &str) -> AssayError {
    let err = AssayError::InvalidSignature {
        stage: signature.name.clone(),
        message: message.to_string(),
    };
    tracing::error!(stage = %signature.name, "{}", err);
    err
}
