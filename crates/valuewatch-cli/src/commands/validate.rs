use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use valuewatch_core::{ValidationResult, ValidationStats};

use crate::cli::ValidateArgs;
use crate::error::CliError;

use super::{collect_symbols, Context};

#[derive(Debug, Serialize)]
struct ValidateResponseData {
    results: BTreeMap<String, ValidationResult>,
    stats: ValidationStats,
}

pub fn run(args: &ValidateArgs, context: &Context) -> Result<Value, CliError> {
    let symbols = collect_symbols(&args.input)?;
    if symbols.is_empty() {
        return Err(CliError::Command("no symbols given".to_owned()));
    }

    let results = context
        .validator
        .batch_validate_symbols(&symbols)
        .into_iter()
        .collect();
    let stats = context.validator.get_validation_stats();

    Ok(serde_json::to_value(ValidateResponseData { results, stats })?)
}
