use serde::Serialize;
use serde_json::Value;
use valuewatch_core::{ErrorSummary, ErrorTrends};

use crate::cli::TrendsArgs;
use crate::error::CliError;

use super::{collect_symbols, Context};

#[derive(Debug, Serialize)]
struct TrendsResponseData {
    hours: u32,
    bucket_minutes: u32,
    valid_symbols: Vec<String>,
    summary: ErrorSummary,
    trends: ErrorTrends,
}

pub fn run(args: &TrendsArgs, context: &Context) -> Result<Value, CliError> {
    let symbols = collect_symbols(&args.input)?;

    let valid_symbols = context
        .filter
        .pre_filter_symbol_list(&symbols, "trends", true);
    let summary = context.metrics.get_error_summary(None);
    let trends = context
        .metrics
        .get_error_trends(args.hours, args.bucket_minutes);

    Ok(serde_json::to_value(TrendsResponseData {
        hours: args.hours,
        bucket_minutes: args.bucket_minutes,
        valid_symbols,
        summary,
        trends,
    })?)
}
