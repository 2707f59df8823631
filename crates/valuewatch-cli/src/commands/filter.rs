use serde::Serialize;
use serde_json::Value;
use valuewatch_core::{FilteringMode, FilteringResult, FilteringStatistics, MetricsExport};

use crate::cli::FilterArgs;
use crate::error::CliError;

use super::{collect_symbols, Context};

#[derive(Debug, Serialize)]
struct FilterResponseData {
    result: FilteringResult,
    filter_rate: f64,
    success_rate: f64,
    statistics: FilteringStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsExport>,
}

pub fn run(args: &FilterArgs, context: &Context) -> Result<Value, CliError> {
    let symbols = collect_symbols(&args.input)?;
    let mode = args.mode.map(FilteringMode::from);

    let result = context
        .filter
        .filter_symbols(&symbols, mode, &args.operation, true);
    let metrics = (args.metrics || args.include_records)
        .then(|| context.metrics.export_metrics(args.include_records));

    Ok(serde_json::to_value(FilterResponseData {
        filter_rate: result.filter_rate(),
        success_rate: result.success_rate(),
        statistics: context.filter.get_filtering_statistics(),
        result,
        metrics,
    })?)
}
