mod filter;
mod trends;
mod validate;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;
use valuewatch_core::{
    ErrorMetrics, FilterConfig, MarketDataSource, MetricsConfig, StaticMarketData, SymbolFilter,
    SymbolValidator, ValidatorConfig,
};

use crate::cli::{Cli, Command, SymbolInput};
use crate::error::CliError;
use crate::output::Envelope;

/// Components wired together once per invocation.
pub struct Context {
    pub metrics: Arc<ErrorMetrics>,
    pub validator: Arc<SymbolValidator>,
    pub filter: SymbolFilter,
}

impl Context {
    pub fn build(snapshot: Option<&Path>) -> Result<Self, CliError> {
        let source: Arc<dyn MarketDataSource> = match snapshot {
            Some(path) => {
                let source = StaticMarketData::from_path(path)?;
                info!(path = %path.display(), symbols = source.len(), "snapshot loaded");
                Arc::new(source)
            }
            None => Arc::new(StaticMarketData::new()),
        };

        let metrics = Arc::new(ErrorMetrics::new(MetricsConfig::from_env()?));
        let validator = Arc::new(SymbolValidator::new(source, ValidatorConfig::from_env()?));
        let filter = SymbolFilter::new(validator.clone(), metrics.clone(), FilterConfig::from_env()?);

        Ok(Self {
            metrics,
            validator,
            filter,
        })
    }
}

pub fn run(cli: &Cli) -> Result<Envelope, CliError> {
    let context = Context::build(cli.snapshot.as_deref())?;

    let data: Value = match &cli.command {
        Command::Validate(args) => validate::run(args, &context)?,
        Command::Filter(args) => filter::run(args, &context)?,
        Command::Trends(args) => trends::run(args, &context)?,
    };

    Ok(Envelope::new(
        Uuid::new_v4().to_string(),
        cli.command.name(),
        data,
    ))
}

/// Positional symbols followed by those read from `--symbols-file`.
pub fn collect_symbols(input: &SymbolInput) -> Result<Vec<String>, CliError> {
    let mut symbols = input.symbols.clone();
    if let Some(path) = &input.symbols_file {
        let contents = std::fs::read_to_string(path)?;
        symbols.extend(parse_symbol_lines(&contents));
    }
    Ok(symbols)
}

fn parse_symbol_lines(contents: &str) -> impl Iterator<Item = String> + '_ {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
}
