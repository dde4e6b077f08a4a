//! Symbol universe: parsing symbol lists and the built-in default universe.

use crate::domain::error::EdgeFinderError;
use crate::ports::config_port::ConfigPort;
use crate::ports::universe_port::UniversePort;
use std::collections::HashSet;

pub const DEFAULT_UNIVERSE: [&str; 10] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "JPM", "JNJ", "V",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("symbol universe is empty")]
    Empty,

    #[error("invalid symbol '{0}': only letters, digits, '.', '^' and '-' are allowed")]
    InvalidSymbol(String),
}

/// Normalizes one ticker: trimmed, uppercased, limited to `[A-Z0-9.^-]`.
pub fn parse_symbol(token: &str) -> Result<String, UniverseError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(UniverseError::EmptyToken);
    }
    let symbol = trimmed.to_uppercase();
    let valid = symbol
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '-'));
    if !valid || symbol.chars().all(|c| c == '.') {
        return Err(UniverseError::InvalidSymbol(trimmed.to_string()));
    }
    Ok(symbol)
}

/// Parses a comma-separated symbol list, uppercasing each symbol.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let symbol = parse_symbol(token)?;
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Universe backed by a fixed list, the built-in one unless configured otherwise.
#[derive(Debug, Clone)]
pub struct StaticUniverse {
    symbols: Vec<String>,
}

impl StaticUniverse {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    /// Reads `[screener] universe`, falling back to [`DEFAULT_UNIVERSE`].
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, UniverseError> {
        match config
            .get_string("screener", "universe")
            .filter(|s| !s.trim().is_empty())
        {
            Some(list) => Ok(Self::new(parse_symbols(&list)?)),
            None => Ok(Self::default()),
        }
    }
}

impl Default for StaticUniverse {
    fn default() -> Self {
        Self::new(DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect())
    }
}

impl UniversePort for StaticUniverse {
    fn default_universe(&self) -> Result<Vec<String>, EdgeFinderError> {
        if self.symbols.is_empty() {
            return Err(UniverseError::Empty.into());
        }
        Ok(self.symbols.clone())
    }
}

/// Explicit list first, then `[screener] symbols`, then the universe port.
pub fn resolve_symbols(
    explicit: Option<&str>,
    config: Option<&dyn ConfigPort>,
    universe: &dyn UniversePort,
) -> Result<Vec<String>, EdgeFinderError> {
    if let Some(list) = explicit {
        return Ok(parse_symbols(list)?);
    }

    if let Some(list) = config
        .and_then(|c| c.get_string("screener", "symbols"))
        .filter(|s| !s.trim().is_empty())
    {
        return Ok(parse_symbols(&list)?);
    }

    universe.default_universe()
}
