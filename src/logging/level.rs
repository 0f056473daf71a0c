use crate::error::{Result, SonicError};
use tracing::Level;

/// Spellings accepted on top of tracing's own level names
const ALIASES: [(&str, Level); 2] = [("WARNING", Level::WARN), ("CRITICAL", Level::ERROR)];

const BY_VERBOSITY: [Level; 5] = [
    Level::TRACE,
    Level::DEBUG,
    Level::INFO,
    Level::WARN,
    Level::ERROR,
];

pub fn parse_log_level(raw: &str) -> Result<Level> {
    let name = raw.trim();
    if let Some((_, level)) = ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
    {
        return Ok(*level);
    }
    name.parse::<Level>()
        .map_err(|_| SonicError::config(format!("Invalid log level: {}", raw)))
}

/// 0 for TRACE up to 4 for ERROR
#[allow(clippy::cast_possible_truncation)]
pub fn level_rank(level: Level) -> u8 {
    BY_VERBOSITY
        .iter()
        .position(|l| *l == level)
        .map_or(u8::MAX, |p| p as u8)
}

/// The more verbose of two levels
pub fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}
