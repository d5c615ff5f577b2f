pub mod classify;
mod structural;

pub use classify::{classify_line, is_control_line};

use crate::unit::Unit;

/// Parser entry point.
///
/// Parsing is total: any text produces a unit sequence, and syntax that is
/// not recognized degrades to plain content.
pub struct Parser<'a> {
    source: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser { source }
    }

    /// Split the source into one unit per non-blank line.
    pub fn parse(&self) -> Vec<Unit> {
        structural::parse_units(self.source)
    }
}

/// Shorthand for `Parser::new(source).parse()`.
pub fn parse(source: &str) -> Vec<Unit> {
    Parser::new(source).parse()
}
