use crate::parser::classify::classify_line;
use crate::unit::{Unit, UnitKind};

/// Parse template text into one unit per non-blank line.
///
/// Blank lines never produce a unit; they are covered by whatever the
/// reducer does with their neighbours.
pub(crate) fn parse_units(source: &str) -> Vec<Unit> {
    let mut depth = NestingDepth::default();
    let mut units = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let kind = classify_line(line);
        let line_number = idx + 1;
        units.push(Unit {
            kind,
            content: line.to_string(),
            start_line: line_number,
            end_line: line_number,
            nesting_level: depth.record(kind),
        });
    }

    units
}

/// Running control-construct depth. Never goes below zero, so stray `end`
/// actions are tolerated.
#[derive(Debug, Default)]
struct NestingDepth {
    current: usize,
}

impl NestingDepth {
    /// Advance past a unit of `kind` and return the depth it is recorded at.
    fn record(&mut self, kind: UnitKind) -> usize {
        if kind.is_open() {
            let level = self.current;
            self.current += 1;
            level
        } else if kind.is_close() {
            self.current = self.current.saturating_sub(1);
            self.current
        } else if kind.is_continuation() {
            self.current.saturating_sub(1)
        } else {
            self.current
        }
    }
}
