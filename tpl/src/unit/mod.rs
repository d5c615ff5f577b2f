use std::fmt;

/// Syntactic kind of a template unit.
///
/// Kinds fall into the structural groups the reducer cares about:
/// control-open (`if`, `range`, `with`, `define`, `block`), control-close
/// (`end`), control-continuation (`else`, `else if`) and cross-reference
/// (`template`, `include`). Everything else is content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Plain YAML text with no template action.
    Plain,
    /// `{{ .Values.something }}`
    Expression,
    If,
    Range,
    With,
    Define,
    Block,
    Else,
    ElseIf,
    End,
    Template,
    Include,
    /// `{{/* ... */}}`
    Comment,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Plain => "plain",
            UnitKind::Expression => "expression",
            UnitKind::If => "if",
            UnitKind::Range => "range",
            UnitKind::With => "with",
            UnitKind::Define => "define",
            UnitKind::Block => "block",
            UnitKind::Else => "else",
            UnitKind::ElseIf => "else_if",
            UnitKind::End => "end",
            UnitKind::Template => "template",
            UnitKind::Include => "include",
            UnitKind::Comment => "comment",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self,
            UnitKind::If | UnitKind::Range | UnitKind::With | UnitKind::Define | UnitKind::Block
        )
    }

    pub fn is_close(&self) -> bool {
        matches!(self, UnitKind::End)
    }

    pub fn is_continuation(&self) -> bool {
        matches!(self, UnitKind::Else | UnitKind::ElseIf)
    }

    pub fn is_cross_reference(&self) -> bool {
        matches!(self, UnitKind::Template | UnitKind::Include)
    }

    /// Open, close or continuation.
    pub fn is_control(&self) -> bool {
        self.is_open() || self.is_close() || self.is_continuation()
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An addressable piece of a template, tagged with its syntactic kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub kind: UnitKind,
    /// Source text of the unit, line terminators removed.
    pub content: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    /// Depth of enclosing control constructs. An opener is recorded at the
    /// depth before it increments, its `end` at the depth after it decrements.
    pub nesting_level: usize,
}

impl Unit {
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.start_line..=self.end_line
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}-{}", self.kind, self.start_line, self.end_line)
    }
}
