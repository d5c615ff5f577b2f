use std::sync::LazyLock;

use regex::Regex;

use crate::unit::UnitKind;

fn pattern(src: &str) -> Regex {
    Regex::new(src).expect("built-in pattern must compile")
}

static COMMENT: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\{-?\s*/\*.*?\*/\s*-?\}\}"));
static ELSE_IF: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\{-?\s*else\s+if\s+"));
static ELSE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\{-?\s*else\s*-?\}\}"));
static END: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\{-?\s*end\s*-?\}\}"));
static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| pattern(r"\{\{-?.*?-?\}\}"));

/// Openers in precedence order: when a line holds several, the earlier
/// keyword wins regardless of its position in the line.
static OPENERS: LazyLock<Vec<(UnitKind, Regex)>> = LazyLock::new(|| {
    [
        (UnitKind::If, "if"),
        (UnitKind::Range, "range"),
        (UnitKind::With, "with"),
        (UnitKind::Define, "define"),
        (UnitKind::Block, "block"),
    ]
    .into_iter()
    .map(|(kind, kw)| (kind, keyword(kw)))
    .collect()
});

static REFERENCES: LazyLock<Vec<(UnitKind, Regex)>> = LazyLock::new(|| {
    [(UnitKind::Template, "template"), (UnitKind::Include, "include")]
        .into_iter()
        .map(|(kind, kw)| (kind, keyword(kw)))
        .collect()
});

/// Every action pattern tagged with the kind it marks, in no particular
/// order. Used where precedence does not matter.
static ACTIONS: LazyLock<Vec<(UnitKind, Regex)>> = LazyLock::new(|| {
    let mut actions = vec![
        (UnitKind::Comment, Regex::clone(&COMMENT)),
        (UnitKind::ElseIf, pattern(r"\{\{-?\s*else\s+if\s")),
        (UnitKind::Else, Regex::clone(&ELSE)),
        (UnitKind::End, Regex::clone(&END)),
    ];
    actions.extend(OPENERS.iter().cloned());
    actions.extend(REFERENCES.iter().cloned());
    actions
});

fn keyword(kw: &str) -> Regex {
    pattern(&format!(r"\{{\{{-?\s*{kw}\s+"))
}

/// Classify one source line.
///
/// Precedence: comment > else-if > else > end > opener > cross-reference >
/// expression > plain. The first match wins.
pub fn classify_line(line: &str) -> UnitKind {
    let line = line.trim();

    if COMMENT.is_match(line) {
        return UnitKind::Comment;
    }
    if ELSE_IF.is_match(line) {
        return UnitKind::ElseIf;
    }
    if ELSE.is_match(line) {
        return UnitKind::Else;
    }
    if END.is_match(line) {
        return UnitKind::End;
    }
    if let Some((kind, _)) = OPENERS.iter().find(|(_, re)| re.is_match(line)) {
        return *kind;
    }
    if let Some((kind, _)) = REFERENCES.iter().find(|(_, re)| re.is_match(line)) {
        return *kind;
    }
    if EXPRESSION.is_match(line) {
        return UnitKind::Expression;
    }
    UnitKind::Plain
}

/// Whether a line carries any control or cross-reference marker.
///
/// Unlike [`classify_line`] this ignores precedence: a line that is mostly a
/// comment but also closes a construct still counts.
pub fn is_control_line(line: &str) -> bool {
    ACTIONS
        .iter()
        .filter(|(kind, _)| kind.is_control() || kind.is_cross_reference())
        .any(|(_, re)| re.is_match(line))
}
