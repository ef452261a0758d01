//! Diagram extraction sanitizer.
//!
//! Turns free-form model output into a small diagram that always parses:
//!
//! 1. keep only the text between `BEGIN_DIAGRAM` / `END_DIAGRAM` if present
//! 2. drop code fences and stray markers
//! 3. skip everything before the notation's header keyword
//! 4. scan for `identifier relation identifier` triples
//! 5. drop duplicates keyed on the unordered pair of endpoints
//! 6. keep at most [`Notation::max_edges`] relations
//! 7. fall back to a minimal stub when nothing survives
//!
//! [`sanitize`] is pure and total: any input, including empty or binary
//! garbage, yields a non-empty diagram.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::Notation;

pub const BEGIN_MARKER: &str = "BEGIN_DIAGRAM";
pub const END_MARKER: &str = "END_DIAGRAM";

/// Emitted when no flow-graph edge survives.
pub const FLOWCHART_STUB: &str = "flowchart TD\n    Start --> NoRelationships";
/// Emitted when no entity relation survives.
pub const ER_STUB: &str = "erDiagram";

const DEFAULT_DIRECTION: &str = "TD";
const DEFAULT_ER_LABEL: &str = "relates";

static FLOWCHART_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:flowchart|graph)\b(?:[ \t]+(TD|TB|BT|RL|LR)\b)?")
        .expect("flowchart header pattern is valid")
});

static FLOWCHART_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"([A-Za-z_][A-Za-z0-9_]*)",
        r"(?:\[[^\]\n]*\]|\([^)\n]*\)|\{[^}\n]*\})?",
        r"[ \t]*(-->|---|-\.->|==>)(?:\|[^|\n]*\|)?[ \t]*",
        r"([A-Za-z_][A-Za-z0-9_]*)",
    ))
    .expect("flowchart edge pattern is valid")
});

static ER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\berDiagram\b").expect("er header pattern is valid"));

static ER_EDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"([A-Za-z_][A-Za-z0-9_]*)[ \t]*",
        r"(\|o|\|\||\}o|\}\||o\||o\{|\|\{)",
        r"(--|\.\.)",
        r"(\|o|\|\||\}o|\}\||o\||o\{|\|\{)",
        r"[ \t]*([A-Za-z_][A-Za-z0-9_]*)",
        r#"(?:[ \t]*:[ \t]*("[^"\n]*"|[^\n]*))?"#,
    ))
    .expect("er edge pattern is valid")
});

/// Identifiers that break the flow-graph grammar when used as node ids.
const FLOWCHART_RESERVED: &[&str] = &[
    "end", "graph", "flowchart", "subgraph", "style", "class", "classDef", "click", "linkStyle",
];

/// Reduce model output to a bounded, de-duplicated diagram in `notation`.
#[must_use]
pub fn sanitize(text: &str, notation: Notation) -> String {
    let body = strip_decoration(between_markers(text));
    match notation {
        Notation::Flowchart => sanitize_flowchart(&body),
        Notation::Er => sanitize_er(&body),
    }
}

/// Interior of the marker pair, or everything after a lone begin marker.
fn between_markers(text: &str) -> &str {
    let Some(begin) = text.find(BEGIN_MARKER) else {
        return text;
    };
    let rest = &text[begin + BEGIN_MARKER.len()..];
    rest.find(END_MARKER).map_or(rest, |end| &rest[..end])
}

fn strip_decoration(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            continue;
        }
        out.push_str(&line.replace(BEGIN_MARKER, "").replace(END_MARKER, ""));
        out.push('\n');
    }
    out
}

fn sanitize_flowchart(body: &str) -> String {
    let (direction, scan) = match FLOWCHART_HEADER.captures(body) {
        Some(caps) => {
            let direction = caps.get(1).map_or(DEFAULT_DIRECTION, |m| m.as_str());
            let end = caps.get(0).map_or(0, |m| m.end());
            (direction, &body[end..])
        }
        None => (DEFAULT_DIRECTION, body),
    };

    let edges = collect_edges(&FLOWCHART_EDGE, 3, scan, Notation::Flowchart.max_edges(), |caps| {
        let from = &caps[1];
        let to = &caps[3];
        if FLOWCHART_RESERVED.contains(&from) || FLOWCHART_RESERVED.contains(&to) {
            return None;
        }
        Some(((from.to_string(), to.to_string()), format!("{from} {} {to}", &caps[2])))
    });

    if edges.is_empty() {
        return FLOWCHART_STUB.to_string();
    }
    render(&format!("flowchart {direction}"), &edges)
}

fn sanitize_er(body: &str) -> String {
    let scan = ER_HEADER.find(body).map_or(body, |m| &body[m.end()..]);

    let edges = collect_edges(&ER_EDGE, 5, scan, Notation::Er.max_edges(), |caps| {
        let from = &caps[1];
        let to = &caps[5];
        let label = caps.get(6).map_or_else(String::new, |m| clean_label(m.as_str()));
        let label = if label.is_empty() { DEFAULT_ER_LABEL } else { &label };
        Some((
            (from.to_string(), to.to_string()),
            format!("{from} {}{}{} {to} : \"{label}\"", &caps[2], &caps[3], &caps[4]),
        ))
    });

    if edges.is_empty() {
        return ER_STUB.to_string();
    }
    render("erDiagram", &edges)
}

/// Scan `text` for relation triples, allowing the right endpoint of one
/// match to start the next (`A --> B --> C`). Stops after `cap` distinct pairs.
fn collect_edges<F>(pattern: &Regex, right_group: usize, text: &str, cap: usize, mut edge: F) -> Vec<String>
where
    F: FnMut(&Captures<'_>) -> Option<((String, String), String)>,
{
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut lines = Vec::with_capacity(cap);
    let mut at = 0;

    while lines.len() < cap {
        let Some(caps) = pattern.captures_at(text, at) else {
            break;
        };
        at = caps.get(right_group).map_or(text.len(), |m| m.start());

        if let Some(((from, to), line)) = edge(&caps) {
            let key = if from <= to { (from, to) } else { (to, from) };
            if seen.insert(key) {
                lines.push(line);
            }
        }
    }
    lines
}

fn render(header: &str, edges: &[String]) -> String {
    let mut out = String::from(header);
    for edge in edges {
        let _ = write!(out, "\n    {edge}");
    }
    out
}

/// Keep `[A-Za-z0-9_ ]`, collapse runs of spaces.
fn clean_label(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn edge_lines(diagram: &str) -> Vec<&str> {
        diagram.lines().skip(1).map(str::trim).collect()
    }

    #[test]
    fn caps_flowchart_at_twenty_unique_edges() {
        let mut text = String::from("Sure! Here is your diagram:\nflowchart LR\n");
        for i in 0..25 {
            let _ = writeln!(text, "    A{i} --> B{i}");
        }
        text.push_str("    A0 --> B0\n");

        let diagram = sanitize(&text, Notation::Flowchart);

        assert!(diagram.starts_with("flowchart LR\n"));
        let edges = edge_lines(&diagram);
        assert_eq!(edges.len(), 20);
        let unique: HashSet<_> = edges.iter().collect();
        assert_eq!(unique.len(), 20);
        assert_eq!(edges[0], "A0 --> B0");
        assert_eq!(edges[19], "A19 --> B19");
    }

    #[test]
    fn keeps_marker_interior_and_strips_fences() {
        let text = "ignore A --> Z\nBEGIN_DIAGRAM\n```mermaid\ngraph TD\n  orders[Orders] -->|has| items\n```\nEND_DIAGRAM\nC --> D";
        assert_eq!(
            sanitize(text, Notation::Flowchart),
            "flowchart TD\n    orders --> items"
        );
    }

    #[test]
    fn reciprocal_flowchart_edges_collapse() {
        let text = "flowchart TD\nA --> B\nB --> A\nA -.-> B\nB ==> C";
        assert_eq!(
            sanitize(text, Notation::Flowchart),
            "flowchart TD\n    A --> B\n    B ==> C"
        );
    }

    #[test]
    fn chained_edges_are_all_found() {
        assert_eq!(
            sanitize("graph TD\nA --> B --> C", Notation::Flowchart),
            "flowchart TD\n    A --> B\n    B --> C"
        );
    }

    #[test]
    fn reserved_identifiers_are_skipped() {
        assert_eq!(
            sanitize("flowchart TD\nend --> A", Notation::Flowchart),
            FLOWCHART_STUB
        );
    }

    #[test]
    fn er_edges_keep_cardinality_and_clean_labels() {
        let text = "Here you go\nerDiagram\n  CUSTOMER ||--o{ ORDER : \"places (1..n)!\"\n  ORDER }|..|{ LINE_ITEM\n  ORDER }o--|| CUSTOMER : back\n";
        assert_eq!(
            sanitize(text, Notation::Er),
            "erDiagram\n    CUSTOMER ||--o{ ORDER : \"places 1 n\"\n    ORDER }|..|{ LINE_ITEM : \"relates\""
        );
    }

    #[test]
    fn er_caps_at_eight() {
        let mut text = String::from("erDiagram\n");
        for i in 0..12 {
            let _ = writeln!(text, "  T{i} ||--|| U{i} : owns");
        }
        let diagram = sanitize(&text, Notation::Er);
        assert_eq!(edge_lines(&diagram).len(), 8);
    }

    #[rstest]
    #[case("", Notation::Flowchart, FLOWCHART_STUB)]
    #[case("", Notation::Er, ER_STUB)]
    #[case("\u{0}\u{7f}\u{fffd}>>--<<||", Notation::Flowchart, FLOWCHART_STUB)]
    #[case("BEGIN_DIAGRAM", Notation::Er, ER_STUB)]
    #[case("no diagram here, sorry", Notation::Er, ER_STUB)]
    fn degenerate_input_yields_stub(#[case] text: &str, #[case] notation: Notation, #[case] expected: &str) {
        assert_eq!(sanitize(text, notation), expected);
    }

    #[test]
    fn long_garbage_stays_bounded() {
        let text = "x-->".repeat(10_000);
        let diagram = sanitize(&text, Notation::Flowchart);
        assert!(!diagram.is_empty());
        assert!(edge_lines(&diagram).len() <= Notation::Flowchart.max_edges());
    }
}
