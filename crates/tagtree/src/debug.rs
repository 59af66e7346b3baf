use crate::document::Document;
use crate::node::{Closing, CommentKind, NodeData};
use crate::types::NodeId;

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

fn trimmed_nonempty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn push_preview(out: &mut String, s: &str) {
    for (i, ch) in s.chars().enumerate() {
        if i == PREVIEW_CHARS {
            out.push('…');
            break;
        }
        out.push(if matches!(ch, '\n' | '\r' | '\t') { ' ' } else { ch });
    }
}

/// One line per node, indented by depth, visiting at most `cap` nodes.
///
/// Whitespace-only text is skipped and other text is trimmed and cut to a
/// short preview. Elements never closed are marked `(unclosed)`.
pub fn outline(doc: &Document, cap: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut left = cap;
    let mut stack = vec![(NodeId::ROOT, 0usize)];
    while let Some((id, level)) = stack.pop() {
        if left == 0 {
            break;
        }
        left -= 1;
        let node = doc.node(id);
        let mut line = INDENT_STEP.repeat(level);
        match &node.data {
            NodeData::Document => line.push_str("#document"),
            NodeData::Element(el) => {
                line.push('<');
                line.push_str(el.name());
                for attr in el.attributes() {
                    line.push(' ');
                    line.push_str(attr.name());
                    if let Some(value) = attr.value().filter(|v| !v.is_empty()) {
                        line.push_str("=\"");
                        line.push_str(value);
                        line.push('"');
                    }
                }
                line.push('>');
                if matches!(el.closing(), Closing::Open) {
                    line.push_str(" (unclosed)");
                }
            }
            NodeData::Text(content) => {
                let Some(text) = trimmed_nonempty(doc.content(content)) else {
                    continue;
                };
                line.push('"');
                push_preview(&mut line, text);
                line.push('"');
            }
            NodeData::Comment { payload, kind } => {
                let payload = doc.content(payload);
                match kind {
                    CommentKind::Comment => {
                        line.push_str("<!-- ");
                        push_preview(&mut line, payload.trim());
                        line.push_str(" -->");
                    }
                    CommentKind::Declaration => push_preview(&mut line, payload),
                }
            }
        }
        out.push(line);
        stack.extend(node.children.iter().rev().map(|c| (*c, level + 1)));
    }
    out
}
