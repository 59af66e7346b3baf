#![no_main]

use libfuzzer_sys::fuzz_target;
use tagtree::{Document, NodeId, ParseOptions};

const MAX_INPUT_BYTES: usize = 16 * 1024;

fn attached_ids(doc: &Document) -> Vec<NodeId> {
    doc.descendants(NodeId::ROOT).filter_map(Result::ok).collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > MAX_INPUT_BYTES {
        return;
    }
    let split = usize::from(data[0]).min(data.len() - 1) + 1;
    let (ops, html) = data[1..].split_at(split.min(data.len() - 1));
    let Ok(input) = std::str::from_utf8(html) else {
        return;
    };
    let Ok(mut doc) = Document::parse_with(input, ParseOptions::default().with_max_depth(128)) else {
        return;
    };

    for chunk in ops.chunks(3) {
        let nodes = attached_ids(&doc);
        if nodes.is_empty() {
            break;
        }
        let pick = |b: u8| nodes[usize::from(b) % nodes.len()];
        let (a, b) = (pick(chunk[0]), pick(*chunk.get(1).unwrap_or(&0)));
        // Errors are expected; a failed edit must leave the tree consistent.
        let _ = match chunk.get(2).copied().unwrap_or(0) % 7 {
            0 => doc.append_child(a, b).map(drop),
            1 => doc.remove_child(a, b, true).map(drop),
            2 => doc.insert_before(a, b, doc.first_child(a).unwrap_or(b)).map(drop),
            3 => doc.set_attribute(a, "id", "fz"),
            4 => doc.set_inner_html(a, "<b>x</b><i>"),
            5 => doc.clone_node(a, true).and_then(|c| doc.append_child(b, c)).map(drop),
            _ => doc.remove(a).map(drop),
        };
    }

    let nodes = attached_ids(&doc);
    for id in &nodes {
        if let Some(parent) = doc.parent(*id) {
            assert!(doc.children(parent).contains(id));
            assert_eq!(doc.depth(*id), doc.depth(parent).map(|d| d + 1));
        }
    }
    if let Ok(Some(found)) = doc.get_element_by_id("fz") {
        assert!(doc.is_attached(found));
        assert_eq!(doc.attribute_value(found, "id"), Some("fz"));
    }
    let html = doc.to_html().expect("serialize");
    let _ = Document::parse(&html).expect("reparse");
});
