use std::fmt::Write;

use crate::types::{Component, Element};

pub const SUMMARY_HEADER: &str = "/* Rust CUI Elements (summary) */";

/// Comment-only listing of every element and its components.
pub fn render_summary(elements: &[Element]) -> String {
    let mut out = String::new();
    out.push_str(SUMMARY_HEADER);
    out.push('\n');
    for el in elements {
        let _ = writeln!(out, "// {} => parent={}", el.name, el.parent_name);
        for component in &el.components {
            match component {
                Component::RectTransform {
                    anchor_min,
                    anchor_max,
                    ..
                } => {
                    let _ = writeln!(
                        out,
                        "//   - {} [{}..{}]",
                        component.type_name(),
                        anchor_min,
                        anchor_max
                    );
                }
                _ => {
                    let _ = writeln!(out, "//   - {}", component.type_name());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::serialize_tree;
    use crate::types::{DesignNode, NodeType, UrlMap};

    #[test]
    fn summary_lists_elements_and_components() {
        let tree = DesignNode::new("1", "Menu", NodeType::Frame)
            .with_bounds(0.0, 0.0, 200.0, 100.0)
            .with_child(
                DesignNode::new("2", "Bg", NodeType::Rectangle).with_bounds(10.0, 10.0, 40.0, 20.0),
            );
        let summary = render_summary(&serialize_tree(&tree, &UrlMap::new()));
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(
            lines,
            vec![
                "/* Rust CUI Elements (summary) */",
                "// root_menu => parent=root",
                "//   - UnityEngine.UI.Image",
                "//   - RectTransform [0.0000 0.0000..1.0000 1.0000]",
                "// root_menu_bg => parent=root_menu",
                "//   - UnityEngine.UI.Image",
                "//   - RectTransform [0.0500 0.7000..0.2500 0.9000]",
            ]
        );
    }

    #[test]
    fn empty_list_is_just_the_header() {
        assert_eq!(render_summary(&[]), "/* Rust CUI Elements (summary) */\n");
    }
}
