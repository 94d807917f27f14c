//! Visibility checks.

use crate::dom::{Dom, NodeId};

/// Whether an element is actually visible to the user.
///
/// Hidden-by-style and `hidden` attribute checks run first; the bounding box
/// is read last and must be non-empty in both dimensions.
pub fn is_visible(dom: &Dom, node: NodeId) -> bool {
    let Some(style) = dom.style(node) else {
        return false;
    };
    if is_keyword(style.display.as_deref(), "none")
        || is_keyword(style.visibility.as_deref(), "hidden")
    {
        return false;
    }
    if dom.has_attribute(node, "hidden") {
        return false;
    }

    dom.rect(node)
        .is_some_and(|rect| rect.width > 0.0 && rect.height > 0.0)
}

fn is_keyword(value: Option<&str>, keyword: &str) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;

    fn setup() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let body = dom.create_body();
        (dom, body)
    }

    #[test]
    fn test_rendered_element_is_visible() {
        let (mut dom, body) = setup();
        let el = dom.append(body, "button").size(80.0, 24.0).id();
        assert!(is_visible(&dom, el));
    }

    #[test]
    fn test_zero_size_is_hidden() {
        let (mut dom, body) = setup();
        let el = dom.append(body, "button").size(80.0, 0.0).id();
        assert!(!is_visible(&dom, el));
        dom.set_rect(el, Rect::sized(0.0, 24.0));
        assert!(!is_visible(&dom, el));
        dom.set_rect(el, Rect::sized(-1.0, 24.0));
        assert!(!is_visible(&dom, el));
    }

    #[test]
    fn test_hidden_attribute() {
        let (mut dom, body) = setup();
        let el = dom
            .append(body, "button")
            .attr("hidden", "")
            .size(80.0, 24.0)
            .id();
        assert!(!is_visible(&dom, el));
    }

    #[test]
    fn test_hidden_by_inline_style() {
        let (mut dom, body) = setup();
        let none = dom
            .append(body, "button")
            .style("display", "none")
            .size(80.0, 24.0)
            .id();
        let hidden = dom
            .append(body, "button")
            .style("visibility", " HIDDEN ")
            .size(80.0, 24.0)
            .id();
        let shown = dom
            .append(body, "button")
            .style("display", "block")
            .style("visibility", "visible")
            .size(80.0, 24.0)
            .id();

        assert!(!is_visible(&dom, none));
        assert!(!is_visible(&dom, hidden));
        assert!(is_visible(&dom, shown));
    }

    #[test]
    fn test_non_element_is_not_visible() {
        let (mut dom, body) = setup();
        let text = dom.append_text(body, "Reconnect");
        let shadow = dom.attach_shadow(body).unwrap();

        assert!(!is_visible(&dom, text));
        assert!(!is_visible(&dom, shadow));
    }
}
