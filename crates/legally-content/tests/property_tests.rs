use legally_content::annotate::RiskAnnotator;
use legally_content::render::MarkdownRenderer;
use legally_content::sections::{SectionClassifier, SectionKey};
use legally_content::tree::{Element, Fragment, Node};
use proptest::prelude::*;

const VOCABULARY: &[&str] = &[
    "договор", "статья", "закон", "high", "Средний", "низкий", "риск", "пункт", "medium",
    "law", "срок", "оплата", "ВЫСОКИЙ", "low", "article", "стороны",
];

fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(VOCABULARY), 1..6).prop_map(|w| w.join(" "))
}

fn block() -> impl Strategy<Value = Node> {
    let leaf = sentence().prop_flat_map(|text| {
        prop::sample::select(vec!["p", "li", "div", "span", "h3"])
            .prop_map(move |tag| Node::from(Element::new(tag).with_text(text.clone())))
    });
    leaf.prop_recursive(3, 16, 4, |inner| {
        (
            prop::sample::select(vec!["ul", "ol", "div", "li", "blockquote"]),
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(tag, children)| Element::new(tag).with_children(children).into())
    })
}

fn fragment() -> impl Strategy<Value = Fragment> {
    prop::collection::vec(block(), 0..8).prop_map(Fragment::from)
}

fn word() -> impl Strategy<Value = String> {
    "[a-zа-я]{1,8}"
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 1..5)
}

/// One markdown line plus the visible text it should render to
fn markdown_line() -> impl Strategy<Value = (String, String)> {
    (0..5usize, words()).prop_map(|(kind, words)| {
        let text = words.join(" ");
        let line = match kind {
            0 => format!("### {text}"),
            1 => format!("- {text}"),
            2 => format!("*{text}*"),
            3 => format!("**{text}**"),
            _ => text.clone(),
        };
        (line, text)
    })
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

proptest! {
    #[test]
    fn prop_annotation_is_idempotent(input in fragment()) {
        let annotator = RiskAnnotator::default();
        let once = annotator.annotate(&input);
        let twice = annotator.annotate(&once);

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.to_html(), twice.to_html());
    }

    #[test]
    fn prop_annotation_preserves_text(input in fragment()) {
        let out = RiskAnnotator::default().annotate(&input);
        prop_assert_eq!(out.text(), input.text());
        prop_assert_eq!(out.len(), input.len());
    }

    #[test]
    fn prop_render_then_strip_keeps_text(lines in prop::collection::vec(markdown_line(), 1..8)) {
        let markdown = lines.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>().join("\n\n");
        let expected: String = lines.iter().map(|(_, t)| t.as_str()).collect();

        let rendered = MarkdownRenderer::new().render(&markdown);
        prop_assert!(!rendered.is_placeholder());
        prop_assert_eq!(strip_whitespace(&rendered.fragment().text()), strip_whitespace(&expected));
    }

    #[test]
    fn prop_sections_are_never_empty(lines in prop::collection::vec(markdown_line(), 0..8)) {
        let markdown = lines.iter().map(|(l, _)| l.as_str()).collect::<Vec<_>>().join("\n\n");
        let rendered = MarkdownRenderer::new().render(&markdown);
        let sections = SectionClassifier::default().classify(&rendered);

        for key in SectionKey::ALL {
            prop_assert!(!sections.get(key).is_empty());
        }
        prop_assert_eq!(sections.full(), rendered.fragment());
    }
}
