use legally_content::prelude::*;
use legally_content::render::PlainHighlighter;
use legally_content::sections::SectionRules;
use legally_content::RiskLevel;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn render(md: &str) -> AnalysisView {
    AnalysisPipeline::default().render(&AnalysisDocument::new(md))
}

#[test]
fn test_zero_headings_yield_placeholders() {
    let md = "Договор составлен корректно.\n\n- пункт один\n- пункт два";
    let view = render(md);

    for key in SectionKey::ALL {
        assert!(view.sections.is_placeholder(key), "{key} should be empty");
        assert_eq!(*view.sections.get(key), key.placeholder());
    }
    let rendered = MarkdownRenderer::new().render(md);
    assert_eq!(view.sections.full(), rendered.fragment());
}

#[test]
fn test_single_risk_heading() {
    let view = render("### Правовые риски\nПункт 7 допускает двоякое толкование.");
    let risks = view.html(Some(SectionKey::Risks));

    assert!(risks.starts_with("<h3>Правовые риски</h3>"));
    assert!(risks.contains("Пункт 7 допускает двоякое толкование."));
    assert!(view.sections.is_placeholder(SectionKey::Recommendations));
    assert!(view.sections.is_placeholder(SectionKey::Summary));
}

#[test]
fn test_sections_do_not_bleed() {
    let view = render(
        "### Риски\nпервый\n\n### Рекомендации\nвторой\n\n### Заключение\nтретий",
    );

    assert_eq!(
        view.html(Some(SectionKey::Risks)),
        "<h3>Риски</h3><p>первый</p>"
    );
    assert_eq!(
        view.html(Some(SectionKey::Recommendations)),
        "<h3>Рекомендации</h3><p>второй</p>"
    );
    assert_eq!(
        view.html(Some(SectionKey::Summary)),
        "<h3>Заключение</h3><p>третий</p>"
    );
}

#[test]
fn test_end_to_end_scenario() {
    let view = render("### Риски\nВысокий риск штрафа.\n### Рекомендации\nПересмотреть пункт 5.");

    assert_eq!(
        view.html(Some(SectionKey::Risks)),
        "<h3>Риски</h3><p class=\"risk-highlight high\">Высокий риск штрафа.</p>"
    );
    assert_eq!(
        view.html(Some(SectionKey::Recommendations)),
        "<h3>Рекомендации</h3><p>Пересмотреть пункт 5.</p>"
    );
    assert!(view.sections.is_placeholder(SectionKey::Summary));
    assert_eq!(
        view.html(Some(SectionKey::Summary)),
        "<p class=\"section-empty\">Нет данных для сводки.</p>"
    );
}

#[test]
fn test_full_view_is_not_annotated() {
    let view = render("### Риски\nВысокий риск штрафа.");
    assert!(!view.html(None).contains("risk-highlight"));
}

#[test]
fn test_unmatched_heading_keeps_sticky_section() {
    let view = render("### Риски\nа\n\n#### Прочее\nб\n\n### Сводка\nв");
    assert_eq!(
        view.html(Some(SectionKey::Risks)),
        "<h3>Риски</h3><p>а</p><h4>Прочее</h4><p>б</p>"
    );
    assert_eq!(view.html(Some(SectionKey::Summary)), "<h3>Сводка</h3><p>в</p>");
}

#[test]
fn test_content_before_first_section_is_unassigned() {
    let view = render("Вступление.\n\n### Итоги\nконец");
    assert_eq!(view.html(Some(SectionKey::Summary)), "<h3>Итоги</h3><p>конец</p>");
    assert!(!view.html(Some(SectionKey::Risks)).contains("Вступление"));
}

#[test]
fn test_level_two_headings_are_content() {
    let view = render("### Рекомендации\nа\n\n## Риски\nб");
    assert_eq!(
        view.html(Some(SectionKey::Recommendations)),
        "<h3>Рекомендации</h3><p>а</p><h2>Риски</h2><p>б</p>"
    );
    assert!(view.sections.is_placeholder(SectionKey::Risks));
}

#[test]
fn test_legal_reference_in_risk_list() {
    let view = render("### Риски\n- Статья 15 ГК: средний риск\n- Общий пункт");
    assert_eq!(
        view.html(Some(SectionKey::Risks)),
        "<h3>Риски</h3><ul><li class=\"risk-highlight medium legal-reference\">Статья 15 ГК: средний риск</li><li>Общий пункт</li></ul>"
    );
}

#[test]
fn test_code_block_survives_sectioning() {
    let view = render("### Сводка\n```python\nx = 1\n```\n\n```cobol\nMOVE A\n```");
    let summary = view.html(Some(SectionKey::Summary));

    assert!(summary.contains("<pre><code class=\"hljs language-python\">"));
    assert!(summary.contains("<pre><code class=\"language-cobol\">MOVE A\n</code></pre>"));
}

#[test]
fn test_highlight_disabled_by_config() {
    let pipeline = AnalysisPipeline::new(ContentConfig::new().with_highlight(false));
    let view = pipeline.render(&AnalysisDocument::new("```rust\nfn main() {}\n```"));
    assert_eq!(
        view.html(None),
        "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
    );
}

#[test]
fn test_custom_renderer_and_rules() {
    let rules: SectionRules = toml::from_str(
        r#"
heading_levels = [2]

[[rules]]
section = "recommendations"
keywords = ["advice"]
"#,
    )
    .unwrap();
    let pipeline = AnalysisPipeline::new(ContentConfig::new().with_sections(rules))
        .with_renderer(MarkdownRenderer::with_highlighter(Arc::new(PlainHighlighter)));

    let view = pipeline.render(&AnalysisDocument::new("## Advice\nLow priority."));
    assert_eq!(
        view.html(Some(SectionKey::Recommendations)),
        "<h2>Advice</h2><p class=\"risk-highlight low\">Low priority.</p>"
    );
}

#[test]
fn test_view_json_shape() {
    let view = AnalysisPipeline::default().render(
        &AnalysisDocument::new("### Риски\nтекст").with_document_type("Договор"),
    );
    let json = serde_json::to_value(&view).unwrap();

    assert_eq!(json["document_type"], "Договор");
    assert_eq!(json["tabs"][1]["key"], "risks");
    assert_eq!(json["tabs"][1]["html"], view.html(Some(SectionKey::Risks)));

    let tabs = view.tabs();
    let labels: Vec<_> = tabs.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["Полный анализ", "Риски", "Рекомендации", "Сводка"]);
    assert_eq!(tabs[1].html, view.html(Some(SectionKey::Risks)));
}

#[test]
fn test_severity_precedence_in_pipeline() {
    let view = render("### Риски\nРиск высокий, но вероятность низкий.");
    let risks = view.sections.get(SectionKey::Risks);
    let para = risks.nodes()[1].as_element().unwrap();

    assert!(para.has_class(RiskLevel::High.class()));
    assert!(!para.has_class(RiskLevel::Low.class()));
}

#[test]
fn test_heading_inside_blockquote() {
    let view = render("> ### Риски\n> Высокий риск.");
    assert_eq!(
        view.html(Some(SectionKey::Risks)),
        "<h3>Риски</h3><p class=\"risk-highlight high\">Высокий риск.</p>"
    );
    assert!(view.html(None).starts_with("<blockquote>"));
}
