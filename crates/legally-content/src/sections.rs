//! Section classifier
//!
//! Partitions a rendered analysis into risks, recommendations and summary by
//! scanning section headings for keyword cues. The keyword table is ordered
//! data; the first matching rule wins, and headings that match nothing keep
//! the previously opened section.

use crate::error::ConfigError;
use crate::render::RenderedFragment;
use crate::tree::{DocumentNode, Element, Fragment, Node};
use serde::{Deserialize, Serialize};

/// Named analysis sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    /// Legal risks, unclear wording, possible violations
    Risks,
    /// Recommendations
    Recommendations,
    /// Conclusion / summary
    Summary,
}

impl SectionKey {
    /// All keys in tab order
    pub const ALL: [SectionKey; 3] = [Self::Risks, Self::Recommendations, Self::Summary];

    /// Stable identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risks => "risks",
            Self::Recommendations => "recommendations",
            Self::Summary => "summary",
        }
    }

    /// Tab label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Risks => "Риски",
            Self::Recommendations => "Рекомендации",
            Self::Summary => "Сводка",
        }
    }

    /// Text shown when the section received no content
    #[inline]
    #[must_use]
    pub fn placeholder_text(&self) -> &'static str {
        match self {
            Self::Risks => "Риски не выявлены.",
            Self::Recommendations => "Рекомендации отсутствуют.",
            Self::Summary => "Нет данных для сводки.",
        }
    }

    /// Placeholder fragment for an empty section
    #[must_use]
    pub fn placeholder(&self) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.push(
            Element::new("p")
                .with_class("section-empty")
                .with_text(self.placeholder_text()),
        );
        fragment
    }

    fn index(self) -> usize {
        match self {
            Self::Risks => 0,
            Self::Recommendations => 1,
            Self::Summary => 2,
        }
    }
}

impl std::fmt::Display for SectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown section: '{s}'"))
    }
}

/// One row of the keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRule {
    /// Section opened by a matching heading
    pub section: SectionKey,
    /// Case-insensitive substrings
    pub keywords: Vec<String>,
}

impl SectionRule {
    /// Create rule
    pub fn new<I, S>(section: SectionKey, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            section,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Match against already-lowercased heading text
    fn matches(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| lowered.contains(&keyword.to_lowercase()))
    }
}

/// Ordered keyword table plus the heading levels that delimit sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionRules {
    /// Rules in precedence order
    pub rules: Vec<SectionRule>,
    /// Heading levels treated as section headings (`###` and `####`)
    pub heading_levels: Vec<u8>,
}

impl Default for SectionRules {
    fn default() -> Self {
        Self {
            rules: vec![
                SectionRule::new(
                    SectionKey::Risks,
                    [
                        "правовые риски",
                        "неясные формулировки",
                        "возможные нарушения",
                        "риски",
                    ],
                ),
                SectionRule::new(SectionKey::Recommendations, ["рекомендации"]),
                SectionRule::new(
                    SectionKey::Summary,
                    ["заключение", "сводка", "итог", "вывод"],
                ),
            ],
            heading_levels: vec![3, 4],
        }
    }
}

impl SectionRules {
    /// Check the table is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heading_levels.is_empty()
            || self.heading_levels.iter().any(|l| !(1..=6).contains(l))
        {
            return Err(ConfigError::InvalidHeadingLevels(self.heading_levels.clone()));
        }
        for rule in &self.rules {
            if rule.keywords.is_empty() {
                return Err(ConfigError::EmptyRule(rule.section.to_string()));
            }
            if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(ConfigError::BlankKeyword(rule.section.to_string()));
            }
        }
        Ok(())
    }

    /// Section cued by heading text, first matching rule wins
    #[must_use]
    pub fn classify_heading(&self, text: &str) -> Option<SectionKey> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.section)
    }

    /// True if a heading of this level delimits sections
    #[inline]
    #[must_use]
    pub fn is_section_heading(&self, level: u8) -> bool {
        self.heading_levels.contains(&level)
    }
}

/// Node indices assigned to each section, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    assigned: [Vec<usize>; 3],
}

impl Partition {
    /// Indices owned by a section
    #[inline]
    #[must_use]
    pub fn indices(&self, key: SectionKey) -> &[usize] {
        &self.assigned[key.index()]
    }
}

/// Partition sibling nodes into sections
///
/// A section heading and every following sibling up to the next section
/// heading belong to the heading's section. Nodes before the first classified
/// heading belong to no section.
pub fn partition<N: DocumentNode>(rules: &SectionRules, nodes: &[N]) -> Partition {
    let mut partition = Partition::default();
    let mut sticky: Option<SectionKey> = None;
    let mut owner: Option<SectionKey> = None;

    for (idx, node) in nodes.iter().enumerate() {
        if let Some(level) = node.heading_level().filter(|l| rules.is_section_heading(*l)) {
            let text = node.text_content();
            if let Some(section) = rules.classify_heading(&text) {
                sticky = Some(section);
            } else {
                tracing::debug!("heading without section cue: {:?} (level {})", text, level);
            }
            owner = sticky;
        }
        if let Some(section) = owner {
            partition.assigned[section.index()].push(idx);
        }
    }

    partition
}

/// Full fragment plus the three named sections
///
/// Every key is always present; an empty section holds its placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMap {
    full: Fragment,
    risks: Fragment,
    recommendations: Fragment,
    summary: Fragment,
}

impl SectionMap {
    /// The whole rendered analysis
    #[inline]
    #[must_use]
    pub fn full(&self) -> &Fragment {
        &self.full
    }

    /// Fragment of a named section
    #[inline]
    #[must_use]
    pub fn get(&self, key: SectionKey) -> &Fragment {
        match key {
            SectionKey::Risks => &self.risks,
            SectionKey::Recommendations => &self.recommendations,
            SectionKey::Summary => &self.summary,
        }
    }

    /// Mutable fragment of a named section
    #[inline]
    pub fn get_mut(&mut self, key: SectionKey) -> &mut Fragment {
        match key {
            SectionKey::Risks => &mut self.risks,
            SectionKey::Recommendations => &mut self.recommendations,
            SectionKey::Summary => &mut self.summary,
        }
    }

    /// True if the section holds only its placeholder
    #[must_use]
    pub fn is_placeholder(&self, key: SectionKey) -> bool {
        *self.get(key) == key.placeholder()
    }

    /// Named sections in tab order
    pub fn iter(&self) -> impl Iterator<Item = (SectionKey, &Fragment)> {
        SectionKey::ALL.into_iter().map(move |key| (key, self.get(key)))
    }
}

/// Applies [`SectionRules`] to rendered fragments
#[derive(Debug, Clone, Default)]
pub struct SectionClassifier {
    rules: SectionRules,
}

impl SectionClassifier {
    /// Create classifier with rules
    #[inline]
    #[must_use]
    pub fn new(rules: SectionRules) -> Self {
        Self { rules }
    }

    /// Active rules
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &SectionRules {
        &self.rules
    }

    /// Build the section map for a rendered analysis
    ///
    /// Containers (blockquotes, lists) holding a section heading are opened
    /// up, so their children join the sibling sequence without the wrapper.
    /// The `full` fragment keeps the original structure.
    #[must_use]
    pub fn classify(&self, rendered: &RenderedFragment) -> SectionMap {
        let lifted = lift_nested_headings(&self.rules, rendered.fragment().nodes());
        let nodes = lifted.as_slice();
        let partition = partition(&self.rules, nodes);

        let section = |key: SectionKey| -> Fragment {
            let indices = partition.indices(key);
            if indices.is_empty() {
                key.placeholder()
            } else {
                indices.iter().map(|&i| nodes[i].clone()).collect::<Vec<Node>>().into()
            }
        };

        SectionMap {
            full: rendered.fragment().clone(),
            risks: section(SectionKey::Risks),
            recommendations: section(SectionKey::Recommendations),
            summary: section(SectionKey::Summary),
        }
    }
}

/// Replace every non-heading element that contains a section heading by its children
fn lift_nested_headings(rules: &SectionRules, nodes: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el)
                if el.heading_level().is_none() && contains_section_heading(rules, &el.children) =>
            {
                out.extend(lift_nested_headings(rules, &el.children));
            }
            other => out.push(other.clone()),
        }
    }
    out
}

fn contains_section_heading(rules: &SectionRules, nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Element(el) => match el.heading_level() {
            Some(level) => rules.is_section_heading(level),
            None => contains_section_heading(rules, &el.children),
        },
        Node::Text(_) => false,
    })
}
