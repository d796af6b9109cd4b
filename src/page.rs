use scraper::{ElementRef, Html, Selector};

/// Parsed page handle. Extraction code queries it with CSS selector
/// expressions and gets back matching text/attribute values in document
/// order; it never walks the DOM itself.
///
/// `Html` is not `Send`, so a `RawPage` must stay inside a synchronous
/// extraction call and never live across an await point.
pub struct RawPage {
    doc: Html,
}

impl RawPage {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.doc.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Full text of every match, trimmed, empties dropped.
    pub fn texts(&self, selector: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Full text of the first non-empty match.
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.texts(selector).into_iter().next()
    }

    /// Direct text-node content of every match (child element text excluded).
    /// Mirrors what a `/text()` step selects against items whose label lives
    /// in a nested element.
    pub fn own_texts(&self, selector: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .map(|el| own_text(&el))
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Attribute value of every match that carries it.
    pub fn attrs(&self, selector: &str, attr: &str) -> Vec<String> {
        self.select(selector)
            .into_iter()
            .filter_map(|el| el.value().attr(attr).map(str::to_string))
            .collect()
    }

    /// Direct text of the first `item_sel` element that has a `child_sel`
    /// child whose text contains `child_text`. The typical shape is a details
    /// list item: `<li><b>Episodes:</b> 16</li>` → `"16"`.
    pub fn own_text_of_item(
        &self,
        item_sel: &str,
        child_sel: &str,
        child_text: &str,
    ) -> Option<String> {
        let child = Selector::parse(child_sel).ok()?;
        self.select(item_sel).into_iter().find_map(|el| {
            let labeled = el.select(&child).any(|c| element_text(&c).contains(child_text));
            if labeled {
                let text = own_text(&el);
                (!text.is_empty()).then_some(text)
            } else {
                None
            }
        })
    }

    /// All `inner` texts inside the first `outer` element whose full text
    /// contains `marker`.
    pub fn texts_within_marked(&self, outer: &str, marker: &str, inner: &str) -> Vec<String> {
        let Ok(inner_sel) = Selector::parse(inner) else {
            return Vec::new();
        };
        self.select(outer)
            .into_iter()
            .find(|el| element_text(el).contains(marker))
            .map(|el| {
                el.select(&inner_sel)
                    .map(|c| element_text(&c))
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All `inner` texts inside the sibling elements that follow a
    /// `heading_sel` element containing `label`, stopping at the next
    /// heading of the same kind. Covers cast-page sections, where a heading
    /// names the role played by the list that follows it.
    pub fn texts_after_heading(&self, heading_sel: &str, label: &str, inner: &str) -> Vec<String> {
        let Ok(heading) = Selector::parse(heading_sel) else {
            return Vec::new();
        };
        let Ok(inner_sel) = Selector::parse(inner) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for h in self.doc.select(&heading) {
            if !element_text(&h).contains(label) {
                continue;
            }
            let heading_name = h.value().name();
            let mut next = h.next_sibling();
            while let Some(node) = next {
                if let Some(el) = ElementRef::wrap(node) {
                    if el.value().name() == heading_name {
                        break;
                    }
                    out.extend(
                        el.select(&inner_sel)
                            .map(|c| element_text(&c))
                            .filter(|t| !t.is_empty()),
                    );
                }
                next = node.next_sibling();
            }
        }
        out
    }

    /// For each `row` element, the first `left` and `right` texts within it.
    pub fn paired_texts(
        &self,
        row: &str,
        left: &str,
        right: &str,
    ) -> Vec<(Option<String>, Option<String>)> {
        let (Ok(left_sel), Ok(right_sel)) = (Selector::parse(left), Selector::parse(right)) else {
            return Vec::new();
        };
        self.select(row)
            .into_iter()
            .map(|el| {
                let l = el
                    .select(&left_sel)
                    .next()
                    .map(|c| element_text(&c))
                    .filter(|t| !t.is_empty());
                let r = el
                    .select(&right_sel)
                    .next()
                    .map(|c| element_text(&c))
                    .filter(|t| !t.is_empty());
                (l, r)
            })
            .collect()
    }
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn own_text(el: &ElementRef) -> String {
    el.children()
        .filter_map(|n| n.value().as_text().map(|t| t.text.to_string()))
        .collect::<String>()
        .trim()
        .to_string()
}
