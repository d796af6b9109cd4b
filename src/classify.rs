use crate::page::RawPage;

const EXPECTED_TYPE: &str = "Drama";
const DETAILS_ITEM: &str = "li.list-item.p-a-0";

/// Outcome of checking a detail page's entity-type label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    InScope,
    OutOfScope(String),
}

/// Read the "Type" label from the details block and decide whether the page
/// is a drama at all. Filtered-out pages are a normal outcome, not an error;
/// callers branch on the result and skip extraction entirely for
/// `OutOfScope`.
pub fn classify(page: &RawPage) -> Classification {
    match page.own_text_of_item(DETAILS_ITEM, "b", "Type") {
        None => Classification::OutOfScope("missing type label".to_string()),
        Some(label) if label == EXPECTED_TYPE => Classification::InScope,
        Some(label) => Classification::OutOfScope(label),
    }
}
