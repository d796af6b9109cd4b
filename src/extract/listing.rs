use crate::page::RawPage;

/// Title links on a top-shows index page are site-relative.
const TITLE_LINK: &str = ".text-primary.title > a";

/// Collect the detail-page URLs listed on one index page, in document order.
pub fn discover_title_urls(page: &RawPage, base_url: &str) -> Vec<String> {
    page.attrs(TITLE_LINK, "href")
        .into_iter()
        .map(|href| format!("{base_url}{href}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrefs_are_joined_against_the_base_url() {
        let page = RawPage::parse(
            r#"<div>
                <h6 class="text-primary title"><a href="/12345-goblin">Goblin</a></h6>
                <h6 class="text-primary title"><a href="/67890-signal">Signal</a></h6>
                <h6 class="title"><a href="/not-a-show">Other</a></h6>
            </div>"#,
        );
        assert_eq!(
            discover_title_urls(&page, "https://mydramalist.com"),
            vec![
                "https://mydramalist.com/12345-goblin",
                "https://mydramalist.com/67890-signal",
            ]
        );
    }

    #[test]
    fn page_without_listings_yields_nothing() {
        let page = RawPage::parse("<html><body><p>empty</p></body></html>");
        assert!(discover_title_urls(&page, "https://mydramalist.com").is_empty());
    }
}
