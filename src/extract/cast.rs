use crate::page::RawPage;
use crate::record::CastFields;

const SECTION_HEADING: &str = "h3";
/// Cast entries link to a person page with the actor's name in bold.
const CAST_LINK: &str = "a.text-primary[href*='people'] b";
/// Crew entries carry an extra ellipsis class; the two selectors are
/// intentionally distinct.
const CREW_LINK: &str = "a.text-primary.text-ellipsis[href*='people'] b";

/// Extract every crew/cast list from a title's cast page. All five lists are
/// optional content; an absent section is an empty list, never an error.
pub fn extract_cast(page: &RawPage) -> CastFields {
    CastFields {
        screenwriter: page.texts_after_heading(SECTION_HEADING, "Screenwriter", CREW_LINK),
        director: page.texts_after_heading(SECTION_HEADING, "Director", CREW_LINK),
        main_cast: page.texts_after_heading(SECTION_HEADING, "Main Role", CAST_LINK),
        support_cast: page.texts_after_heading(SECTION_HEADING, "Support Role", CAST_LINK),
        guest_cast: page.texts_after_heading(SECTION_HEADING, "Guest Role", CAST_LINK),
    }
}
