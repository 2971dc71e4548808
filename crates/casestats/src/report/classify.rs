//! Keyword classification of free-text fields.
//!
//! Matching is a case-insensitive substring test. Single-label classifiers
//! take the first category in table order whose keyword occurs; anything else
//! is "other". Keyword tables are part of the report contract: reordering them
//! changes reported numbers.

/// Number of "other" examples kept for display.
pub const OTHER_EXAMPLE_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<C> {
    pub category: C,
    pub keywords: &'static [&'static str],
}

const fn rule<C>(category: C, keywords: &'static [&'static str]) -> KeywordRule<C> {
    KeywordRule { category, keywords }
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

/// First rule with a keyword in `text`. Keywords are lowercase.
#[must_use]
pub fn first_match<C: Copy>(rules: &[KeywordRule<C>], text: &str) -> Option<C> {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|rule| contains_any(&lowered, rule.keywords))
        .map(|rule| rule.category)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Institution {
    Court,
    Police,
    Attorney,
    Medical,
    YouthServices,
    SocialServices,
    EmploymentServices,
    ViolenceCounseling,
    ProtectiveShelter,
    InterventionOffice,
}

pub const INSTITUTION_RULES: &[KeywordRule<Institution>] = &[
    rule(Institution::Court, &["court", "gericht"]),
    rule(Institution::Police, &["police", "polizei"]),
    rule(
        Institution::Attorney,
        &["attorney", "lawyer", "rechtsanw", "anwalt", "kanzlei"],
    ),
    rule(
        Institution::Medical,
        &[
            "medical",
            "doctor",
            "hospital",
            "clinic",
            "arzt",
            "ärzt",
            "rechtsmedizin",
            "klinik",
            "krankenhaus",
        ],
    ),
    rule(Institution::YouthServices, &["youth", "jugendamt"]),
    rule(
        Institution::SocialServices,
        &["social services", "social welfare", "welfare", "sozialamt"],
    ),
    rule(
        Institution::EmploymentServices,
        &[
            "job center",
            "jobcenter",
            "employment",
            "agentur für arbeit",
            "arbeitsagentur",
        ],
    ),
    rule(
        Institution::ViolenceCounseling,
        &["counsel", "gewaltberatung", "beratungsstelle"],
    ),
    rule(
        Institution::ProtectiveShelter,
        &["shelter", "frauenhaus", "kinderschutz", "schutz"],
    ),
    rule(
        Institution::InterventionOffice,
        &["intervention", "coordination", "koordinierung"],
    ),
];

#[must_use]
pub fn classify_institution(name: &str) -> Option<Institution> {
    first_match(INSTITUTION_RULES, name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContactSource {
    Police,
    Private,
    Counseling,
    Internet,
    Authorities,
    Health,
    Attorneys,
}

pub const CONTACT_SOURCE_RULES: &[KeywordRule<ContactSource>] = &[
    rule(ContactSource::Police, &["police", "polizei"]),
    rule(
        ContactSource::Private,
        &["privat", "friend", "freund", "family", "familie"],
    ),
    rule(ContactSource::Counseling, &["beratung", "counsel"]),
    rule(
        ContactSource::Internet,
        &["internet", "online", "web", "social media"],
    ),
    rule(ContactSource::Authorities, &["amt", "behörde", "authority"]),
    rule(
        ContactSource::Health,
        &[
            "arzt",
            "ärzt",
            "krankenhaus",
            "doctor",
            "hospital",
            "clinic",
        ],
    ),
    rule(
        ContactSource::Attorneys,
        &["anwalt", "anwält", "attorney", "lawyer"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactClass {
    Known(ContactSource),
    Unknown,
    Other,
}

/// Blank contact points are unknown; unmatched ones are other.
#[must_use]
pub fn classify_contact_point(text: Option<&str>) -> ContactClass {
    match text.map(str::trim) {
        None | Some("") => ContactClass::Unknown,
        Some(value) => first_match(CONTACT_SOURCE_RULES, value)
            .map_or(ContactClass::Other, ContactClass::Known),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolenceType {
    Rape,
    AttemptedRape,
    SexualAssault,
    AttemptedSexualAssault,
    SexualHarassment,
    SexualExploitation,
    Upskirting,
    Catcalling,
    Digital,
}

impl ViolenceType {
    pub const ALL: [Self; 9] = [
        Self::Rape,
        Self::AttemptedRape,
        Self::SexualAssault,
        Self::AttemptedSexualAssault,
        Self::SexualHarassment,
        Self::SexualExploitation,
        Self::Upskirting,
        Self::Catcalling,
        Self::Digital,
    ];
}

// Plain substrings: "therapeutic" or "grape" also count as rape.
const RAPE: &[&str] = &["rape", "vergewaltigung"];
const ATTEMPTED_RAPE: &[&str] = &["attempted rape", "versuchte vergewaltigung"];
const SEXUAL_ASSAULT: &[&str] = &["sexual assault", "sexuelle nötigung"];
const ATTEMPTED_SEXUAL_ASSAULT: &[&str] =
    &["attempted sexual assault", "versuchte sexuelle nötigung"];
const HARASSMENT: &[&str] = &["harassment", "belästigung"];
const EXPLOITATION: &[&str] = &["exploitation", "ausbeutung"];
const UPSKIRTING: &[&str] = &["upskirting"];
const CATCALLING: &[&str] = &["catcalling"];
const DIGITAL: &[&str] = &["digital", "cyber"];

/// Every category named in a "type of violence" text; the field may list
/// several. A base category is not counted when its attempted variant occurs
/// anywhere in the text, even if the base phrase also appears on its own.
/// An empty result means "other".
#[must_use]
pub fn classify_violence(text: &str) -> Vec<ViolenceType> {
    let lowered = text.to_lowercase();
    let attempted_rape = contains_any(&lowered, ATTEMPTED_RAPE);
    let attempted_assault = contains_any(&lowered, ATTEMPTED_SEXUAL_ASSAULT);

    ViolenceType::ALL
        .into_iter()
        .filter(|kind| match kind {
            ViolenceType::Rape => !attempted_rape && contains_any(&lowered, RAPE),
            ViolenceType::AttemptedRape => attempted_rape,
            ViolenceType::SexualAssault => {
                !attempted_assault && contains_any(&lowered, SEXUAL_ASSAULT)
            }
            ViolenceType::AttemptedSexualAssault => attempted_assault,
            ViolenceType::SexualHarassment => contains_any(&lowered, HARASSMENT),
            ViolenceType::SexualExploitation => contains_any(&lowered, EXPLOITATION),
            ViolenceType::Upskirting => contains_any(&lowered, UPSKIRTING),
            ViolenceType::Catcalling => contains_any(&lowered, CATCALLING),
            ViolenceType::Digital => contains_any(&lowered, DIGITAL),
        })
        .collect()
}

/// Distinct, non-blank example texts up to a limit, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Examples {
    limit: usize,
    items: Vec<String>,
}

impl Examples {
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            items: Vec::new(),
        }
    }

    pub fn offer(&mut self, text: Option<&str>) {
        let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
            return;
        };
        if self.items.len() < self.limit && !self.items.iter().any(|item| item == text) {
            self.items.push(text.to_string());
        }
    }

    #[must_use]
    pub fn items(&self) -> &[String] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ContactClass, ContactSource, Examples, Institution, ViolenceType, classify_contact_point,
        classify_institution, classify_violence,
    };

    #[test]
    fn institutions_use_first_match() {
        assert_eq!(
            classify_institution("Amtsgericht Leipzig"),
            Some(Institution::Court)
        );
        assert_eq!(
            classify_institution("Polizeirevier Süd"),
            Some(Institution::Police)
        );
        assert_eq!(
            classify_institution("Institut für Rechtsmedizin"),
            Some(Institution::Medical)
        );
        assert_eq!(
            classify_institution("Frauenhaus Leipzig"),
            Some(Institution::ProtectiveShelter)
        );
        // "gericht" precedes every later keyword.
        assert_eq!(
            classify_institution("Jugendgericht, Jugendamt"),
            Some(Institution::Court)
        );
        assert_eq!(classify_institution("Standesamt"), None);
    }

    #[test]
    fn contact_points_distinguish_unknown_from_other() {
        assert_eq!(classify_contact_point(None), ContactClass::Unknown);
        assert_eq!(classify_contact_point(Some("  ")), ContactClass::Unknown);
        assert_eq!(
            classify_contact_point(Some("Über eine Freundin")),
            ContactClass::Known(ContactSource::Private)
        );
        assert_eq!(
            classify_contact_point(Some("Flyer im Supermarkt")),
            ContactClass::Other
        );
    }

    #[test]
    fn attempted_variant_excludes_base_category() {
        assert_eq!(
            classify_violence("attempted sexual assault"),
            vec![ViolenceType::AttemptedSexualAssault]
        );
        assert_eq!(
            classify_violence("sexual assault"),
            vec![ViolenceType::SexualAssault]
        );
        assert_eq!(
            classify_violence("Vergewaltigung, versuchte Vergewaltigung"),
            vec![ViolenceType::AttemptedRape]
        );
    }

    #[test]
    fn multiple_categories_and_other() {
        assert_eq!(
            classify_violence("Sexuelle Belästigung; Upskirting"),
            vec![ViolenceType::SexualHarassment, ViolenceType::Upskirting]
        );
        assert!(classify_violence("Stalking").is_empty());
        assert!(classify_violence("").is_empty());
    }

    #[test]
    fn keywords_match_inside_longer_words() {
        assert_eq!(
            classify_violence("therapeutic follow-up"),
            vec![ViolenceType::Rape]
        );
        assert_eq!(classify_violence("Grape juice"), vec![ViolenceType::Rape]);
        assert_eq!(
            classify_contact_point(Some("Standesamt")),
            ContactClass::Known(ContactSource::Authorities)
        );
    }

    #[test]
    fn examples_are_distinct_and_capped() {
        let mut examples = Examples::with_limit(2);
        for text in [Some("Stalking"), None, Some(" Stalking "), Some(""), Some("Nötigung"), Some("Drohung")] {
            examples.offer(text);
        }
        assert_eq!(examples.items(), ["Stalking".to_string(), "Nötigung".to_string()]);
    }
}
