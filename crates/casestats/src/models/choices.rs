use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

const fn choice(value: &'static str, label: &'static str) -> Choice {
    Choice { value, label }
}

pub type ChoiceDomain = &'static [Choice];

#[must_use]
pub fn choice_label(domain: ChoiceDomain, value: &str) -> Option<&'static str> {
    domain
        .iter()
        .find(|candidate| candidate.value == value)
        .map(|candidate| candidate.label)
}

pub const CLIENT_ROLE: ChoiceDomain = &[
    choice("affected", "Affected person"),
    choice("relative", "Relative"),
    choice("professional", "Professional"),
];

pub const GENDER_IDENTITY: ChoiceDomain = &[
    choice("cis-female", "Cis female"),
    choice("cis-male", "Cis male"),
    choice("trans-female", "Trans female"),
    choice("trans-male", "Trans male"),
    choice("trans-nonbinary", "Trans non-binary"),
    choice("inter", "Inter"),
    choice("agender", "Agender"),
    choice("diverse", "Diverse"),
    choice("unspecified", "Not specified"),
];

pub const SEXUALITY: ChoiceDomain = &[
    choice("lesbian", "Lesbian"),
    choice("gay", "Gay"),
    choice("bisexual", "Bisexual"),
    choice("asexual", "Asexual"),
    choice("heterosexual", "Heterosexual"),
    choice("unspecified", "Not specified"),
];

pub const LOCATION: ChoiceDomain = &[
    choice("leipzig-city", "Leipzig (city)"),
    choice("leipzig-district", "Leipzig (district)"),
    choice("north-saxony", "North Saxony"),
    choice("saxony-other", "Saxony (other)"),
    choice("germany-other", "Germany (other)"),
    choice("abroad", "Abroad"),
    choice("unspecified", "Not specified"),
];

pub const YES_NO_UNSPECIFIED: ChoiceDomain = &[
    choice("yes", "Yes"),
    choice("no", "No"),
    choice("unspecified", "Not specified"),
];

pub const COUNSELING_OFFICE: ChoiceDomain = &[
    choice("leipzig-city", "Counseling office Leipzig (city)"),
    choice("north-saxony", "North Saxony"),
    choice("leipzig-district", "Leipzig (district)"),
];

pub const CONSULTATION_TYPE: ChoiceDomain = &[
    choice("in-person", "In-Person"),
    choice("outreach", "Outreach"),
    choice("phone", "Phone"),
    choice("video", "Video"),
    choice("written", "Written"),
];

pub const CONSULTATION_STATUS: ChoiceDomain = &[
    choice("planned", "Planned"),
    choice("occurred", "Occurred"),
    choice("cancelled", "Cancelled"),
];

pub const CASE_STATUS: ChoiceDomain = &[
    choice("open", "Open"),
    choice("ongoing", "Ongoing"),
    choice("closed", "Closed"),
    choice("deleted", "Deleted"),
];

pub const INCIDENT_COUNT: ChoiceDomain = &[
    choice("single", "Single"),
    choice("multiple", "Multiple"),
    choice("exact", "Exact number"),
    choice("unspecified", "Not specified"),
];

pub const PERPETRATOR_COUNT: ChoiceDomain = &[
    choice("one", "One"),
    choice("multiple", "Multiple"),
    choice("exact", "Exact number"),
    choice("unspecified", "Not specified"),
];

pub const CRIME_SCENE: ChoiceDomain = &[
    choice("leipzig", "Leipzig"),
    choice("leipzig-district", "Leipzig (district)"),
    choice("north-saxony", "North Saxony"),
    choice("saxony", "Saxony"),
    choice("germany", "Germany"),
    choice("abroad", "Abroad"),
    choice("while-fleeing", "While fleeing"),
    choice("country-of-origin", "Country of origin"),
    choice("unspecified", "Not specified"),
];

pub const REPORT_FILED: ChoiceDomain = &[
    choice("yes", "Yes"),
    choice("no", "No"),
    choice("undecided", "Not decided yet"),
    choice("unspecified", "Not specified"),
];

pub const PSYCHOLOGICAL_CONSEQUENCE: ChoiceDomain = &[
    choice("depression", "Depression"),
    choice("anxiety", "Anxiety disorder"),
    choice("ptsd", "PTSD"),
    choice("burnout", "Burn-out"),
    choice("sleep-disorder", "Sleep disorder"),
    choice("addiction", "Addiction"),
    choice("communication", "Communication difficulties"),
    choice("self-neglect", "Neglect of everyday matters"),
    choice("none", "None"),
    choice("other", "Other"),
];

pub const PHYSICAL_CONSEQUENCE: ChoiceDomain = &[
    choice("pain", "Pain"),
    choice("paralysis", "Paralysis"),
    choice("illness", "Illness"),
    choice("none", "None"),
    choice("other", "Other"),
];

pub const REQUESTER: ChoiceDomain = &[
    choice("professional", "Professional"),
    choice("relative", "Relative"),
    choice("affected", "Affected person"),
    choice("anonymous", "Anonymous"),
    choice("queer-affected", "Queer affected person"),
    choice("queer-professional", "Queer professional"),
    choice("queer-relative", "Queer relative"),
    choice("queer-anonymous", "Queer anonymous"),
    choice("professional-for-affected", "Professional on behalf of affected person"),
    choice("relative-for-affected", "Relative on behalf of affected person"),
    choice(
        "professional-for-queer-affected",
        "Professional on behalf of queer affected person",
    ),
    choice(
        "relative-for-queer-affected",
        "Relative on behalf of queer affected person",
    ),
];

pub const REQUEST_KIND: ChoiceDomain = &[
    choice("medical-emergency", "Immediate medical help"),
    choice("confidential-evidence", "Confidential evidence collection"),
    choice("counseling", "Counseling need"),
    choice("legal", "Legal questions"),
    choice("other", "Other"),
];
