use std::collections::BTreeMap;

use super::catalog::ReportStructure;

/// Drops hidden sections and subsections from the layout.
///
/// Keys are a section key, a subsection key, or `section.subsection`. Only an
/// explicit `false` hides; unknown keys have no effect. Computed data is not
/// touched, callers keep the values of hidden parts.
#[must_use]
pub fn apply_visibility(
    mut structure: ReportStructure,
    visible_sections: &BTreeMap<String, bool>,
) -> ReportStructure {
    let hidden = |key: &str| visible_sections.get(key) == Some(&false);

    structure.sections.retain(|section| !hidden(section.spec.key));
    for section in &mut structure.sections {
        let section_key = section.spec.key;
        section.subsections.retain(|subsection| {
            !hidden(subsection.key) && !hidden(&format!("{section_key}.{}", subsection.key))
        });
    }
    structure
}
