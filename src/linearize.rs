//! Flattening a chapter tree into the row sequence printed by the catalog
//! documents.

use serde::Serialize;
use tracing::{instrument, trace};

use crate::{
    domain::{CatalogRequirement, Chapter, Reference},
    render::{markup::escape, Placeholders, TemplateEngine},
};

/// Literal appended to the reference text of a modified reference.
pub const MODIFIED_MARKER: &str = "(mod)";

/// One row of a linearized catalog.
///
/// Chapter rows carry the chapter number and the heading in `text`;
/// requirement rows carry the position, reference and applicability. Fields a
/// row does not use serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogElement {
    /// Chapter number of a chapter row.
    pub chapter: Option<String>,
    /// Display text (markup).
    pub text: String,
    /// Position of a requirement row within its chapter.
    pub position: Option<String>,
    /// Reference markup of a requirement row.
    pub reference: Option<String>,
    /// Whether the row applies; always `true` for chapter rows.
    pub applicable: bool,
}

impl CatalogElement {
    /// Whether this is a chapter heading row.
    #[must_use]
    pub const fn is_chapter(&self) -> bool {
        self.chapter.is_some()
    }
}

/// Flattens `chapters` into rows, depth first.
///
/// Each chapter produces its heading row, then one row per requirement in
/// declared order, then the rows of its child chapters. Requirement text has
/// the placeholders applied; headings do not.
#[instrument(level = "debug", skip_all, fields(chapters = chapters.len()))]
pub fn linearize<R, E>(
    chapters: &[Chapter<R>],
    placeholders: &Placeholders,
    engine: &E,
) -> Vec<CatalogElement>
where
    R: CatalogRequirement,
    E: TemplateEngine + ?Sized,
{
    let mut rows = Vec::new();
    for chapter in chapters {
        push_chapter(&mut rows, chapter, placeholders, engine);
    }
    rows
}

fn push_chapter<R, E>(
    rows: &mut Vec<CatalogElement>,
    chapter: &Chapter<R>,
    placeholders: &Placeholders,
    engine: &E,
) where
    R: CatalogRequirement,
    E: TemplateEngine + ?Sized,
{
    trace!(
        chapter = %chapter.number(),
        depth = chapter.number().depth(),
        "linearizing chapter"
    );

    let heading = format!("{} {}", chapter.number(), chapter.name());
    rows.push(CatalogElement {
        chapter: Some(chapter.number().to_string()),
        text: engine.to_xhtml(&heading, &Placeholders::new()),
        position: None,
        reference: None,
        applicable: true,
    });

    rows.extend(chapter.requirements().iter().map(|requirement| CatalogElement {
        chapter: None,
        text: engine.to_xhtml(requirement.text(), placeholders),
        position: Some(requirement.position().to_string()),
        reference: Some(reference_text(requirement.reference(), engine)),
        applicable: requirement.is_applicable(),
    }));

    for child in chapter.chapters() {
        push_chapter(rows, child, placeholders, engine);
    }
}

/// Renders the reference column of a requirement row.
///
/// The result is the logo image (if any), the citation text and
/// [`MODIFIED_MARKER`] if the reference was changed. A missing reference renders
/// as the empty string.
pub fn reference_text<E: TemplateEngine + ?Sized>(
    reference: Option<&Reference>,
    engine: &E,
) -> String {
    let Some(reference) = reference else {
        return String::new();
    };

    let mut text = String::new();
    if let Some(logo) = &reference.logo {
        text.push_str(&format!(
            r#"<img src="{}" alt="{}"></img><br/>"#,
            escape(&logo.url),
            escape(&logo.name)
        ));
    }
    text.push_str(&engine.to_xhtml(&reference.text, &Placeholders::new()));
    if reference.changed {
        text.push_str(MODIFIED_MARKER);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Catalog, ChapterNumber, Logo, Phase, Requirement, Tailoring},
        render::FileTemplateEngine,
    };

    fn number(s: &str) -> ChapterNumber {
        s.parse().unwrap()
    }

    fn engine() -> FileTemplateEngine {
        FileTemplateEngine::new("unused")
    }

    fn texts(rows: &[CatalogElement]) -> Vec<&str> {
        rows.iter().map(|row| row.text.as_str()).collect()
    }

    #[test]
    fn empty_parent_chapter_then_child_with_requirement() {
        let chapters = vec![Chapter::new(number("1"), "General").with_chapters(vec![
            Chapter::new(number("1.1"), "Scope")
                .with_requirements(vec![Requirement::new("a", "Do it")]),
        ])];

        let rows = linearize(&chapters, &Placeholders::new(), &engine());

        assert_eq!(rows.len(), 3);
        assert_eq!(texts(&rows), ["1 General", "1.1 Scope", "Do it"]);
        assert!(rows[0].is_chapter());
        assert!(rows[1].is_chapter());
        assert!(!rows[2].is_chapter());
        assert!(rows[2].applicable);
        assert_eq!(rows[0].chapter.as_deref(), Some("1"));
        assert_eq!(rows[1].chapter.as_deref(), Some("1.1"));
        assert_eq!(rows[2].chapter, None);
        assert_eq!(rows[2].position.as_deref(), Some("a"));
    }

    #[test]
    fn unused_fields_serialize_as_null() {
        let chapters = vec![Chapter::new(number("1"), "General")
            .with_requirements(vec![Requirement::new("a", "Do it")])];

        let rows = serde_json::to_value(linearize(&chapters, &Placeholders::new(), &engine()))
            .unwrap();

        assert_eq!(
            rows,
            serde_json::json!([
                {"chapter": "1", "text": "1 General", "position": null, "reference": null, "applicable": true},
                {"chapter": null, "text": "Do it", "position": "a", "reference": "", "applicable": true}
            ])
        );
    }

    #[test]
    fn edited_requirement_reference_is_marked_modified() {
        let catalog = Catalog::new(
            "8.1".to_string(),
            vec![Chapter::new(number("1"), "General").with_requirements(vec![
                Requirement::new("a", "Do it").with_reference(Reference::new("ECSS 5.1")),
            ])],
            Vec::new(),
        )
        .unwrap();
        let mut tailoring = Tailoring::new("SAT", &catalog, [Phase::A]);
        tailoring
            .edit_text(&number("1"), "a", "Do it twice".to_string())
            .unwrap();

        let rows = linearize(tailoring.catalog().chapters(), &Placeholders::new(), &engine());

        assert_eq!(rows[1].reference.as_deref(), Some("ECSS 5.1(mod)"));
    }

    #[test]
    fn rows_are_pre_order() {
        let chapters = vec![
            Chapter::new(number("1"), "One")
                .with_requirements(vec![Requirement::new("a", "1a"), Requirement::new("b", "1b")])
                .with_chapters(vec![
                    Chapter::new(number("1.1"), "OneOne")
                        .with_requirements(vec![Requirement::new("a", "11a")]),
                    Chapter::new(number("1.2"), "OneTwo"),
                ]),
            Chapter::new(number("2"), "Two").with_requirements(vec![Requirement::new("a", "2a")]),
        ];

        let rows = linearize(&chapters, &Placeholders::new(), &engine());

        assert_eq!(
            texts(&rows),
            [
                "1 One", "1a", "1b", "1.1 OneOne", "11a", "1.2 OneTwo", "2 Two", "2a"
            ]
        );
    }

    #[test]
    fn chapter_rows_stay_applicable_when_nothing_is_selected() {
        let catalog = Catalog::new(
            "8.1".to_string(),
            vec![Chapter::new(number("1"), "General")
                .with_requirements(vec![Requirement::new("a", "Do it")])],
            Vec::new(),
        )
        .unwrap();
        let tailoring = Tailoring::with_selection("SAT", &catalog, [Phase::A], |_, _| false);

        let rows = linearize(tailoring.catalog().chapters(), &Placeholders::new(), &engine());

        assert!(rows[0].applicable);
        assert!(!rows[1].applicable);
    }

    #[test]
    fn placeholders_apply_to_requirement_text_only() {
        let chapters = vec![Chapter::new(number("1"), "About ${PROJECT}")
            .with_requirements(vec![Requirement::new("a", "${PROJECT} shall comply")])];
        let placeholders = Placeholders::from([("PROJECT".to_string(), "SAT".to_string())]);

        let rows = linearize(&chapters, &placeholders, &engine());

        assert_eq!(texts(&rows), ["1 About ${PROJECT}", "SAT shall comply"]);
    }

    #[test]
    fn headings_are_escaped() {
        let chapters: Vec<Chapter> = vec![Chapter::new(number("1"), "Inputs & <Outputs>")];
        let rows = linearize(&chapters, &Placeholders::new(), &engine());
        assert_eq!(rows[0].text, "1 Inputs &amp; &lt;Outputs&gt;");
    }

    #[test]
    fn missing_reference_renders_empty() {
        assert_eq!(reference_text(None, &engine()), "");
    }

    #[test]
    fn modified_marker_follows_changed_flag() {
        let mut reference = Reference::new("ECSS-Q-ST-80C 5.2");
        assert_eq!(reference_text(Some(&reference), &engine()), "ECSS-Q-ST-80C 5.2");

        reference.changed = true;
        assert_eq!(
            reference_text(Some(&reference), &engine()),
            "ECSS-Q-ST-80C 5.2(mod)"
        );
    }

    #[test]
    fn logo_precedes_reference_text() {
        let reference = Reference {
            text: "ECSS".to_string(),
            changed: false,
            logo: Some(Logo {
                name: "ECSS".to_string(),
                url: "logos/ecss.png".to_string(),
            }),
        };

        assert_eq!(
            reference_text(Some(&reference), &engine()),
            r#"<img src="logos/ecss.png" alt="ECSS"></img><br/>ECSS"#
        );
    }
}
