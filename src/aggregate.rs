//! Grouping requirements by the deliverable documents they call for.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument, warn};

use crate::domain::{Catalog, CatalogRequirement, ChapterNumber, Drd, Phase};

/// The label of a requirement in DRD listings: `{chapter}.{position}`.
#[must_use]
pub fn label(chapter: &ChapterNumber, position: &str) -> String {
    format!("{chapter}.{position}")
}

/// Collects, for every DRD delivered in one of the active phases, the labels of
/// the requirements that reference it.
///
/// The whole tree is traversed, whatever a requirement's applicability. DRDs
/// without a phase in `phases` do not appear in the result, and neither do DRDs
/// no requirement references.
#[instrument(level = "debug", skip_all, fields(version = catalog.version()))]
pub fn aggregate<'a, R: CatalogRequirement>(
    catalog: &'a Catalog<R>,
    phases: &BTreeSet<Phase>,
) -> BTreeMap<&'a Drd, BTreeSet<String>> {
    let mut buckets: BTreeMap<&Drd, BTreeSet<String>> = BTreeMap::new();

    for chapter in catalog.walk() {
        for requirement in chapter.requirements() {
            let Some(references) = requirement.drds() else {
                continue;
            };
            for number in references {
                let Some(drd) = catalog.drd(number) else {
                    warn!(
                        chapter = %chapter.number(),
                        position = requirement.position(),
                        drd = number,
                        "requirement references an undefined DRD"
                    );
                    continue;
                };
                if drd.applies_to(phases) {
                    buckets
                        .entry(drd)
                        .or_default()
                        .insert(label(chapter.number(), requirement.position()));
                }
            }
        }
    }

    debug!(drds = buckets.len(), "aggregated DRDs");
    buckets
}
