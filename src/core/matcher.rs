//! Department classifier.
//!
//! Pure scoring, no I/O. Free-text department strings are compared
//! against every catalog entry's canonical name and aliases with
//! Jaro-Winkler similarity (standard parameterization: prefix scale 0.1
//! over up to four leading characters) after trimming and uppercasing
//! both sides. Catalog order is the tie-break: scores are compared with
//! strictly-greater, so the first entry reaching the maximum wins.

use crate::domain::model::{CatalogEntry, ClassifiedUser, DirectoryUser};
use strsim::jaro_winkler;

fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}

/// Assign the best canonical department for one user.
///
/// The user is confidently matched when the best score meets
/// `threshold`; otherwise the best guess and its score are still
/// carried so the user can be reported for manual review.
pub fn classify(user: DirectoryUser, catalog: &[CatalogEntry], threshold: f64) -> ClassifiedUser {
    let raw = normalize(&user.department);

    let mut best_name = String::new();
    let mut best_score = 0.0_f64;

    // An empty department scores 0 against everything.
    if !raw.is_empty() {
        for entry in catalog {
            let canonical = normalize(&entry.department_name);
            let mut entry_best = if canonical.is_empty() {
                0.0
            } else {
                jaro_winkler(&raw, &canonical)
            };

            for alias in &entry.sub_list {
                let alias = normalize(alias);
                if alias.is_empty() {
                    continue;
                }
                let score = jaro_winkler(&raw, &alias);
                if score > entry_best {
                    entry_best = score;
                }
            }

            if entry_best > best_score {
                best_score = entry_best;
                best_name = entry.department_name.clone();
            }
        }
    }

    let matched = if !best_name.is_empty() && best_score >= threshold {
        Some(best_name.clone())
    } else {
        None
    };

    ClassifiedUser {
        user,
        matched,
        best_guess: best_name,
        confidence: best_score,
    }
}
