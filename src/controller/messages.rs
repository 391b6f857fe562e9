//! Outcome messages. Each batch message is chosen from the
//! `(affected, unaffected)` pair alone; every pair maps to exactly one text.

use serde::{Deserialize, Serialize};

/// How a resource is named in messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Noun {
    singular: String,
    plural: String,
}

impl Noun {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self { singular: singular.into(), plural: plural.into() }
    }

    /// Plural formed with a trailing `s`.
    pub fn regular(singular: impl Into<String>) -> Self {
        let singular = singular.into();
        let plural = format!("{singular}s");
        Self { singular, plural }
    }

    #[must_use]
    pub fn singular(&self) -> &str {
        &self.singular
    }

    #[must_use]
    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// Singular with its first letter capitalized.
    #[must_use]
    pub fn title(&self) -> String {
        capitalize(&self.singular)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn created(n: &Noun) -> String {
    format!("{} inserted successfully.", n.title())
}

pub fn created_many(n: &Noun, (inserted, rejected): (usize, usize)) -> String {
    let p = n.plural();
    match (inserted > 0, rejected > 0) {
        (false, false) => format!("No {p} were provided for insertion."),
        (true, false) => format!("All {p} were inserted successfully."),
        (false, true) => format!("None of the {p} could be inserted."),
        (true, true) => format!("Some {p} were inserted, while others were rejected."),
    }
}

pub fn listed(n: &Noun) -> String {
    format!("{} retrieved successfully.", capitalize(n.plural()))
}

pub fn fetched(n: &Noun) -> String {
    format!("{} retrieved successfully.", n.title())
}

pub fn patched(n: &Noun, (updated, unchanged): (usize, usize)) -> String {
    let p = n.plural();
    match (updated > 0, unchanged > 0) {
        (false, false) => format!("No {p} matched for the update."),
        (false, true) => {
            format!("All matched {p} already contain the same data as the new data. No changes were made.")
        }
        (true, false) => format!("All matched {p} were updated successfully."),
        (true, true) => {
            format!("Some matched {p} were updated, while others already contain the same data as the new data.")
        }
    }
}

pub fn patched_by_id(n: &Noun, (updated, unchanged): (usize, usize)) -> String {
    if updated > 0 {
        format!("{} updated successfully.", n.title())
    } else if unchanged > 0 {
        "No changes were made because the provided data is the same as the current data.".to_string()
    } else {
        format!("No {} matched for the update.", n.singular())
    }
}

pub fn deleted(n: &Noun, (deleted, kept): (usize, usize)) -> String {
    let p = n.plural();
    match (deleted > 0, kept > 0) {
        (false, false) => format!("No {p} matched for the deletion."),
        (false, true) => format!("None of the matched {p} could be deleted."),
        (true, false) => format!("All matched {p} were deleted successfully."),
        (true, true) => format!("Some matched {p} were deleted, but not all, due to some reason."),
    }
}

pub fn deleted_by_id(n: &Noun, (deleted, kept): (usize, usize)) -> String {
    if deleted > 0 {
        format!("{} deleted successfully.", n.title())
    } else if kept > 0 {
        format!("The {} could not be deleted.", n.singular())
    } else {
        format!("No {} matched for the deletion.", n.singular())
    }
}
