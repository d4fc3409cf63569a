use regex::Regex;

use crate::model::{MediaFile, RenamePlanEntry};

lazy_static::lazy_static! {
    static ref NUMERIC_PREFIX: Regex = Regex::new(r"^\d+[-.]\s*").unwrap();
    static ref LESSON_PREFIX: Regex =
        Regex::new(r"^(?:第\d+[课讲节]|(?i:lesson)\s*\d+)[-.\s]*").unwrap();
}

/// Remove an ordinal left by an earlier run ("3-", "03. ") and a lesson
/// marker ("第2课", "Lesson 4 - "). A strip that would leave nothing but the
/// extension ("2024.mp4") is skipped.
pub fn clean_name(original: &str) -> String {
    let mut name = original.to_string();
    for prefix in [&*NUMERIC_PREFIX, &*LESSON_PREFIX] {
        let stripped = prefix.replace(&name, "").into_owned();
        if keeps_stem(&name, &stripped) {
            name = stripped;
        }
    }
    name
}

fn keeps_stem(before: &str, after: &str) -> bool {
    if after.is_empty() {
        return false;
    }
    match (before.rfind('.'), after.rfind('.')) {
        (Some(_), None) => false,
        (_, Some(0)) => false,
        _ => true,
    }
}

pub fn standard_file_name(original: &str, ordinal: usize) -> String {
    format!("{}-{}", ordinal, clean_name(original))
}

/// Number the files 1..N in the order given. Every call starts again from 1.
pub fn build_plan(files: &[MediaFile]) -> Vec<RenamePlanEntry> {
    files
        .iter()
        .enumerate()
        .map(|(index, file)| RenamePlanEntry {
            id: file.id.clone(),
            original_name: file.name.clone(),
            new_name: standard_file_name(&file.name, index + 1),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewRow<'a> {
    Entry {
        ordinal: usize,
        entry: &'a RenamePlanEntry,
    },
    Elided(usize),
}

const PREVIEW_EDGE: usize = 10;

/// Rows to show before a batch runs: the whole plan, or its first and last
/// ten entries around a marker when it is longer than twenty.
pub fn preview(plan: &[RenamePlanEntry]) -> Vec<PreviewRow<'_>> {
    let numbered = |(index, entry)| PreviewRow::Entry {
        ordinal: index + 1,
        entry,
    };
    if plan.len() <= PREVIEW_EDGE * 2 {
        return plan.iter().enumerate().map(numbered).collect();
    }

    let tail_start = plan.len() - PREVIEW_EDGE;
    let mut rows: Vec<PreviewRow<'_>> = plan
        .iter()
        .enumerate()
        .take(PREVIEW_EDGE)
        .map(numbered)
        .collect();
    rows.push(PreviewRow::Elided(tail_start - PREVIEW_EDGE));
    rows.extend(plan.iter().enumerate().skip(tail_start).map(numbered));
    rows
}
