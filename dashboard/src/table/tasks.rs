//! @ai:module:intent EGRA/EGMA task identifiers and the upload template layout
//! @ai:module:layer domain
//! @ai:module:stateless true

/// Early-grade reading assessment subtasks.
pub const EGRA_TASKS: [&str; 7] = [
    "clpm",
    "phoneme",
    "sound_word",
    "cwpm",
    "listening",
    "orf",
    "comprehension",
];

/// Early-grade mathematics assessment subtasks.
pub const EGMA_TASKS: [&str; 6] = [
    "number_id",
    "discrimin",
    "missing_number",
    "addition",
    "subtraction",
    "problems",
];

const CONTEXT_COLUMNS: [&str; 16] = [
    "child_reaction1",
    "child_reaction2",
    "child_reaction3",
    "st_age",
    "st_english_home",
    "st_dutch_home",
    "st_other_language",
    "st_other_txt",
    "st_daycare",
    "st_earlystimulation_classes",
    "st_attend_gr1gr2",
    "st_nb_miss_school",
    "st_nb_beenlate_school",
    "ses",
    "home_support",
    "language_teaching",
];

/// @ai:intent Full column list of an empty upload template
/// @ai:effects pure
pub fn template_columns() -> Vec<&'static str> {
    ["pupil_id", "school", "stgender"]
        .into_iter()
        .chain(EGRA_TASKS)
        .chain(EGMA_TASKS)
        .chain(CONTEXT_COLUMNS)
        .collect()
}

/// @ai:intent Check whether an identifier is a known assessment task
/// @ai:effects pure
pub fn is_task(id: &str) -> bool {
    EGRA_TASKS.contains(&id) || EGMA_TASKS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_contains_every_task_once() {
        let columns = template_columns();
        assert_eq!(columns.len(), 32);
        for task in EGRA_TASKS.iter().chain(EGMA_TASKS.iter()) {
            assert_eq!(columns.iter().filter(|c| *c == task).count(), 1);
        }
        assert_eq!(columns[0], "pupil_id");
    }

    #[test]
    fn test_is_task() {
        assert!(is_task("orf"));
        assert!(is_task("subtraction"));
        assert!(!is_task("school"));
    }
}
