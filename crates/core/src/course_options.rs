//! Course options step: the ordered "what you will learn" and
//! prerequisite lists.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ordering::array_move;

/// Maximum entries per list.
pub const MAX_OPTION_ITEMS: usize = 10;

/// Maximum characters per entry.
pub const MAX_OPTION_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionItem {
    pub title: String,
}

/// Which list an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionList {
    Benefits,
    Prerequisites,
}

impl OptionList {
    pub fn label(self) -> &'static str {
        match self {
            Self::Benefits => "Benefit",
            Self::Prerequisites => "Prerequisite",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOptions {
    #[serde(default)]
    pub benefits: Vec<OptionItem>,
    #[serde(default)]
    pub prerequisites: Vec<OptionItem>,
}

impl CourseOptions {
    pub fn list(&self, list: OptionList) -> &[OptionItem] {
        match list {
            OptionList::Benefits => &self.benefits,
            OptionList::Prerequisites => &self.prerequisites,
        }
    }

    fn list_mut(&mut self, list: OptionList) -> &mut Vec<OptionItem> {
        match list {
            OptionList::Benefits => &mut self.benefits,
            OptionList::Prerequisites => &mut self.prerequisites,
        }
    }

    /// Append a trimmed entry.
    pub fn add(&self, list: OptionList, title: &str) -> Result<Self, CoreError> {
        let title = title.trim();
        validate_title(list, title)?;
        if self.list(list).len() >= MAX_OPTION_ITEMS {
            return Err(CoreError::Validation(format!(
                "You can add up to {MAX_OPTION_ITEMS} {}s only",
                list.label().to_lowercase()
            )));
        }
        let mut next = self.clone();
        next.list_mut(list).push(OptionItem {
            title: title.to_string(),
        });
        Ok(next)
    }

    pub fn remove(&self, list: OptionList, index: usize) -> Result<Self, CoreError> {
        if index >= self.list(list).len() {
            return Err(CoreError::NotFound {
                entity: list.label(),
                id: index.to_string(),
            });
        }
        let mut next = self.clone();
        next.list_mut(list).remove(index);
        Ok(next)
    }

    /// Drag-and-drop reorder by position.
    pub fn reorder(&self, list: OptionList, from: usize, to: usize) -> Self {
        let mut next = self.clone();
        array_move(next.list_mut(list), from, to);
        next
    }
}

fn validate_title(list: OptionList, title: &str) -> Result<(), CoreError> {
    if title.is_empty() {
        return Err(CoreError::Validation(format!(
            "{} cannot be empty",
            list.label()
        )));
    }
    if title.chars().count() > MAX_OPTION_TITLE_CHARS {
        return Err(CoreError::Validation(format!(
            "{} must not exceed {MAX_OPTION_TITLE_CHARS} characters",
            list.label()
        )));
    }
    Ok(())
}

/// Validate both lists as a whole (used when advancing the wizard).
pub fn validate_course_options(options: &CourseOptions) -> Result<(), CoreError> {
    for list in [OptionList::Benefits, OptionList::Prerequisites] {
        let items = options.list(list);
        if items.len() > MAX_OPTION_ITEMS {
            return Err(CoreError::Validation(format!(
                "At most {MAX_OPTION_ITEMS} {}s are allowed",
                list.label().to_lowercase()
            )));
        }
        for item in items {
            validate_title(list, item.title.trim())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_trims_and_appends() {
        let options = CourseOptions::default()
            .add(OptionList::Benefits, "  Build a REST API ")
            .unwrap();
        assert_eq!(options.benefits[0].title, "Build a REST API");
        assert!(options.prerequisites.is_empty());
    }

    #[test]
    fn add_rejects_empty_and_long_titles() {
        let options = CourseOptions::default();
        assert!(options.add(OptionList::Prerequisites, "   ").is_err());
        assert!(options
            .add(OptionList::Prerequisites, &"a".repeat(201))
            .is_err());
        assert!(options
            .add(OptionList::Prerequisites, &"a".repeat(200))
            .is_ok());
    }

    #[test]
    fn add_stops_at_ten_entries() {
        let mut options = CourseOptions::default();
        for i in 0..MAX_OPTION_ITEMS {
            options = options.add(OptionList::Benefits, &format!("b{i}")).unwrap();
        }
        assert!(options.add(OptionList::Benefits, "one more").is_err());
        assert!(options.add(OptionList::Prerequisites, "other list").is_ok());
    }

    #[test]
    fn remove_and_reorder() {
        let options = CourseOptions::default()
            .add(OptionList::Benefits, "a")
            .unwrap()
            .add(OptionList::Benefits, "b")
            .unwrap()
            .add(OptionList::Benefits, "c")
            .unwrap();
        let reordered = options.reorder(OptionList::Benefits, 2, 0);
        let titles: Vec<_> = reordered.benefits.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["c", "a", "b"]);

        let removed = reordered.remove(OptionList::Benefits, 1).unwrap();
        assert_eq!(removed.benefits.len(), 2);
        assert!(removed.remove(OptionList::Benefits, 5).is_err());
    }

    #[test]
    fn validate_whole_lists() {
        let mut options = CourseOptions::default();
        assert!(validate_course_options(&options).is_ok());
        options.prerequisites.push(OptionItem { title: " ".into() });
        assert!(validate_course_options(&options).is_err());
    }
}
