use serde::{Deserialize, Serialize};

/// A category picked in the category selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChoice {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub kind: Option<i64>,
}

/// A task picked in the task selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChoice {
    pub id: String,
    pub name: String,
}

/// Current state of the two selector widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub category: Option<CategoryChoice>,
    pub task: Option<TaskChoice>,
}

impl Selection {
    /// Changing the category invalidates the task choice.
    pub fn select_category(&mut self, category: Option<CategoryChoice>) {
        self.category = category;
        self.task = None;
    }

    pub fn select_task(&mut self, task: Option<TaskChoice>) {
        self.task = task;
    }

    /// Id of the selected task, if any and non-empty.
    pub fn task_id(&self) -> Option<&str> {
        self.task
            .as_ref()
            .map(|t| t.id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn task_name(&self) -> Option<&str> {
        self.task.as_ref().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_category_clears_task() {
        let mut selection = Selection::default();
        selection.select_category(Some(CategoryChoice {
            id: "1".into(),
            name: "Study".into(),
            color: None,
            kind: None,
        }));
        selection.select_task(Some(TaskChoice {
            id: "10".into(),
            name: "Read".into(),
        }));
        assert_eq!(selection.task_id(), Some("10"));

        selection.select_category(None);
        assert_eq!(selection.task_id(), None);
    }

    #[test]
    fn empty_task_id_is_no_selection() {
        let selection = Selection {
            category: None,
            task: Some(TaskChoice {
                id: String::new(),
                name: "--Select Task--".into(),
            }),
        };
        assert_eq!(selection.task_id(), None);
    }
}
