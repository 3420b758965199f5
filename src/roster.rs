use std::rc::Rc;

use serde::Deserialize;
use tracing::warn;

use crate::calc::{Assignment, Category, Class, ClassType};
use crate::store::StateStore;

/// Partial-field replacement for the active class. Omitted fields keep their
/// prior values; the class type is immutable and deliberately absent here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Assignment>>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}

/// The only mutable store in the system: the ordered class list plus the
/// active selection. Every mutation of the list persists the full roster
/// through the store injected at construction.
pub struct Roster {
    classes: Vec<Class>,
    active_index: usize,
    store: Rc<dyn StateStore>,
}

impl Roster {
    pub fn new(classes: Vec<Class>, store: Rc<dyn StateStore>) -> Self {
        Self {
            classes,
            active_index: 0,
            store,
        }
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// `None` while the roster is empty or the selection is out of range.
    pub fn active_class(&self) -> Option<&Class> {
        self.classes.get(self.active_index)
    }

    pub fn class_at(&self, index: usize) -> Option<&Class> {
        self.classes.get(index)
    }

    /// Appends a new empty class. A blank name is a rejected no-op.
    pub fn add_class(&mut self, name: &str, class_type: ClassType) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.classes.push(Class::new(name, class_type));
        self.persist();
        true
    }

    /// Bounds are the caller's responsibility; an out-of-range index simply
    /// leaves no class active until the next switch. The selection is session
    /// state and is not persisted.
    pub fn switch_class(&mut self, index: usize) {
        self.active_index = index;
    }

    /// Renames the class at `index`. Blank names and unknown indexes are
    /// rejected no-ops.
    pub fn rename_class(&mut self, index: usize, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }
        let Some(class) = self.classes.get_mut(index) else {
            return false;
        };
        class.name = new_name.to_string();
        self.persist();
        true
    }

    /// Removes the class at `index`. Deleting the active slot snaps the
    /// selection back to the first class; deleting any other slot leaves the
    /// selection index untouched even though later classes shift down.
    pub fn delete_class(&mut self, index: usize) -> bool {
        if index >= self.classes.len() {
            return false;
        }
        self.classes.remove(index);
        if self.active_index == index {
            self.active_index = 0;
        }
        self.persist();
        true
    }

    /// Merges `patch` into the active class. Returns false when nothing is
    /// active.
    pub fn update_active(&mut self, patch: ClassPatch) -> bool {
        let Some(class) = self.classes.get_mut(self.active_index) else {
            return false;
        };
        if let Some(name) = patch.name {
            class.name = name;
        }
        if let Some(data) = patch.data {
            class.data = data;
        }
        if let Some(categories) = patch.categories {
            class.categories = categories;
        }
        self.persist();
        true
    }

    /// Import path: the previous roster is discarded in a single assignment
    /// and the selection returns to the first class.
    pub fn replace_all(&mut self, classes: Vec<Class>) {
        self.classes = classes;
        self.active_index = 0;
        self.persist();
    }

    /// Persistence is fire-and-forget: a failed write leaves the previous
    /// snapshot on disk and the in-memory roster authoritative until the next
    /// successful write.
    fn persist(&self) {
        if let Err(e) = self.store.save_classes(&self.classes) {
            warn!(error = %e, "failed to persist class roster");
        }
    }
}
