use serde::{Deserialize, Serialize};

/// Per-notebook counters returned by the backend under `_count`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NotebookCount {
    #[serde(default)]
    pub notes: u32,
}

/// A folder-like container. `parent_id == None` marks a root notebook.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Notebook {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub icon: Option<String>,

    /// Explicit sibling order key; ties fall back to the name.
    #[serde(default)]
    pub sort_order: i32,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,

    #[serde(rename = "_count", default)]
    pub count: NotebookCount,
}

/// Note as listed inside a notebook (no full body guarantee).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NoteSummary {
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Plain-text preview. The listing endpoint may call it `plainText`.
    #[serde(default, alias = "plainText")]
    pub content: String,

    #[serde(default)]
    pub notebook_id: Option<String>,

    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub sort_order: i32,

    /// ISO-8601 timestamps; same-format strings compare chronologically.
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub created_at: String,
}

/// Full note record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub notebook_id: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Note {
    pub fn summary(&self) -> NoteSummary {
        NoteSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            notebook_id: self.notebook_id.clone(),
            is_pinned: self.is_pinned,
            sort_order: self.sort_order,
            updated_at: self.updated_at.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// What the editor buffers between keystrokes and the next save.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct NoteDraft {
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    pub fn of(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
        }
    }
}
