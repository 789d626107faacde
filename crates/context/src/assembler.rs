//! The context assembler implementation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use tidepool_core::knowledge::{Folder, Item};

/// Fixed first line of the assembled block.
pub const KNOWLEDGE_HEADER: &str = "===== ATTACHED KNOWLEDGE =====";

/// Fixed last line of the assembled block, before the instruction sentence.
pub const KNOWLEDGE_FOOTER: &str = "===== END ATTACHED KNOWLEDGE =====";

const KNOWLEDGE_INSTRUCTION: &str =
    "Use the attached knowledge above when it is relevant to the user's request.";

/// Heading level for items selected directly.
const ITEM_LEVEL: usize = 2;

/// All inputs for a single assembly pass.
pub struct AssemblyInput<'a> {
    /// The workspace's `knowledge_in_context`, in array order.
    pub selection: &'a [String],
    /// Canonical folder collection.
    pub folders: &'a [Folder],
    /// Canonical item collection.
    pub items: &'a [Item],
}

/// What an input ID resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedKind {
    Item,
    Folder,
}

/// One successfully resolved input ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedEntity {
    pub id: String,
    pub kind: ResolvedKind,
}

/// The assembled block plus the per-ID resolution report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledKnowledge {
    /// The text to concatenate onto the system prompt. Empty when the
    /// selection is empty.
    pub text: String,
    pub resolved: Vec<ResolvedEntity>,
    /// IDs that resolved to neither an item nor a folder; dropped from the
    /// text (log-and-drop policy).
    pub unresolved: Vec<String>,
}

impl AssembledKnowledge {
    fn empty() -> Self {
        Self {
            text: String::new(),
            resolved: Vec::new(),
            unresolved: Vec::new(),
        }
    }
}

/// The context assembler. Stateless — create one and reuse it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the selection into one deterministic text block.
    ///
    /// # Algorithm
    ///
    /// 1. Emit the fixed header line.
    /// 2. For each ID in array order: an item renders as a `##` block with
    ///    `###` sections and fenced file contents; a folder renders its
    ///    name/description, then every item whose **primary** `folder_id`
    ///    equals the folder's ID, one heading level deeper. (Secondary
    ///    `folder_ids` memberships are deliberately not expanded.)
    /// 3. Emit the fixed footer line and the instruction sentence.
    pub fn assemble(&self, input: &AssemblyInput<'_>) -> AssembledKnowledge {
        if input.selection.is_empty() {
            return AssembledKnowledge::empty();
        }

        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        let mut text = String::new();
        text.push_str(KNOWLEDGE_HEADER);
        text.push_str("\n\n");

        for id in input.selection {
            if let Some(item) = input.items.iter().find(|i| &i.id == id) {
                render_item(&mut text, item, ITEM_LEVEL);
                resolved.push(ResolvedEntity {
                    id: id.clone(),
                    kind: ResolvedKind::Item,
                });
            } else if let Some(folder) = input.folders.iter().find(|f| &f.id == id) {
                render_folder(&mut text, folder, input.items);
                resolved.push(ResolvedEntity {
                    id: id.clone(),
                    kind: ResolvedKind::Folder,
                });
            } else {
                warn!(entity_id = %id, "Knowledge ID did not resolve, dropping from context");
                unresolved.push(id.clone());
            }
        }

        text.push_str(KNOWLEDGE_FOOTER);
        text.push('\n');
        text.push_str(KNOWLEDGE_INSTRUCTION);
        text.push('\n');

        AssembledKnowledge {
            text,
            resolved,
            unresolved,
        }
    }
}

fn render_folder(out: &mut String, folder: &Folder, items: &[Item]) {
    out.push_str(&format!(
        "## Knowledge Folder: {} ##\n{}\n\n",
        folder.name, folder.description
    ));
    // Only the primary membership expands — collection order, one heading
    // level deeper than directly selected items.
    for item in items
        .iter()
        .filter(|i| i.folder_id.as_deref() == Some(folder.id.as_str()))
    {
        render_item(out, item, ITEM_LEVEL + 1);
    }
}

fn render_item(out: &mut String, item: &Item, level: usize) {
    let heading = "#".repeat(level);
    out.push_str(&format!(
        "{heading} {} {heading}\n{}\n\n",
        item.title, item.content
    ));

    let section_heading = "#".repeat(level + 1);
    for section in &item.sections {
        out.push_str(&format!(
            "{section_heading} {} {section_heading}\n{}\n\n",
            section.title, section.content
        ));
    }

    for file in &item.files {
        match file.content.as_deref() {
            Some(content) if !content.is_empty() => {
                out.push_str(&format!("```{}\n{content}\n```\n\n", file.name));
            }
            _ => {}
        }
    }
}
