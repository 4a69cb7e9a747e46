// src/library.rs
//! Saved prompts ("My Prompts") and the public subset ("Community").
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::credits::write_atomic;
use crate::error::StoreError;
use crate::optimizer::{OptimizedPrompt, Target};

pub const LIBRARY_FILENAME: &str = "prompts.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub id: Uuid,
    pub owner: String,
    pub idea: String,
    pub prompt: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub target: Target,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_public: bool,
}

impl SavedPrompt {
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn title(&self) -> String {
        let first = self.idea.lines().next().unwrap_or_default().trim();
        if first.chars().count() > 60 {
            format!("{}...", first.chars().take(57).collect::<String>())
        } else {
            first.to_string()
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# {}\n\n_Target: {} | Created: {}_\n\n## Original idea\n\n{}\n\n## Prompt\n\n{}\n",
            self.title(),
            self.target,
            self.created_at.format("%Y-%m-%d %H:%M UTC"),
            self.idea.trim(),
            self.prompt.trim(),
        );
        if !self.suggestions.is_empty() {
            out.push_str("\n## Suggestions\n\n");
            for s in &self.suggestions {
                out.push_str(&format!("- {}\n", s));
            }
        }
        out
    }
}

/// JSON-file backed prompt library shared by all identities on this machine.
pub struct PromptLibrary {
    path: PathBuf,
}

impl PromptLibrary {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(LIBRARY_FILENAME),
        }
    }

    fn load(&self) -> Result<Vec<SavedPrompt>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, prompts: &[SavedPrompt]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(prompts).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &json)
    }

    pub fn add(
        &self,
        owner: &str,
        idea: &str,
        target: Target,
        result: &OptimizedPrompt,
    ) -> Result<SavedPrompt, StoreError> {
        let mut prompts = self.load()?;
        let saved = SavedPrompt {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            idea: idea.trim().to_string(),
            prompt: result.prompt.clone(),
            suggestions: result.suggestions.clone(),
            target,
            created_at: Utc::now(),
            is_public: false,
        };
        prompts.push(saved.clone());
        self.save(&prompts)?;
        log::debug!("saved prompt {} for {}", saved.id, owner);
        Ok(saved)
    }

    /// Prompts owned by `owner`, newest first.
    pub fn list(&self, owner: &str) -> Result<Vec<SavedPrompt>, StoreError> {
        let mut mine: Vec<_> = self.load()?.into_iter().filter(|p| p.owner == owner).collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    /// Public prompts from every owner, newest first.
    pub fn community(&self) -> Result<Vec<SavedPrompt>, StoreError> {
        let mut shared: Vec<_> = self.load()?.into_iter().filter(|p| p.is_public).collect();
        shared.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shared)
    }

    /// Look up by id or unique id prefix. Visible when owned or public.
    pub fn get(&self, owner: &str, id: &str) -> Result<SavedPrompt, StoreError> {
        let prompts = self.load()?;
        let idx = find_index(&prompts, id)?;
        let found = &prompts[idx];
        if found.owner != owner && !found.is_public {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(found.clone())
    }

    pub fn delete(&self, owner: &str, id: &str) -> Result<SavedPrompt, StoreError> {
        let mut prompts = self.load()?;
        let idx = find_index(&prompts, id)?;
        if prompts[idx].owner != owner {
            return Err(StoreError::NotOwner(id.to_string()));
        }
        let removed = prompts.remove(idx);
        self.save(&prompts)?;
        Ok(removed)
    }

    pub fn set_public(
        &self,
        owner: &str,
        id: &str,
        is_public: bool,
    ) -> Result<SavedPrompt, StoreError> {
        let mut prompts = self.load()?;
        let idx = find_index(&prompts, id)?;
        if prompts[idx].owner != owner {
            return Err(StoreError::NotOwner(id.to_string()));
        }
        prompts[idx].is_public = is_public;
        let updated = prompts[idx].clone();
        self.save(&prompts)?;
        Ok(updated)
    }
}

fn find_index(prompts: &[SavedPrompt], id: &str) -> Result<usize, StoreError> {
    let needle = id.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(StoreError::NotFound(id.to_string()));
    }

    let mut matches = prompts
        .iter()
        .enumerate()
        .filter(|(_, p)| p.id.simple().to_string().starts_with(&needle))
        .map(|(i, _)| i);

    match (matches.next(), matches.next()) {
        (Some(i), None) => Ok(i),
        (None, _) => Err(StoreError::NotFound(id.to_string())),
        (Some(_), Some(_)) => Err(StoreError::Ambiguous(id.to_string())),
    }
}

// =============================================================================
// MODULE TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn result(prompt: &str) -> OptimizedPrompt {
        OptimizedPrompt {
            prompt: prompt.into(),
            suggestions: vec!["Add dark mode".into()],
        }
    }

    fn library() -> (tempfile::TempDir, PromptLibrary) {
        let dir = tempfile::tempdir().unwrap();
        let lib = PromptLibrary::open(&dir.path().join("data"));
        (dir, lib)
    }

    #[test]
    fn empty_library_lists_nothing() {
        let (_dir, lib) = library();
        assert!(lib.list("me").unwrap().is_empty());
        assert!(lib.community().unwrap().is_empty());
    }

    #[test]
    fn add_then_list_by_owner() {
        let (_dir, lib) = library();
        lib.add("me", "Habit tracker", Target::Lovable, &result("Build a habit tracker")).unwrap();
        lib.add("you", "Chess clock", Target::V0, &result("Build a chess clock")).unwrap();

        let mine = lib.list("me").unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].prompt, "Build a habit tracker");
        assert_eq!(mine[0].target, Target::Lovable);
        assert!(!mine[0].is_public);
    }

    #[test]
    fn get_by_short_id_prefix() {
        let (_dir, lib) = library();
        let saved = lib.add("me", "Idea", Target::Cursor, &result("P")).unwrap();
        let found = lib.get("me", &saved.short_id()).unwrap();
        assert_eq!(found.id, saved.id);
        let found = lib.get("me", &saved.id.to_string()).unwrap();
        assert_eq!(found.id, saved.id);
    }

    #[test]
    fn private_prompts_are_hidden_from_others() {
        let (_dir, lib) = library();
        let saved = lib.add("me", "Idea", Target::Bolt, &result("P")).unwrap();
        assert!(matches!(lib.get("you", &saved.short_id()), Err(StoreError::NotFound(_))));

        lib.set_public("me", &saved.short_id(), true).unwrap();
        assert_eq!(lib.get("you", &saved.short_id()).unwrap().id, saved.id);
        assert_eq!(lib.community().unwrap().len(), 1);
    }

    #[test]
    fn only_owner_can_share_or_delete() {
        let (_dir, lib) = library();
        let saved = lib.add("me", "Idea", Target::Bolt, &result("P")).unwrap();
        let id = saved.short_id();
        assert!(matches!(lib.set_public("you", &id, true), Err(StoreError::NotOwner(_))));
        assert!(matches!(lib.delete("you", &id), Err(StoreError::NotOwner(_))));

        let removed = lib.delete("me", &id).unwrap();
        assert_eq!(removed.id, saved.id);
        assert!(lib.list("me").unwrap().is_empty());
    }

    #[test]
    fn unknown_or_blank_id_is_not_found() {
        let (_dir, lib) = library();
        lib.add("me", "Idea", Target::Generic, &result("P")).unwrap();
        assert!(matches!(lib.get("me", "zzzz"), Err(StoreError::NotFound(_))));
        assert!(matches!(lib.get("me", "  "), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn ambiguous_prefix_is_rejected() {
        let (_dir, lib) = library();
        for _ in 0..40 {
            lib.add("me", "Idea", Target::Generic, &result("P")).unwrap();
        }
        // 40 ids over 16 leading hex digits guarantee a shared first digit
        let all = lib.list("me").unwrap();
        let digit = (0..16)
            .map(|d| format!("{:x}", d))
            .find(|d| all.iter().filter(|p| p.short_id().starts_with(d.as_str())).count() > 1)
            .unwrap();
        assert!(matches!(lib.get("me", &digit), Err(StoreError::Ambiguous(_))));
    }

    #[test]
    fn corrupt_library_is_reported() {
        let (dir, lib) = library();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join(LIBRARY_FILENAME), "[{oops").unwrap();
        assert!(matches!(lib.list("me"), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn markdown_export_has_sections() {
        let (_dir, lib) = library();
        let saved = lib
            .add("me", "Habit tracker\nwith streaks", Target::Replit, &result("Build it"))
            .unwrap();
        let md = saved.to_markdown();
        assert!(md.starts_with("# Habit tracker\n"));
        assert!(md.contains("_Target: Replit"));
        assert!(md.contains("## Prompt\n\nBuild it"));
        assert!(md.contains("- Add dark mode"));
    }

    #[test]
    fn long_titles_are_truncated() {
        let saved = SavedPrompt {
            id: Uuid::new_v4(),
            owner: "me".into(),
            idea: "x".repeat(100),
            prompt: "p".into(),
            suggestions: vec![],
            target: Target::Generic,
            created_at: Utc::now(),
            is_public: false,
        };
        assert_eq!(saved.title().chars().count(), 60);
        assert!(saved.title().ends_with("..."));
    }
}
