//! Reading, writing and syncing individual markdown articles.

use crate::core::loader::read_entries;
use crate::core::path;
use crate::core::remote::{encode_content, RemoteProvider};
use crate::core::store::TreeStore;
use crate::{Result, Workspace};
use serde::{Deserialize, Serialize};
use std::fs;

/// A markdown file's content and workspace-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub content: String,
    pub path: String,
}

/// A markdown file found below a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownFile {
    pub path: String,
    pub name: String,
}

/// Reads an article from disk, falling back to the remote copy.
///
/// # Errors
///
/// Returns the local I/O error when there is no provider, otherwise the
/// provider's error.
pub async fn read_article(
    workspace: &Workspace,
    provider: Option<&dyn RemoteProvider>,
    rel_path: &str,
) -> Result<Article> {
    let local = workspace
        .abs_path(rel_path)
        .and_then(|abs| Ok(fs::read_to_string(abs)?));
    let content = match (local, provider) {
        (Ok(content), _) => content,
        (Err(e), None) => return Err(e),
        (Err(e), Some(provider)) => {
            log::debug!(
                "{rel_path} not readable locally ({e}); fetching from {}",
                provider.name()
            );
            provider.get_file_content(rel_path).await?.decode()?
        }
    };
    Ok(Article {
        content,
        path: rel_path.to_string(),
    })
}

/// Downloads a remote article into the workspace and records its revision.
pub async fn pull_article(
    workspace: &Workspace,
    provider: &dyn RemoteProvider,
    tree: &TreeStore,
    rel_path: &str,
) -> Result<Article> {
    let remote = provider.get_file_content(rel_path).await?;
    let content = remote.decode()?;
    write_file(workspace, rel_path, &content)?;

    tree.update(|t| {
        if let Some(id) = t.find(rel_path) {
            t.mark_on_disk(id);
            if let Some(node) = t.get_mut(id) {
                node.remote_revision = Some(remote.revision.clone());
            }
        }
    });
    log::info!("pulled {rel_path} from {}", provider.name());
    Ok(Article {
        content,
        path: rel_path.to_string(),
    })
}

/// Writes `content` to `rel_path`, creating intermediate folders.
///
/// Empty content is ignored and `Ok(false)` returned.
pub fn save_article(
    workspace: &Workspace,
    tree: &TreeStore,
    rel_path: &str,
    content: &str,
) -> Result<bool> {
    if content.is_empty() {
        return Ok(false);
    }
    write_file(workspace, rel_path, content)?;
    tree.update(|t| {
        if let Some(id) = t.find(rel_path) {
            t.mark_on_disk(id);
        }
    });
    Ok(true)
}

/// Uploads the local copy of `rel_path` and returns the new remote revision.
pub async fn push_article(
    workspace: &Workspace,
    provider: &dyn RemoteProvider,
    tree: &TreeStore,
    rel_path: &str,
    message: &str,
) -> Result<String> {
    let content = fs::read_to_string(workspace.abs_path(rel_path)?)?;
    let previous = tree.update(|t| {
        t.find(rel_path)
            .and_then(|id| t.get(id))
            .and_then(|n| n.remote_revision.clone())
    });

    let revision = provider
        .put_file(rel_path, &encode_content(&content), previous.as_deref(), message)
        .await?;

    tree.update(|t| {
        if let Some(node) = t.find(rel_path).and_then(|id| t.get_mut(id)) {
            node.remote_revision = Some(revision.clone());
            node.is_local_only = false;
        }
    });
    log::info!("pushed {rel_path} to {}", provider.name());
    Ok(revision)
}

/// Reads every markdown file in the workspace. Hidden entries are skipped.
pub fn load_all_articles(workspace: &Workspace) -> Result<Vec<Article>> {
    let mut articles = Vec::new();
    for file in collect_markdown_files(workspace, "")? {
        let content = fs::read_to_string(workspace.abs_path(&file.path)?)?;
        articles.push(Article {
            content,
            path: file.path,
        });
    }
    Ok(articles)
}

/// Lists every markdown file below `folder_path`.
///
/// A directory that cannot be read is logged and skipped.
pub fn collect_markdown_files(
    workspace: &Workspace,
    folder_path: &str,
) -> Result<Vec<MarkdownFile>> {
    let mut files = Vec::new();
    let mut pending = vec![folder_path.to_string()];

    while let Some(dir) = pending.pop() {
        let entries = match read_entries(&workspace.abs_path(&dir)?) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("skipping unreadable folder '{dir}': {e}");
                continue;
            }
        };
        for entry in entries {
            let rel = path::join(&dir, &entry.name);
            if entry.is_directory {
                pending.push(rel);
            } else if path::is_markdown(&entry.name) {
                files.push(MarkdownFile {
                    path: rel,
                    name: entry.name,
                });
            }
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn write_file(workspace: &Workspace, rel_path: &str, content: &str) -> Result<()> {
    let abs = workspace.abs_path(rel_path)?;
    if let Some(dir) = abs.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(abs, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::editor;
    use crate::core::loader::load_tree;
    use crate::core::reconcile::merge_listing;
    use crate::core::remote::mock::MockProvider;
    use crate::core::remote::{RemoteEntry, RemoteEntryKind};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Workspace) {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::custom(tmp.path().join("notes"));
        ws.ensure_root().unwrap();
        fs::create_dir_all(ws.abs_path("journal").unwrap()).unwrap();
        fs::write(ws.abs_path("journal/day.md").unwrap(), "# Day").unwrap();
        fs::write(ws.abs_path("a.md").unwrap(), "alpha").unwrap();
        fs::write(ws.abs_path(".hidden.md").unwrap(), "secret").unwrap();
        (tmp, ws)
    }

    #[tokio::test]
    async fn test_read_local_article() {
        let (_tmp, ws) = setup();
        let article = read_article(&ws, None, "a.md").await.unwrap();
        assert_eq!(article.content, "alpha");
        assert_eq!(article.path, "a.md");
    }

    #[tokio::test]
    async fn test_read_falls_back_to_remote() {
        let (_tmp, ws) = setup();
        let provider = MockProvider::new().with_file("remote.md", "from remote", "r1");
        let article = read_article(&ws, Some(&provider as &dyn RemoteProvider), "remote.md")
            .await
            .unwrap();
        assert_eq!(article.content, "from remote");
    }

    #[tokio::test]
    async fn test_read_missing_without_provider_fails() {
        let (_tmp, ws) = setup();
        assert!(read_article(&ws, None, "missing.md").await.is_err());
    }

    fn remote_archive(ws: &Workspace) -> TreeStore {
        let mut tree = load_tree(ws).unwrap();
        let listing = vec![RemoteEntry {
            name: "archive".to_string(),
            path: "archive".to_string(),
            kind: RemoteEntryKind::Dir,
            revision: "t1".to_string(),
        }];
        merge_listing(&mut tree, "", &listing).unwrap();
        let old = vec![RemoteEntry {
            name: "old.md".to_string(),
            path: "archive/old.md".to_string(),
            kind: RemoteEntryKind::File,
            revision: "r7".to_string(),
        }];
        merge_listing(&mut tree, "archive", &old).unwrap();
        TreeStore::new(tree)
    }

    #[tokio::test]
    async fn test_pull_writes_file_and_marks_node() {
        let (_tmp, ws) = setup();
        let provider = MockProvider::new().with_file("archive/old.md", "old notes", "r7");
        let store = remote_archive(&ws);

        let article = pull_article(&ws, &provider, &store, "archive/old.md").await.unwrap();
        assert_eq!(article.content, "old notes");
        assert_eq!(
            fs::read_to_string(ws.abs_path("archive/old.md").unwrap()).unwrap(),
            "old notes"
        );
        let tree = store.snapshot();
        let node = tree.get(tree.find("archive/old.md").unwrap()).unwrap();
        assert!(node.on_disk);
        assert_eq!(node.remote_revision.as_deref(), Some("r7"));
        let archive = tree.get(tree.find("archive").unwrap()).unwrap();
        assert!(archive.on_disk);
    }

    #[tokio::test]
    async fn test_pulled_folder_delete_removes_it_from_disk() {
        let (_tmp, ws) = setup();
        let provider = MockProvider::new().with_file("archive/old.md", "old notes", "r7");
        let store = remote_archive(&ws);
        pull_article(&ws, &provider, &store, "archive/old.md").await.unwrap();

        store.update(|t| editor::delete(&ws, t, "archive")).unwrap();
        assert!(!ws.abs_path("archive").unwrap().exists());
        assert!(load_tree(&ws).unwrap().find("archive/old.md").is_none());
    }

    #[tokio::test]
    async fn test_pulled_folder_rename_moves_it_on_disk() {
        let (_tmp, ws) = setup();
        let provider = MockProvider::new().with_file("archive/old.md", "old notes", "r7");
        let store = remote_archive(&ws);
        pull_article(&ws, &provider, &store, "archive/old.md").await.unwrap();

        let renamed = store
            .update(|t| editor::rename(&ws, t, "archive", "arch2"))
            .unwrap();
        assert_eq!(renamed, "arch2");
        assert!(store.snapshot().find("arch2/old.md").is_some());
        let article = read_article(&ws, None, "arch2/old.md").await.unwrap();
        assert_eq!(article.content, "old notes");
    }

    #[test]
    fn test_save_marks_synthetic_ancestors() {
        let (_tmp, ws) = setup();
        let store = remote_archive(&ws);
        save_article(&ws, &store, "archive/old.md", "local copy").unwrap();
        let tree = store.snapshot();
        assert!(tree.get(tree.find("archive").unwrap()).unwrap().on_disk);
    }

    #[test]
    fn test_save_creates_intermediate_folders() {
        let (_tmp, ws) = setup();
        let store = TreeStore::new(load_tree(&ws).unwrap());
        assert!(save_article(&ws, &store, "deep/er/note.md", "hello").unwrap());
        assert_eq!(
            fs::read_to_string(ws.abs_path("deep/er/note.md").unwrap()).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_save_ignores_empty_content() {
        let (_tmp, ws) = setup();
        let store = TreeStore::default();
        assert!(!save_article(&ws, &store, "a.md", "").unwrap());
        assert_eq!(fs::read_to_string(ws.abs_path("a.md").unwrap()).unwrap(), "alpha");
    }

    #[test]
    fn test_save_flips_on_disk() {
        let (_tmp, ws) = setup();
        let mut tree = load_tree(&ws).unwrap();
        let listing = vec![RemoteEntry {
            name: "new.md".to_string(),
            path: "new.md".to_string(),
            kind: RemoteEntryKind::File,
            revision: "r1".to_string(),
        }];
        merge_listing(&mut tree, "", &listing).unwrap();
        let store = TreeStore::new(tree);

        save_article(&ws, &store, "new.md", "text").unwrap();
        let tree = store.snapshot();
        assert!(tree.get(tree.find("new.md").unwrap()).unwrap().on_disk);
    }

    #[tokio::test]
    async fn test_push_sends_known_revision() {
        let (_tmp, ws) = setup();
        let mut tree = load_tree(&ws).unwrap();
        let listing = vec![RemoteEntry {
            name: "a.md".to_string(),
            path: "a.md".to_string(),
            kind: RemoteEntryKind::File,
            revision: "r1".to_string(),
        }];
        merge_listing(&mut tree, "", &listing).unwrap();
        let store = TreeStore::new(tree);
        let provider = MockProvider::new();

        let revision = push_article(&ws, &provider, &store, "a.md", "update a.md")
            .await
            .unwrap();
        assert_eq!(revision, "rev-1");

        let puts = provider.puts.lock().unwrap();
        assert_eq!(puts[0].0, "a.md");
        assert_eq!(puts[0].1, encode_content("alpha"));
        assert_eq!(puts[0].2.as_deref(), Some("r1"));
        drop(puts);

        let tree = store.snapshot();
        let node = tree.get(tree.find("a.md").unwrap()).unwrap();
        assert_eq!(node.remote_revision.as_deref(), Some("rev-1"));
        assert!(!node.is_local_only);
    }

    #[tokio::test]
    async fn test_push_new_file_has_no_previous_revision() {
        let (_tmp, ws) = setup();
        let store = TreeStore::new(load_tree(&ws).unwrap());
        let provider = MockProvider::new();
        push_article(&ws, &provider, &store, "journal/day.md", "add").await.unwrap();
        assert!(provider.puts.lock().unwrap()[0].2.is_none());
    }

    #[test]
    fn test_load_all_articles_skips_hidden() {
        let (_tmp, ws) = setup();
        let articles = load_all_articles(&ws).unwrap();
        let paths: Vec<&str> = articles.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, ["a.md", "journal/day.md"]);
        assert_eq!(articles[1].content, "# Day");
    }

    #[test]
    fn test_collect_markdown_files_in_folder() {
        let (_tmp, ws) = setup();
        fs::write(ws.abs_path("journal/photo.png").unwrap(), [0u8]).unwrap();
        let files = collect_markdown_files(&ws, "journal").unwrap();
        assert_eq!(
            files,
            vec![MarkdownFile {
                path: "journal/day.md".to_string(),
                name: "day.md".to_string(),
            }]
        );
    }
}
