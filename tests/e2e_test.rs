#![allow(clippy::unwrap_used, clippy::expect_used)]

use git_chunks::{
    ApplyOptions, ChunkAction, DiffDocument, DiffKind, GitChunks, GitChunksError, GitCli,
    LineKind, Outcome, RowSpec, Side,
};
use git2::{Repository, Signature};
use similar_asserts::assert_eq;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Throwaway repository that git-chunks runs against with the real `git`
struct Fixture {
    dir: TempDir,
    repo: Repository,
}

impl Fixture {
    /// Empty repository with a fixed author, so commits need no global config
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repo");

        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn chunks(&self) -> GitChunks {
        GitChunks::new(GitCli::new(self.path()), ApplyOptions::default(), 3)
    }

    /// Overwrite a working tree file, creating parent directories
    fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read_file(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).unwrap()
    }

    /// Put the working tree content of `name` into the index
    fn stage_file(&self, name: &str) {
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    /// Commit the index on top of HEAD, or as the root commit
    fn commit(&self, message: &str) {
        let sig = Signature::new(
            "Test User",
            "test@example.com",
            &git2::Time::new(1234567890, 0),
        )
        .unwrap();
        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        if self.repo.head().is_ok() {
            let parent = self.repo.head().unwrap().peel_to_commit().unwrap();
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .unwrap();
        } else {
            self.repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
                .unwrap();
        }
    }

    /// Commit `content` as `name`
    fn committed(name: &str, content: &str) -> Self {
        let fixture = Fixture::new();
        fixture.write_file(name, content);
        fixture.stage_file(name);
        fixture.commit("initial");
        fixture
    }

    fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .output()
            .expect("Failed to run git");
        String::from_utf8(output.stdout).unwrap()
    }

    /// Hunk headers and bodies of the unstaged diff, without file headers
    fn unstaged_body(&self, file: &str) -> String {
        body(&self.git(&["diff", "--no-ext-diff", "--no-color", "-U0", "--", file]))
    }

    /// Hunk headers and bodies of the staged diff, without file headers
    fn staged_body(&self, file: &str) -> String {
        body(&self.git(&[
            "diff",
            "--cached",
            "--no-ext-diff",
            "--no-color",
            "-U0",
            "--",
            file,
        ]))
    }
}

fn body(diff: &str) -> String {
    diff.lines()
        .skip_while(|line| !line.starts_with("@@"))
        .map(|line| format!("{line}\n"))
        .collect()
}

fn numbered(range: std::ops::RangeInclusive<u32>) -> String {
    range.map(|i| format!("line {i}\n")).collect()
}

/// Row of the first line of `kind` showing `content`
fn row_of(doc: &DiffDocument, kind: LineKind, content: &str) -> usize {
    doc.lines
        .iter()
        .position(|line| line.kind == kind && line.content == content)
        .unwrap()
}

/// Twenty committed lines with lines 3 and 15 rewritten in the working tree
fn two_hunks() -> Fixture {
    let fixture = Fixture::committed("file.txt", &numbered(1..=20));
    let modified = numbered(1..=20)
        .replace("line 3\n", "LINE 3\n")
        .replace("line 15\n", "LINE 15\n");
    fixture.write_file("file.txt", &modified);
    fixture
}

#[tokio::test]
async fn stage_one_of_two_chunks() {
    let fixture = two_hunks();
    let mut chunks = fixture.chunks();

    let doc = chunks.open("file.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "LINE 3");
    let outcome = chunks
        .perform(ChunkAction::Stage, RowSpec::Row(row), None)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    assert_eq!(
        fixture.staged_body("file.txt"),
        "@@ -3 +3 @@\n-line 3\n+LINE 3\n"
    );
    assert_eq!(
        fixture.unstaged_body("file.txt"),
        "@@ -15 +15 @@\n-line 15\n+LINE 15\n"
    );
}

#[tokio::test]
async fn stage_then_unstage_restores_index() {
    let fixture = two_hunks();
    let mut chunks = fixture.chunks();

    let doc = chunks.open("file.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Deleted, "line 15");
    chunks
        .perform(ChunkAction::Stage, RowSpec::Row(row), None)
        .await
        .unwrap();
    assert_eq!(
        fixture.staged_body("file.txt"),
        "@@ -15 +15 @@\n-line 15\n+LINE 15\n"
    );

    let doc = chunks.open("file.txt", DiffKind::Staged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "LINE 15");
    let outcome = chunks
        .perform(ChunkAction::Unstage, RowSpec::Row(row), None)
        .await
        .unwrap();

    // The staged diff held nothing else, so the whole file is reset
    assert_eq!(outcome, Outcome::WholeFile);
    assert_eq!(fixture.staged_body("file.txt"), "");
    assert_eq!(
        fixture.unstaged_body("file.txt"),
        "@@ -3 +3 @@\n-line 3\n+LINE 3\n@@ -15 +15 @@\n-line 15\n+LINE 15\n"
    );
}

#[tokio::test]
async fn stage_single_line_of_a_block() {
    let fixture = Fixture::committed("list.txt", &numbered(1..=5));
    fixture.write_file("list.txt", &(numbered(1..=5) + "six\nseven\neight\n"));
    let mut chunks = fixture.chunks();

    let doc = chunks.open("list.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "seven");
    let outcome = chunks
        .perform(
            ChunkAction::Stage,
            RowSpec::Range {
                start: row,
                end: row,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    assert_eq!(fixture.staged_body("list.txt"), "@@ -5,0 +6 @@\n+seven\n");
    assert_eq!(
        fixture.unstaged_body("list.txt"),
        "@@ -5,0 +6 @@\n+six\n@@ -6,0 +8 @@\n+eight\n"
    );
}

#[tokio::test]
async fn stage_from_new_column() {
    let fixture = two_hunks();
    let mut chunks = fixture.chunks().with_side_by_side(true);
    chunks.open("file.txt", DiffKind::Unstaged).await.unwrap();

    let view = chunks.render().unwrap();
    let row = view
        .lines()
        .position(|line| line.ends_with("+LINE 15"))
        .unwrap();
    chunks
        .perform(
            ChunkAction::Stage,
            RowSpec::Range {
                start: row,
                end: row,
            },
            Some(Side::New),
        )
        .await
        .unwrap();

    // Only the added line was selected; the deletion stays as context
    assert_eq!(fixture.staged_body("file.txt"), "@@ -15,0 +16 @@\n+LINE 15\n");
}

#[tokio::test]
async fn whole_file_when_everything_is_selected() {
    let fixture = Fixture::committed("one.txt", &numbered(1..=4));
    fixture.write_file("one.txt", &numbered(1..=4).replace("line 2\n", "two\n"));
    let mut chunks = fixture.chunks();

    let doc = chunks.open("one.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "two");
    let outcome = chunks
        .perform(ChunkAction::Stage, RowSpec::Row(row), None)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::WholeFile);
    assert_eq!(fixture.staged_body("one.txt"), "@@ -2 +2 @@\n-line 2\n+two\n");
    assert_eq!(fixture.unstaged_body("one.txt"), "");
}

#[tokio::test]
async fn stage_part_of_untracked_file() {
    let fixture = Fixture::committed("keep.txt", "keep\n");
    fixture.write_file("new.txt", "a\nb\nc\n");
    let mut chunks = fixture.chunks();

    let doc = chunks.open("new.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "a");
    let outcome = chunks
        .perform(
            ChunkAction::Stage,
            RowSpec::Range {
                start: row,
                end: row,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    assert_eq!(fixture.staged_body("new.txt"), "@@ -0,0 +1 @@\n+a\n");
    assert_eq!(
        fixture.unstaged_body("new.txt"),
        "@@ -1,0 +2,2 @@\n+b\n+c\n"
    );
}

#[tokio::test]
async fn discard_one_chunk() {
    let fixture = two_hunks();
    let mut chunks = fixture.chunks();

    let doc = chunks.open("file.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "LINE 3");
    chunks
        .perform(ChunkAction::Discard, RowSpec::Row(row), None)
        .await
        .unwrap();

    assert_eq!(
        fixture.read_file("file.txt"),
        numbered(1..=20).replace("line 15\n", "LINE 15\n")
    );
    assert_eq!(fixture.staged_body("file.txt"), "");
}

#[tokio::test]
async fn discard_whole_untracked_file() {
    let fixture = Fixture::committed("keep.txt", "keep\n");
    fixture.write_file("scratch.txt", "scratch\n");
    let mut chunks = fixture.chunks();

    let doc = chunks.open("scratch.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "scratch");
    let outcome = chunks
        .perform(ChunkAction::Discard, RowSpec::Row(row), None)
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::WholeFile);
    assert!(!fixture.path().join("scratch.txt").exists());
}

#[tokio::test]
async fn context_rows_select_nothing() {
    let fixture = two_hunks();
    let mut chunks = fixture.chunks();

    let doc = chunks.open("file.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Normal, "line 1");
    let result = chunks
        .perform(
            ChunkAction::Stage,
            RowSpec::Range {
                start: row,
                end: row,
            },
            None,
        )
        .await;

    assert!(matches!(result, Err(GitChunksError::EmptySelection { .. })));
    assert_eq!(fixture.staged_body("file.txt"), "");
}

#[tokio::test]
async fn clean_file_has_no_changes() {
    let fixture = Fixture::committed("clean.txt", "same\n");
    let mut chunks = fixture.chunks();

    let result = chunks.open("clean.txt", DiffKind::Unstaged).await;
    assert!(matches!(
        result,
        Err(GitChunksError::NoChanges { file }) if file == "clean.txt"
    ));
}

#[tokio::test]
async fn stage_line_after_missing_newline() {
    let fixture = Fixture::committed("f.txt", "x\na");
    fixture.write_file("f.txt", "x\na\nb\n");
    let mut chunks = fixture.chunks();

    let doc = chunks.open("f.txt", DiffKind::Unstaged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "b");
    let outcome = chunks
        .perform(
            ChunkAction::Stage,
            RowSpec::Range {
                start: row,
                end: row,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    // The newline added to "a" comes along, or "b" would be glued to it
    assert_eq!(fixture.git(&["show", ":f.txt"]), "x\na\nb\n");
    assert_eq!(fixture.unstaged_body("f.txt"), "");
}

#[tokio::test]
async fn unstage_one_of_two_chunks() {
    let fixture = two_hunks();
    fixture.stage_file("file.txt");
    let mut chunks = fixture.chunks();

    let doc = chunks.open("file.txt", DiffKind::Staged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "LINE 3");
    let outcome = chunks
        .perform(ChunkAction::Unstage, RowSpec::Row(row), None)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    assert_eq!(
        fixture.staged_body("file.txt"),
        "@@ -15 +15 @@\n-line 15\n+LINE 15\n"
    );
    assert_eq!(
        fixture.unstaged_body("file.txt"),
        "@@ -3 +3 @@\n-line 3\n+LINE 3\n"
    );
}

#[tokio::test]
async fn discard_staged_chunk_from_index_and_worktree() {
    let fixture = two_hunks();
    fixture.stage_file("file.txt");
    let mut chunks = fixture.chunks();

    let doc = chunks.open("file.txt", DiffKind::Staged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "LINE 15");
    let outcome = chunks
        .perform(ChunkAction::Discard, RowSpec::Row(row), None)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    assert_eq!(
        fixture.staged_body("file.txt"),
        "@@ -3 +3 @@\n-line 3\n+LINE 3\n"
    );
    assert_eq!(fixture.unstaged_body("file.txt"), "");
    assert_eq!(
        fixture.read_file("file.txt"),
        numbered(1..=20).replace("line 3\n", "LINE 3\n")
    );
}

#[tokio::test]
async fn unstage_part_of_newly_added_file() {
    let fixture = Fixture::committed("keep.txt", "keep\n");
    fixture.write_file("new.txt", "a\nb\nc\n");
    fixture.stage_file("new.txt");
    let mut chunks = fixture.chunks();

    let doc = chunks.open("new.txt", DiffKind::Staged).await.unwrap();
    let row = row_of(&doc, LineKind::Added, "b");
    let outcome = chunks
        .perform(
            ChunkAction::Unstage,
            RowSpec::Range {
                start: row,
                end: row,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Patched { hunks: 1 });

    assert_eq!(fixture.git(&["show", ":new.txt"]), "a\nc\n");
    assert_eq!(fixture.read_file("new.txt"), "a\nb\nc\n");
    assert_eq!(fixture.unstaged_body("new.txt"), "@@ -1,0 +2 @@\n+b\n");
}
