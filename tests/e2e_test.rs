use diff_hunks::{DiffDocument, Direction};
use git2::{Repository, Signature};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Test fixture for a git repository
struct Fixture {
    dir: TempDir,
    repo: Repository,
}

impl Fixture {
    /// Create a new empty repo with deterministic config
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(dir.path()).expect("Failed to init repo");

        // Deterministic config
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        Self { dir, repo }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file to the repo
    fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Stage a file
    fn stage_file(&self, name: &str) {
        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    /// Create a commit
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

    /// Get git diff output (unstaged changes)
    fn git_diff(&self, files: &[&str]) -> String {
        let mut args = vec![
            "-C",
            self.path().to_str().unwrap(),
            "diff",
            "--no-ext-diff", // Force standard diff, ignore external tools
            "--no-color",
        ];
        args.extend(files);

        let output = Command::new("git")
            .args(&args)
            .output()
            .expect("Failed to run git diff");
        String::from_utf8(output.stdout).unwrap()
    }

    /// Get git diff --cached output (staged changes)
    fn git_diff_cached(&self, files: &[&str]) -> String {
        let mut args = vec![
            "-C",
            self.path().to_str().unwrap(),
            "diff",
            "--cached",
            "--no-ext-diff",
            "--no-color",
        ];
        args.extend(files);

        let output = Command::new("git")
            .args(&args)
            .output()
            .expect("Failed to run git diff --cached");
        String::from_utf8(output.stdout).unwrap()
    }

    /// Apply a patch produced by the engine to the index
    fn apply_cached(&self, patch: &str) {
        use std::io::Write;

        let mut child = Command::new("git")
            .args([
                "-C",
                self.path().to_str().unwrap(),
                "apply",
                "--cached",
                "--unidiff-zero",
                "-",
            ])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .expect("Failed to spawn git apply");

        child
            .stdin
            .take()
            .unwrap()
            .write_all(patch.as_bytes())
            .unwrap();

        let output = child.wait_with_output().unwrap();
        assert!(
            output.status.success(),
            "git apply failed: {}\npatch was:\n{}",
            String::from_utf8_lossy(&output.stderr),
            patch
        );
    }
}

fn numbered_lines(count: usize) -> String {
    (1..=count).map(|i| format!("line {i}\n")).collect()
}

// =============================================================================
// Staging a whole hunk
// =============================================================================

#[test]
fn stage_whole_hunk() {
    let fixture = Fixture::new();
    fixture.write_file("notes.txt", &numbered_lines(10));
    fixture.stage_file("notes.txt");
    fixture.commit("initial");

    let modified = numbered_lines(10).replace("line 5\n", "line five\n");
    fixture.write_file("notes.txt", &modified);

    let doc = DiffDocument::from_text(fixture.git_diff(&["notes.txt"]));
    assert_eq!(doc.hunks().len(), 1);

    let patch = doc.sub_diff_hunk(doc.hunks()[0].heading_line_index, Direction::Forward);
    fixture.apply_cached(patch.text());

    let staged = fixture.git_diff_cached(&["notes.txt"]);
    assert!(staged.contains("-line 5\n"), "staged diff:\n{staged}");
    assert!(staged.contains("+line five\n"), "staged diff:\n{staged}");

    // Everything in the file's only hunk is staged; nothing is left over.
    assert!(fixture.git_diff(&["notes.txt"]).trim().is_empty());
}

// =============================================================================
// Staging one hunk out of several
// =============================================================================

fn two_change_content() -> String {
    numbered_lines(20)
        .replace("line 3\n", "line 3 changed\n")
        .replace("line 15\n", "line 15\ninserted line\n")
}

#[test]
fn stage_second_hunk_only() {
    let fixture = Fixture::new();
    fixture.write_file("notes.txt", &numbered_lines(20));
    fixture.stage_file("notes.txt");
    fixture.commit("initial");

    fixture.write_file("notes.txt", &two_change_content());

    let doc = DiffDocument::from_text(fixture.git_diff(&["notes.txt"]));
    assert_eq!(doc.hunks().len(), 2);

    let patch = doc.sub_diff_hunk(doc.hunks()[1].heading_line_index, Direction::Forward);
    fixture.apply_cached(patch.text());

    let staged = fixture.git_diff_cached(&["notes.txt"]);
    assert!(staged.contains("+inserted line\n"), "staged diff:\n{staged}");
    assert!(!staged.contains("line 3 changed"), "staged diff:\n{staged}");

    // The first change is still unstaged.
    let unstaged = fixture.git_diff(&["notes.txt"]);
    assert!(unstaged.contains("+line 3 changed\n"));
    assert!(!unstaged.contains("inserted line"));
}

// =============================================================================
// Staging a single selected line out of a replacement hunk
// =============================================================================

#[test]
fn stage_selected_line_only() {
    let fixture = Fixture::new();
    fixture.write_file("notes.txt", &numbered_lines(10));
    fixture.stage_file("notes.txt");
    fixture.commit("initial");

    let modified = numbered_lines(10).replace("line 5\n", "line 5 changed\n");
    fixture.write_file("notes.txt", &modified);

    let doc = DiffDocument::from_text(fixture.git_diff(&["notes.txt"]));
    assert_eq!(doc.hunks().len(), 1);

    // The diff-text line of the addition inside the hunk body.
    let hunk = &doc.hunks()[0];
    let add_pos = hunk
        .lines
        .iter()
        .position(|l| l.starts_with('+'))
        .expect("no addition in hunk");
    let add_line = hunk.heading_line_index + 1 + add_pos;

    let patch = doc.sub_diff(add_line, add_line, Direction::Forward);
    fixture.apply_cached(patch.text());

    // Only the insertion is staged; the deletion stayed behind as context.
    let staged = fixture.git_diff_cached(&["notes.txt"]);
    assert!(staged.contains("+line 5 changed\n"), "staged diff:\n{staged}");
    assert!(!staged.contains("-line 5\n"), "staged diff:\n{staged}");
}

// =============================================================================
// Unstaging a hunk with a reverse sub-diff
// =============================================================================

#[test]
fn unstage_hunk_with_reverse_patch() {
    let fixture = Fixture::new();
    fixture.write_file("notes.txt", &numbered_lines(20));
    fixture.stage_file("notes.txt");
    fixture.commit("initial");

    fixture.write_file("notes.txt", &two_change_content());
    fixture.stage_file("notes.txt");

    let doc = DiffDocument::from_text(fixture.git_diff_cached(&["notes.txt"]));
    assert_eq!(doc.hunks().len(), 2);

    // The reverse sub-diff is a forward-appliable patch that undoes the
    // second hunk in the index.
    let patch = doc.sub_diff_hunk(doc.hunks()[1].heading_line_index, Direction::Reverse);
    fixture.apply_cached(patch.text());

    let staged = fixture.git_diff_cached(&["notes.txt"]);
    assert!(staged.contains("+line 3 changed\n"), "staged diff:\n{staged}");
    assert!(!staged.contains("inserted line"), "staged diff:\n{staged}");

    // The undone change is back in the unstaged set.
    let unstaged = fixture.git_diff(&["notes.txt"]);
    assert!(unstaged.contains("+inserted line\n"));
}

// =============================================================================
// File pair enumeration over real multi-file output
// =============================================================================

#[test]
fn file_pairs_from_multi_file_diff() {
    let fixture = Fixture::new();
    fixture.write_file("alpha.txt", &numbered_lines(5));
    fixture.write_file("beta.txt", &numbered_lines(5));
    fixture.stage_file("alpha.txt");
    fixture.stage_file("beta.txt");
    fixture.commit("initial");

    fixture.write_file("alpha.txt", &numbered_lines(5).replace("line 2\n", "line two\n"));
    fixture.write_file("beta.txt", &numbered_lines(5).replace("line 4\n", "line four\n"));

    let doc = DiffDocument::from_text(fixture.git_diff(&[]));
    let pairs = doc.file_pairs();
    let names: Vec<&str> = pairs.iter().map(|p| p.target_file.as_str()).collect();
    assert_eq!(names, vec!["alpha.txt", "beta.txt"]);
}
