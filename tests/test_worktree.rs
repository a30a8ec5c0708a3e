//! Worktree creation with submodules sourced from the main worktree

mod common;

use common::git;
use grove::worktree::{add_worktree, remove_worktree, AddOptions};

#[tokio::test]
async fn test_add_initializes_nested_submodules() {
    let Some(project) = common::project() else { return };
    let ws = project.workspace();
    let wt = project.temp_dir.path().canonicalize().unwrap().join("wt");

    let code = add_worktree(&ws, "feature", &wt, AddOptions::default()).await.unwrap();

    assert_eq!(code, 0);
    assert!(wt.join("common/theme.txt").is_file());
    assert!(wt.join("technical-docs/index.rst").is_file());
    assert!(wt.join("technical-docs/common/theme.txt").is_file());
    assert_eq!(git(&wt, &["branch", "--show-current"]).unwrap(), "feature");
}

#[tokio::test]
async fn test_add_restores_original_urls() {
    let Some(project) = common::project() else { return };
    let ws = project.workspace();
    let wt = project.temp_dir.path().canonicalize().unwrap().join("wt");

    add_worktree(&ws, "feature", &wt, AddOptions::default()).await.unwrap();

    let url = git(&wt, &["config", "submodule.technical-docs.url"]).unwrap();
    assert_eq!(url, project.child_origin.display().to_string());
    let nested = git(&wt.join("technical-docs"), &["config", "submodule.common.url"]).unwrap();
    assert_eq!(nested, project.grandchild_origin.display().to_string());
}

#[tokio::test]
async fn test_add_copies_identity_config() {
    let Some(project) = common::project() else { return };
    let ws = project.workspace();
    let wt = project.temp_dir.path().canonicalize().unwrap().join("wt");

    add_worktree(&ws, "feature", &wt, AddOptions::default()).await.unwrap();

    let email = git(&wt.join("technical-docs/common"), &["config", "--local", "--get", "user.email"]).unwrap();
    assert_eq!(email, "test@example.com");
}

#[tokio::test]
async fn test_add_refuses_existing_path() {
    let Some(project) = common::project() else { return };
    let ws = project.workspace();

    let err = add_worktree(&ws, "feature", &project.root, AddOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Path already exists"));
}

#[tokio::test]
async fn test_checkout_of_missing_branch_fails() {
    let Some(project) = common::project() else { return };
    let ws = project.workspace();
    let wt = project.temp_dir.path().canonicalize().unwrap().join("wt");
    let options = AddOptions { checkout_existing: true, ..AddOptions::default() };

    let code = add_worktree(&ws, "no-such-branch", &wt, options).await.unwrap();
    assert_eq!(code, 1);
}

#[tokio::test]
async fn test_forced_remove() {
    let Some(project) = common::project() else { return };
    let ws = project.workspace();
    let wt = project.temp_dir.path().canonicalize().unwrap().join("wt");
    add_worktree(&ws, "feature", &wt, AddOptions::default()).await.unwrap();

    let code = remove_worktree(&ws, &wt, true).await.unwrap();

    assert_eq!(code, 0);
    assert!(!wt.exists());
    let listed = git(&project.root, &["worktree", "list"]).unwrap();
    assert!(!listed.contains(&wt.display().to_string()));
}
