use anyhow::Result;
use git2::{Commit, Oid, Repository, Signature};
use restack_core::{ActionKind, ActionState, CommitStore, RebaseSession, RestackError};
use tempfile::TempDir;

fn create_test_repo() -> Result<(TempDir, Repository)> {
    let dir = TempDir::new()?;
    let repo = Repository::init(dir.path())?;

    let mut config = repo.config()?;
    config.set_str("user.name", "Test User")?;
    config.set_str("user.email", "test@example.com")?;

    Ok((dir, repo))
}

fn commit_files(repo: &Repository, message: &str, files: &[(&str, &str)]) -> Result<Oid> {
    let sig = Signature::now("Test User", "test@example.com")?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    let base_tree = match &parent {
        Some(commit) => Some(commit.tree()?),
        None => None,
    };

    let mut builder = repo.treebuilder(base_tree.as_ref())?;
    for (name, content) in files {
        builder.insert(name, repo.blob(content.as_bytes())?, 0o100644)?;
    }
    let tree = repo.find_tree(builder.write()?)?;
    let parents: Vec<&Commit> = parent.iter().collect();

    Ok(repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?)
}

fn file_at(store: &CommitStore, commit: Oid, name: &str) -> Result<Option<String>> {
    let tree = store.find_commit(commit)?.tree()?;
    let result = match tree.get_name(name) {
        Some(entry) => {
            let blob = store.repository().find_blob(entry.id())?;
            Ok(Some(String::from_utf8(blob.content().to_vec())?))
        }
        None => Ok(None),
    };
    result
}

struct Stack {
    dir: TempDir,
    base: Oid,
    ids: Vec<Oid>,
}

/// base, then: add a, extend a, add c, touch readme
fn build_stack() -> Result<Stack> {
    let (dir, repo) = create_test_repo()?;
    let base = commit_files(&repo, "base\n", &[("readme", "hello\n")])?;
    let ids = vec![
        commit_files(&repo, "add a\n", &[("a.txt", "one\n")])?,
        commit_files(&repo, "extend a\n", &[("a.txt", "one\ntwo\n")])?,
        commit_files(&repo, "add c\n", &[("c.txt", "c\n")])?,
        commit_files(&repo, "touch readme\n", &[("readme", "hello again\n")])?,
    ];
    Ok(Stack { dir, base, ids })
}

#[test]
fn test_plan_edit_save_resume_and_apply() -> Result<()> {
    let stack = build_stack()?;
    let store = CommitStore::open(stack.dir.path())?;

    let mut session = RebaseSession::open(store, "HEAD", Some(&stack.base.to_string()))?;
    assert_eq!(session.sequence().len(), 4);
    assert_eq!(session.graph().len(), 5);

    session.set_kind(1, ActionKind::Fixup)?;
    session.set_kind(2, ActionKind::Reword)?;
    session.set_message(2, "add the c file\n")?;
    session.set_kind(3, ActionKind::Drop)?;

    let plan = stack.dir.path().join("plan.json");
    session.save(&plan)?;
    let resumed = RebaseSession::load(CommitStore::open(stack.dir.path())?, &plan)?;
    assert_eq!(resumed.sequence().actions(), session.sequence().actions());
    assert_eq!(resumed.sequence().message_text(2), Some("add the c file\n"));

    let history = resumed.derive()?;
    assert_eq!(history.len(), 2);
    assert!(!history.has_conflicts());
    assert_eq!(
        history.states[3],
        ActionState::Skipped { original: resumed.graph().index_of(&stack.ids[3]) }
    );

    let script = resumed.script()?;
    let verbs: Vec<&str> = script.lines().map(|l| l.split(' ').next().unwrap_or("")).collect();
    assert_eq!(verbs, vec!["pick", "fixup", "pick", "exec", "drop"]);

    let tip = resumed.apply(Some("rewritten"))?;
    let store = resumed.store();
    assert_eq!(store.resolve("rewritten")?, tip);
    assert_eq!(store.full_message(tip)?, "add the c file\n");
    assert_eq!(file_at(store, tip, "a.txt")?.as_deref(), Some("one\ntwo\n"));
    assert_eq!(file_at(store, tip, "c.txt")?.as_deref(), Some("c\n"));
    assert_eq!(file_at(store, tip, "readme")?.as_deref(), Some("hello\n"));
    assert_eq!(store.parents_of(store.parents_of(tip)?[0])?, vec![stack.base]);

    Ok(())
}

#[test]
fn test_conflicting_reorder_blocks_apply_until_undone() -> Result<()> {
    let stack = build_stack()?;
    let store = CommitStore::open(stack.dir.path())?;
    let mut session = RebaseSession::open(store, "HEAD", Some(&stack.base.to_string()))?;

    session.move_action(1, 0)?;
    let history = session.derive()?;
    assert!(history.has_conflicts());
    assert_eq!(history.states[0], ActionState::AppliedWithConflict { node: 0 });
    assert!(matches!(session.apply(None), Err(RestackError::Conflict { count: 1 })));

    assert!(session.undo()?);
    assert!(!session.derive()?.has_conflicts());
    session.apply(None)?;

    Ok(())
}

#[test]
fn test_import_script() -> Result<()> {
    let stack = build_stack()?;
    let store = CommitStore::open(stack.dir.path())?;
    let mut session = RebaseSession::open(store, "HEAD", Some(&stack.base.to_string()))?;
    let hash = |i: usize| stack.ids[i].to_string()[..8].to_string();

    let script = format!(
        "# reordered by hand\npick {} add a\nsquash {} extend a\n\npick {} touch readme\nf -C {} add c\n",
        hash(0),
        hash(1),
        hash(3),
        hash(2)
    );
    session.import_script(&script)?;

    let kinds: Vec<ActionKind> = session.sequence().iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![ActionKind::Pick, ActionKind::Squash, ActionKind::Pick, ActionKind::Fixup]
    );
    let history = session.derive()?;
    assert_eq!(history.len(), 2);
    assert_eq!(history.warnings.len(), 1);
    assert_eq!(history.nodes[0].message, "add a\n\nextend a\n");

    let err = session
        .import_script(&format!("pick {} add a\nbreak\n", hash(0)))
        .unwrap_err();
    assert!(matches!(err, RestackError::UnsupportedAction { line: 2, .. }));
    // A failed import leaves the plan alone
    assert_eq!(session.sequence().len(), 4);

    let err = session
        .import_script(&format!("pick {} base\n", stack.base))
        .unwrap_err();
    assert!(matches!(err, RestackError::NotInGraph(_)));

    Ok(())
}

#[test]
fn test_resume_opens_the_recorded_repository() -> Result<()> {
    let stack = build_stack()?;
    let (_other_dir, other) = create_test_repo()?;
    commit_files(&other, "unrelated\n", &[("x.txt", "x\n")])?;
    let plans = TempDir::new()?;
    let plan = plans.path().join("plan.json");

    let mut session = RebaseSession::open(
        CommitStore::open(stack.dir.path())?,
        "HEAD",
        Some(&stack.base.to_string()),
    )?;
    session.set_kind(3, ActionKind::Drop)?;
    session.save(&plan)?;

    let resumed = RebaseSession::resume(&plan)?;
    assert_eq!(resumed.head(), stack.ids[3]);
    assert_eq!(resumed.onto(), stack.base);
    assert_eq!(resumed.sequence().get(3).map(|a| a.kind), Some(ActionKind::Drop));
    assert_eq!(resumed.derive()?.len(), 3);

    // Forcing another repository only works when it has the commits
    let forced = RebaseSession::load(CommitStore::open(other.workdir().unwrap())?, &plan);
    assert!(matches!(forced, Err(RestackError::NotFound(_))));

    Ok(())
}
