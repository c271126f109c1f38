use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use git2::Oid;
use restack_core::{ActionKind, ActionState, CommitStore, RebaseSession, RestackConfig, SaveDocument};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "restack")]
#[command(about = "Plan and check interactive rebases without touching the working tree", long_about = None)]
struct Cli {
    /// Path to the repository; plans default to the repository they were made in
    #[arg(short = 'C', long, global = true)]
    repo: Option<PathBuf>,
    /// Config file to use instead of <git-dir>/restack.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the commits between head and onto, grouped by depth
    Graph {
        /// Newest commit of the range
        #[arg(default_value = "HEAD")]
        head: String,
        /// Commit to rebase onto (root of history when omitted)
        onto: Option<String>,
    },
    /// Start a plan with one pick per commit
    Plan {
        head: String,
        onto: Option<String>,
        /// Where to write the plan (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the history a plan would produce, with conflicts and warnings
    Preview {
        plan: PathBuf,
    },
    /// Print the todo script for a plan
    Script {
        plan: PathBuf,
    },
    /// Change the action type of one step
    SetKind {
        plan: PathBuf,
        index: usize,
        kind: ActionKind,
    },
    /// Move one step to another position
    Move {
        plan: PathBuf,
        from: usize,
        to: usize,
    },
    /// Give a step a new commit message
    Reword {
        plan: PathBuf,
        index: usize,
        message: String,
    },
    /// Turn a todo script into a plan
    Import {
        head: String,
        onto: Option<String>,
        /// Todo script to read
        #[arg(short, long)]
        script: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a plan's script into the todo file git hands to its sequence editor
    SequenceEditor {
        #[arg(long, env = "RESTACK_PLAN")]
        plan: PathBuf,
        /// Todo file passed by git
        todo: PathBuf,
    },
    /// Write the planned commits and optionally move a branch to them
    Apply {
        plan: PathBuf,
        #[arg(short, long)]
        branch: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let repo = cli.repo.as_deref();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Graph { head, onto } => {
            let session = RebaseSession::open(working_store(repo, config)?, &head, onto.as_deref())?;
            print_graph(&session)?;
        }
        Commands::Plan { head, onto, output } => {
            let session = RebaseSession::open(working_store(repo, config)?, &head, onto.as_deref())?;
            match output {
                Some(path) => {
                    session.save(&path)?;
                    println!("Planned {} commits in {}", session.sequence().len(), path.display());
                }
                None => println!("{}", session.document().to_json()?),
            }
        }
        Commands::Preview { plan } => {
            let session = load_plan(repo, config, &plan)?;
            print_preview(&session)?;
        }
        Commands::Script { plan } => {
            let session = load_plan(repo, config, &plan)?;
            print!("{}", session.script()?);
        }
        Commands::SetKind { plan, index, kind } => {
            let mut session = load_plan(repo, config, &plan)?;
            session.set_kind(index, kind)?;
            session.save(&plan)?;
            println!("Step {} is now {}", index, kind);
        }
        Commands::Move { plan, from, to } => {
            let mut session = load_plan(repo, config, &plan)?;
            session.move_action(from, to)?;
            session.save(&plan)?;
            println!("Moved step {} to {}", from, to);
        }
        Commands::Reword { plan, index, message } => {
            let mut session = load_plan(repo, config, &plan)?;
            if session.sequence().get(index).map(|a| a.kind) == Some(ActionKind::Pick) {
                session.set_kind(index, ActionKind::Reword)?;
            }
            session.set_message(index, message)?;
            session.save(&plan)?;
            println!("Step {} reworded", index);
        }
        Commands::Import { head, onto, script, output } => {
            let text = fs::read_to_string(&script)
                .with_context(|| format!("Failed to read {}", script.display()))?;
            let mut session = RebaseSession::open(working_store(repo, config)?, &head, onto.as_deref())?;
            session.import_script(&text)?;
            session.save(&output)?;
            println!("Imported {} steps into {}", session.sequence().len(), output.display());
        }
        Commands::SequenceEditor { plan, todo } => {
            let session = load_plan(repo, config, &plan)?;
            let script = session.script()?;
            fs::write(&todo, script).with_context(|| format!("Failed to write {}", todo.display()))?;
        }
        Commands::Apply { plan, branch } => {
            let session = load_plan(repo, config, &plan)?;
            let tip = session.apply(branch.as_deref())?;
            match branch {
                Some(branch) => println!("{} now points at {}", branch, session.store().short_hash(tip)),
                None => println!("New tip: {}", tip),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(repo: &Path, config: Option<&Path>) -> Result<CommitStore> {
    let store = CommitStore::open(repo)
        .with_context(|| format!("Failed to open repository at {}", repo.display()))?;
    match config {
        Some(path) => Ok(store.with_config(RestackConfig::load(path)?)),
        None => Ok(store),
    }
}

fn working_store(repo: Option<&Path>, config: Option<&Path>) -> Result<CommitStore> {
    open_store(repo.unwrap_or(Path::new(".")), config)
}

/// Open a saved plan in the repository it records, unless `-C` overrides it
fn load_plan(repo: Option<&Path>, config: Option<&Path>, plan: &Path) -> Result<RebaseSession> {
    let document = SaveDocument::load(plan)
        .with_context(|| format!("Failed to read plan {}", plan.display()))?;
    let recorded = PathBuf::from(&document.repo);
    let store = open_store(repo.unwrap_or(recorded.as_path()), config)?;
    Ok(RebaseSession::from_document(store, &document)?)
}

fn describe(store: &CommitStore, id: Oid) -> Result<String> {
    if id.is_zero() {
        return Ok("(root)".to_string());
    }
    Ok(format!("{} {}", store.short_hash(id), store.summary(id)?))
}

fn print_graph(session: &RebaseSession) -> Result<()> {
    let graph = session.graph();
    let store = session.store();

    println!(
        "{} commits, depth {}, widest level {}",
        graph.len(),
        graph.max_depth(),
        graph.max_width()
    );
    for (depth, nodes) in graph.iter_depths() {
        for (i, node) in nodes.iter().enumerate() {
            let label = if i == 0 { format!("{:>4}", depth) } else { "    ".to_string() };
            println!("{}  {}", label, describe(store, node.id)?);
        }
    }
    Ok(())
}

fn print_preview(session: &RebaseSession) -> Result<()> {
    let store = session.store();
    let history = session.derive()?;

    println!("Onto {}", describe(store, history.onto)?);
    for (index, action) in session.sequence().iter().enumerate() {
        let state = match history.states[index] {
            ActionState::Unprocessed => "pending".to_string(),
            ActionState::Applied { node } => format!("commit {}", node + 1),
            ActionState::AppliedWithConflict { node } => format!("commit {} (conflict)", node + 1),
            ActionState::Skipped { .. } => "dropped".to_string(),
        };
        println!(
            "{:>3} {:<6} {}  -> {}",
            index,
            action.kind,
            describe(store, action.target)?,
            state
        );
    }

    println!("\nNew history:");
    for node in &history.nodes {
        let summary = node.message.lines().next().unwrap_or("");
        println!("{:>3} {}", node.position + 1, summary);
        if node.is_conflicted() {
            println!("      conflicts: {}", node.conflicts.join(", "));
        }
    }
    for warning in &history.warnings {
        println!("warning: {}", warning);
    }
    if history.has_conflicts() {
        println!("{} commit(s) conflict; fix the plan before applying", history.conflict_count());
    }

    Ok(())
}

