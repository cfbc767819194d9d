use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use git_chunks::{
    ApplyOptions, ChunkAction, DiffKind, GitChunks, GitCli, Outcome, RowSpec, Side, git,
};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

#[derive(Parser)]
#[command(name = "git-chunks")]
#[command(about = "Stage, unstage and discard parts of a file's diff by row")]
struct Cli {
    /// Repository to work in
    #[arg(short = 'C', long, global = true, env = "GIT_CHUNKS_REPO", default_value = ".")]
    repo: PathBuf,

    /// Git executable
    #[arg(long, global = true, env = "GIT_CHUNKS_GIT", default_value = "git")]
    git: String,

    /// Value passed to `git apply --whitespace`
    #[arg(long, global = true, default_value = "nowarn")]
    whitespace: String,

    /// Lines of context around each change
    #[arg(long, global = true, default_value_t = 3)]
    context: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the diff of a file with row indices
    Show {
        path: String,
        /// Show the staged diff instead of the unstaged one
        #[arg(long)]
        staged: bool,
        /// Show old and new versions in two columns
        #[arg(long)]
        side_by_side: bool,
    },
    /// Stage the rows (e.g. "12" for the chunk at row 12, or "3..7") of the unstaged diff
    Stage {
        path: String,
        rows: RowSpec,
        /// Read rows from one column of the side-by-side view
        #[arg(long)]
        side: Option<SideArg>,
    },
    /// Unstage rows of the staged diff
    Unstage {
        path: String,
        rows: RowSpec,
        #[arg(long)]
        side: Option<SideArg>,
    },
    /// Throw away rows of the unstaged (or, with --staged, the staged) diff
    Discard {
        path: String,
        rows: RowSpec,
        #[arg(long)]
        staged: bool,
        #[arg(long)]
        side: Option<SideArg>,
    },
    /// List changed files
    Status,
    /// List tags with the commits they point at
    Tags,
    /// Print shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    Old,
    New,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Old => Side::Old,
            SideArg::New => Side::New,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let git_cli = GitCli::new(&cli.repo).with_program(&cli.git);
    let options = ApplyOptions {
        whitespace: cli.whitespace.clone(),
    };

    match cli.command {
        Commands::Show {
            path,
            staged,
            side_by_side,
        } => {
            let mut chunks =
                GitChunks::new(git_cli, options, cli.context).with_side_by_side(side_by_side);
            chunks.open(&path, diff_kind(staged)).await?;
            if let Some(text) = chunks.render() {
                print!("{text}");
            }
        }
        Commands::Stage { path, rows, side } => {
            let mut chunks = GitChunks::new(git_cli, options, cli.context);
            run(&mut chunks, ChunkAction::Stage, &path, DiffKind::Unstaged, rows, side).await?;
        }
        Commands::Unstage { path, rows, side } => {
            let mut chunks = GitChunks::new(git_cli, options, cli.context);
            run(&mut chunks, ChunkAction::Unstage, &path, DiffKind::Staged, rows, side).await?;
        }
        Commands::Discard {
            path,
            rows,
            staged,
            side,
        } => {
            let mut chunks = GitChunks::new(git_cli, options, cli.context);
            run(&mut chunks, ChunkAction::Discard, &path, diff_kind(staged), rows, side).await?;
        }
        Commands::Status => {
            for change in git::status(&git_cli)? {
                println!(
                    "{}{} {}",
                    change.index.code(),
                    change.worktree.code(),
                    change.path
                );
            }
        }
        Commands::Tags => {
            for tag in git::tags(&git_cli)? {
                println!("{} {}", tag.sha, tag.name);
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-chunks", &mut std::io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut std::io::stdout())?;
        }
    }

    Ok(())
}

fn diff_kind(staged: bool) -> DiffKind {
    if staged { DiffKind::Staged } else { DiffKind::Unstaged }
}

async fn run(
    chunks: &mut GitChunks,
    action: ChunkAction,
    path: &str,
    kind: DiffKind,
    rows: RowSpec,
    side: Option<SideArg>,
) -> Result<(), git_chunks::GitChunksError> {
    chunks.open(path, kind).await?;
    match chunks.perform(action, rows, side.map(Side::from)).await? {
        Outcome::Nothing => eprintln!("Nothing to {action} in {path}"),
        Outcome::WholeFile => eprintln!("{action}: {path}"),
        Outcome::Patched { hunks } => eprintln!("{action}: {hunks} hunk(s) of {path}"),
    }
    Ok(())
}
