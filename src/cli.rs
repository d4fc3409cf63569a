use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "pan-renumber")]
#[command(about = "Renumber media files in a Quark pan folder tree and gather them", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk the tree and list the media files found
    Scan(SourceArgs),
    /// Show the numbered rename plan without touching anything
    Plan(SourceArgs),
    /// Rename every media file, then move them into one directory
    Run(RunArgs),
    /// Work out which directory the captured page is showing
    Resolve(PageArgs),
    /// Print configuration values
    PrintConfig,
}

/// Where the scan roots come from.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// JSON capture of the host page
    #[arg(long, short = 'p', conflicts_with = "dir", required_unless_present = "dir")]
    pub page: Option<PathBuf>,

    /// Remote directory id whose entries become the roots
    #[arg(long, short = 'd')]
    pub dir: Option<String>,

    /// Abort on the first failed listing instead of asking
    #[arg(long)]
    pub abort_on_error: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Rename only; never move
    #[arg(long, conflicts_with = "dest")]
    pub rename_only: bool,

    /// Destination directory id, skipping resolution
    #[arg(long)]
    pub dest: Option<String>,

    /// Do not ask before starting
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    /// JSON capture of the host page
    #[arg(long, short = 'p')]
    pub page: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from(["pan-renumber", "run", "--page", "page.json", "--dest", "abc123", "-y"]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.dest.as_deref(), Some("abc123"));
                assert!(args.yes);
                assert!(!args.rename_only);
                assert_eq!(args.source.page, Some(PathBuf::from("page.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rename_only_conflicts_with_dest() {
        assert!(Cli::try_parse_from([
            "pan-renumber", "run", "--dir", "root-dir", "--rename-only", "--dest", "abc123"
        ])
        .is_err());
    }

    #[test]
    fn source_is_required() {
        assert!(Cli::try_parse_from(["pan-renumber", "scan"]).is_err());
        assert!(Cli::try_parse_from(["pan-renumber", "scan", "--dir", "root-dir"]).is_ok());
    }
}
