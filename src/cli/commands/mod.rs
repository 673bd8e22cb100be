//! CLI command definitions and dispatch.
//!
//! - `show`: summary table of the merged inputs
//! - `list`: one filtered listing
//! - `targets`: every target as an absolute path
//! - `convert`: rewrite the inputs into one out playlist
//!
//! Every subcommand ends in the same pipeline run; they differ only in the
//! [`Options`] they build.

mod args;

use clap::{ArgMatches, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{self, FileConfig, Options, PathMode};
use crate::diagnostics::Diagnostics;
use crate::metadata::LoftyTagReader;
use crate::pipeline::{Outcome, Pipeline};
use crate::report::{ListKey, ListKind, ListView};
use crate::resolver::HttpProbe;

pub use args::{EditArgs, PipelineArgs, absolutize, edits_in_order};

/// Playlist format converter and checker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print no diagnostics, allow overwriting the out playlist
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Keep entries of inputs that have parse problems
    #[arg(long, global = true)]
    pub tolerant: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a summary table of the inputs
    Show {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// List the targets of a subset of entries
    List {
        /// Which entries to list
        #[arg(value_enum)]
        kind: ListKind,

        /// Column printed before each target
        #[arg(short, long, value_enum, default_value_t = ListKey::Track)]
        key: ListKey,

        /// Print targets only
        #[arg(short = 'T', long, conflicts_with = "key")]
        targets_only: bool,

        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Print every target as an absolute path
    Targets {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Write the inputs into one out playlist
    Convert {
        /// Out playlist; its extension picks the format
        #[arg(short, long)]
        output: PathBuf,

        /// Print the summary instead of writing
        #[arg(short = 'x', long)]
        preview: bool,

        #[command(flatten)]
        args: PipelineArgs,

        #[command(flatten)]
        edit: EditArgs,
    },
}

/// Build the run options for `cli`.
///
/// `matches` are the top-level matches `cli` was parsed from.
pub fn build_options(
    cli: &Cli,
    matches: &ArgMatches,
    config: &FileConfig,
    cwd: &std::path::Path,
) -> crate::error::Result<Options> {
    let mut options = match &cli.command {
        Commands::Show { args } => args.to_options(config, cwd),
        Commands::List {
            kind,
            key,
            targets_only,
            args,
        } => {
            let mut options = args.to_options(config, cwd);
            options.listing = Some(ListView {
                kind: *kind,
                key: *key,
                targets_only: *targets_only,
            });
            options
        }
        Commands::Targets { args } => {
            let mut options = args.to_options(config, cwd);
            options.output = Some(std::env::temp_dir().join("playlisttargets.m3u"));
            options.path_mode = PathMode::Absolute;
            options.preview = true;
            options.listing = Some(ListView::all_targets());
            options
        }
        Commands::Convert {
            output,
            preview,
            args,
            edit,
        } => {
            let mut options = args.to_options(config, cwd);
            options.output = Some(absolutize(cwd, output));
            options.preview = *preview;
            let sub_matches = matches
                .subcommand_matches("convert")
                .ok_or_else(|| crate::error::Error::config("Missing convert arguments"))?;
            edit.apply(&mut options, sub_matches, cwd)?;
            options
        }
    };

    options.quiet |= cli.quiet;
    options.tolerant |= cli.tolerant;
    options.validate()?;
    Ok(options)
}

/// Run the parsed command. Returns how the run went.
pub fn run_command(cli: &Cli, matches: &ArgMatches) -> anyhow::Result<Outcome> {
    let config = config::load();
    let cwd = std::env::current_dir()?;
    let options = build_options(cli, matches, &config, &cwd)?;
    debug!(target: "cli", ?options, "Resolved options");

    let probe = if options.verify_network {
        Some(HttpProbe::new(options.network.timeout(), &options.network.user_agent)?)
    } else {
        None
    };
    let tag_reader = LoftyTagReader;

    let mut pipeline = Pipeline::new(&options).with_cwd(&cwd);
    if let Some(probe) = &probe {
        pipeline = pipeline.with_probe(probe);
    }
    if options.read_tags {
        pipeline = pipeline.with_tag_reader(&tag_reader);
    }

    let mut diags = Diagnostics::new();
    let result = pipeline.run(&mut io::stdout().lock(), &mut diags);
    if !options.quiet {
        diags.flush_to(io::stderr().lock())?;
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EntryEdit;
    use clap::{CommandFactory, FromArgMatches};

    fn parse(argv: &[&str]) -> (Cli, ArgMatches) {
        let matches = Cli::command().try_get_matches_from(argv).unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        (cli, matches)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_changes_and_removals_keep_command_line_order() {
        let (_, matches) = parse(&[
            "playlist-forge", "convert", "-o", "out.m3u", "in.m3u",
            "-r", "3", "-e", "1:ti=A", "-r", "x.mp3", "-e", "2:ar=B",
        ]);
        let sub = matches.subcommand_matches("convert").unwrap();
        assert_eq!(
            edits_in_order(sub),
            vec![
                EntryEdit::Remove("3".into()),
                EntryEdit::Change("1:ti=A".into()),
                EntryEdit::Remove("x.mp3".into()),
                EntryEdit::Change("2:ar=B".into()),
            ]
        );
    }

    #[test]
    fn test_convert_options() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, matches) = parse(&[
            "playlist-forge", "-q", "convert", "-o", "out/new.xspf", "a.m3u", "b.pls",
            "-R", "-d", "-t", "Mix",
        ]);
        let options = build_options(&cli, &matches, &FileConfig::default(), dir.path()).unwrap();

        assert_eq!(options.output, Some(dir.path().join("out/new.xspf")));
        assert_eq!(options.inputs, vec![dir.path().join("a.m3u"), dir.path().join("b.pls")]);
        assert_eq!(options.path_mode, PathMode::RelativeToOutput);
        assert_eq!(options.title.as_deref(), Some("Mix"));
        assert!(options.drop_duplicates);
        assert!(options.quiet);
    }

    #[test]
    fn test_conflicting_transforms_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, matches) = parse(&[
            "playlist-forge", "convert", "-o", "out.m3u", "a.m3u", "-O", "-B", "/music",
        ]);
        let err = build_options(&cli, &matches, &FileConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_existing_output_needs_quiet() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.m3u"), "").unwrap();

        let (cli, matches) = parse(&["playlist-forge", "convert", "-o", "out.m3u", "a.m3u"]);
        let err = build_options(&cli, &matches, &FileConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, crate::error::Error::OutputExists(_)));

        let (cli, matches) = parse(&["playlist-forge", "convert", "-x", "-o", "out.m3u", "a.m3u"]);
        assert!(build_options(&cli, &matches, &FileConfig::default(), dir.path()).is_ok());
    }

    #[test]
    fn test_list_and_targets_options() {
        let dir = tempfile::tempdir().unwrap();
        let (cli, matches) = parse(&["playlist-forge", "list", "unfoundimg", "-k", "playlist-title", "a.m3u"]);
        let options = build_options(&cli, &matches, &FileConfig::default(), dir.path()).unwrap();
        assert_eq!(
            options.listing,
            Some(ListView {
                kind: ListKind::UnfoundImg,
                key: ListKey::PlaylistTitle,
                targets_only: false,
            })
        );
        assert!(options.output.is_none());

        let (cli, matches) = parse(&["playlist-forge", "targets", "a.m3u"]);
        let options = build_options(&cli, &matches, &FileConfig::default(), dir.path()).unwrap();
        assert_eq!(options.path_mode, PathMode::Absolute);
        assert_eq!(options.listing, Some(ListView::all_targets()));
        assert!(options.preview);
    }

    #[test]
    fn test_config_defaults_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FileConfig::default();
        config.defaults.drop_unfound = true;
        config.defaults.tolerant = true;

        let (cli, matches) = parse(&["playlist-forge", "show", "a.m3u"]);
        let options = build_options(&cli, &matches, &config, dir.path()).unwrap();
        assert!(options.drop_unfound);
        assert!(options.tolerant);
    }
}
