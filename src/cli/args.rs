//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use livetmpl::config::DEFAULT_CONFIG_FILE;

/// Render templates against a live-reloading cache
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path
    #[arg(short = 'C', long, default_value = DEFAULT_CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Template root directory (overrides `[templates] root`)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Template file extension (overrides `[templates] extension`)
    #[arg(short, long, global = true)]
    pub ext: Option<String>,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render a template once and exit
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },

    /// Render a template, then re-render on every template change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: RenderArgs,
    },

    /// List the template names under the root
    #[command(visible_alias = "l")]
    List,
}

/// Shared arguments for Render and Watch commands
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Template name, relative to the root (e.g. `pages/index.tmpl`)
    pub name: String,

    /// JSON file with the render data
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub data: Option<PathBuf>,

    /// Set a top-level variable (KEY=VALUE, repeatable). VALUE is parsed as
    /// JSON when possible, otherwise taken as a string.
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::parse_from([
            "livetmpl", "-r", "views", "render", "page.tmpl", "-d", "data.json", "-s", "a=1",
        ]);
        assert_eq!(cli.root, Some(PathBuf::from("views")));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        let Commands::Render { args } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.name, "page.tmpl");
        assert_eq!(args.data, Some(PathBuf::from("data.json")));
        assert_eq!(args.set, ["a=1"]);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["livetmpl", "list", "--ext", "j2", "-v"]);
        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.ext.as_deref(), Some("j2"));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
