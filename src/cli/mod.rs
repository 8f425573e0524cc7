use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// modx: discover every Go module in a workspace and run tasks across them.
///
/// Usage:
///   modx modules [--json]                     List modules in dependency order.
///   modx run [--ordered|--parallel] <cmd...>  Run a command in every module.
///   modx graph [--format tree|json|dot|mermaid] [--depth N] [--filter P]
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The action followed by its arguments. Each action parses its own flags.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
