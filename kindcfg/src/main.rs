mod application;
mod compose;
mod config;
mod logging;
mod nodes;
mod options;

use anyhow::Result;
use application::{handle_result, with_logging};
use clap::{CommandFactory as _, Parser, Subcommand};
use options::Options;

fn main() {
    let args = Args::parse();
    handle_result(run_args(args));
}

fn run_args(args: Args) -> Result<()> {
    match &args.command {
        Commands::Validate => with_logging(&args.options, || {
            let cluster = config::load_cluster(&args.options.config)?;
            eprintln!(
                "{}: valid, {} node(s)",
                args.options.config.display(),
                cluster.nodes_or_default().len()
            );
            Ok(())
        }),
        Commands::Nodes => with_logging(&args.options, || {
            let cluster = config::load_cluster(&args.options.config)?;
            print!("{}", nodes::describe_nodes(&cluster)?);
            Ok(())
        }),
        Commands::Compose(subargs) => with_logging(&args.options, || {
            compose::compose_command(&args.options, subargs)
        }),
        Commands::GenerateMan => (|| {
            let cmd = Args::command();
            let man = clap_mangen::Man::new(cmd);
            let mut buffer: Vec<u8> = Default::default();
            man.render(&mut buffer)?;
            println!("{}", String::from_utf8(buffer)?);
            Ok(())
        })(),
        Commands::GenerateMarkdown => {
            let opts = clap_markdown::MarkdownOptions::new().show_footer(false);
            let markdown: String = clap_markdown::help_markdown_custom::<Args>(&opts);
            println!("{}", markdown);
            Ok(())
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Args::command();
            clap_complete::generate(*shell, &mut cmd, "kindcfg", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// kindcfg: check kind cluster configurations and compose their patches
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: Options,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the cluster configuration and report every problem in it
    Validate,

    /// List the nodes the configuration describes, with their roles
    Nodes,

    /// Apply the configured patches to a generated kubeadm or containerd config
    #[command()]
    Compose(compose::Args),

    /// Generate markdown documentation for kindcfg
    #[command(hide = true)]
    GenerateMarkdown,

    /// Generate a manpage for kindcfg
    #[command(hide = true)]
    GenerateMan,

    /// Generate shell completion for kindcfg
    #[command(hide = true)]
    GenerateCompletion {
        /// The shell to generate completion for
        #[arg(long)]
        shell: clap_complete::Shell,
    },
}
