use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use kindcfg_core::NodeRole;
use kindcfg_patch::{
    compose, compose_targets, BoxError, ComposeError, Document, NodeComposition, PatchRegistry,
    TargetKind,
};
use tracing::warn;

use crate::config::load_cluster;
use crate::options::Options;

#[derive(clap::Parser, Debug)]
pub(crate) struct Args {
    /// The document to patch: kubeadm (YAML stream) or runtime (containerd TOML)
    #[arg(long)]
    target: TargetKind,

    /// The generated, unpatched document
    #[arg(long)]
    base: PathBuf,

    /// Compose for one node only, by index. Without this, every node is composed.
    #[arg(long)]
    node: Option<usize>,
}

/// Run the `compose` command.
pub(crate) fn compose_command(options: &Options, args: &Args) -> Result<()> {
    let cluster = load_cluster(&options.config)?;
    let registry = PatchRegistry::build(&cluster);

    let text = std::fs::read_to_string(&args.base)
        .with_context(|| format!("could not read {}", args.base.display()))?;
    let base = Document::parse(args.target, &text)
        .with_context(|| format!("could not parse {} as {}", args.base.display(), args.target))?;

    match args.node {
        Some(index) => {
            let document = compose(base, args.target, index, &registry)
                .map_err(|e| explain(e, args.target))?;
            print!("{}", document.render(args.target)?);
            Ok(())
        }
        None => {
            let bases = |_: usize, _: NodeRole, _: TargetKind| -> Result<Document, BoxError> {
                Ok(base.clone())
            };
            let results = compose_targets(&registry, &[args.target], &bases);
            print!("{}", render_all(&results, args.target)?);
            check_all(results, args.target)
        }
    }
}

/// The successful compositions, each headed by a comment naming the node.
fn render_all(results: &[NodeComposition], target: TargetKind) -> Result<String> {
    let mut out = String::new();
    for c in results {
        let Ok(document) = &c.result else {
            continue;
        };
        if target == TargetKind::Kubeadm && !out.is_empty() {
            out.push_str("---\n");
        }
        out.push_str(&format!("# node {} ({})\n", c.node, c.role));
        out.push_str(&document.render(target)?);
        if target == TargetKind::Runtime {
            out.push('\n');
        }
    }
    Ok(out)
}

fn check_all(results: Vec<NodeComposition>, target: TargetKind) -> Result<()> {
    let total = results.len();
    let mut failed = 0;
    for c in results {
        if let Err(e) = c.result {
            failed += 1;
            let e = explain(e, target);
            warn!("node {} ({}): {:?}", c.node, c.role, e);
        }
    }
    if failed > 0 {
        bail!("{} of {} node(s) could not be composed", failed, total);
    }
    Ok(())
}

/// For a failed patch, include the document as it was before that patch.
fn explain(e: ComposeError, target: TargetKind) -> anyhow::Error {
    let partial = match &e {
        ComposeError::PatchApply { partial, .. } => partial.render(target).ok(),
        _ => None,
    };
    match partial {
        Some(partial) => anyhow::Error::new(e).context(format!(
            "document before the failing patch:\n{}",
            partial.trim_end()
        )),
        None => e.into(),
    }
}
