//! Inspect what a color scheme renders for one or more scope paths.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use scope_hunter::config::load_app_config;
use scope_hunter::host::{FsResourceLoader, SimpleScorer};
use scope_hunter::matcher::{MatchOptions, SpecialColorName};
use scope_hunter::session::Session;
use scope_hunter::{logging, notification};

#[derive(Parser, Debug)]
#[command(name = "scope-hunter")]
#[command(about = "Resolve the color and style a scheme renders for a scope")]
#[command(version)]
struct Args {
    /// Scheme path, either `Packages/<package>/<file>` or a plain file path
    scheme: String,

    /// Scope paths to resolve, e.g. "source.rust string.quoted.double"
    #[arg(required = true)]
    scopes: Vec<String>,

    /// Package root directory; may be repeated
    #[arg(long = "root", value_name = "DIR")]
    roots: Vec<PathBuf>,

    /// Render as if the text were selected
    #[arg(long)]
    selected: bool,

    /// Omit the background unless a rule sets one
    #[arg(long)]
    explicit_background: bool,

    #[arg(long)]
    no_bold: bool,

    #[arg(long)]
    no_italic: bool,

    /// Also print the scheme's special colors
    #[arg(long)]
    specials: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init();

    let mut config = load_app_config();
    config.package_roots.extend(args.roots);
    let loader = FsResourceLoader::new(config.package_roots.clone());
    let notifier = notification::from_config(config.desktop_notifications);

    let mut session = Session::new(config, Box::new(loader), notifier);
    session
        .reload_scheme(&args.scheme)
        .with_context(|| format!("failed to load color scheme {}", args.scheme))?;

    if args.specials {
        if let Some(engine) = session.engine() {
            println!(
                "{} ({})",
                engine.name().unwrap_or(engine.scheme_file()),
                if engine.is_dark_theme() { "dark" } else { "light" }
            );
            for name in SpecialColorName::ALL {
                if let Some(color) = engine.special_color(name, false) {
                    println!("  {:<22} {color}", name.key());
                }
            }
            println!();
        }
    }

    let match_options = MatchOptions {
        selected: args.selected,
        explicit_background: args.explicit_background,
        no_bold: args.no_bold,
        no_italic: args.no_italic,
    };
    for scope in &args.scopes {
        let report = session
            .inspect_scope(&SimpleScorer, scope, match_options)
            .with_context(|| format!("failed to resolve scope {scope}"))?;
        println!("{report}");
    }

    Ok(())
}
