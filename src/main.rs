use clap::{Parser, Subcommand};
use dirpage::{Site, config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dirpage")]
#[command(about = "Resolve pages from a directory tree of menus and articles")]
#[command(long_about = "\
Resolve pages from a directory tree of menus and articles

Every directory with a metadata descriptor is an entry. A markdown body next
to the descriptor makes it an article; without one it is a menu node.

Site structure:

  site/
  ├── config.toml                  # Optional, see 'dirpage gen-config'
  └── pages/                       # Content root
      ├── menu1/
      │   ├── meta.json            # {\"Title\": \"Menu 1\", \"Priority\": 2}
      │   ├── article1/
      │   │   ├── meta.json        # {\"Title\": \"First\", \"Date\": \"2024-01-01 10:00\"}
      │   │   └── article.md
      │   └── drafts/
      │       └── meta.json        # {\"Hidden\": true} → only by exact path
      └── assets/                  # No descriptor: not an entry

Ordering within a level: index articles last, then Priority (high first),
then Date (new first).

Set RUST_LOG to control log output, e.g. RUST_LOG=dirpage=debug.")]
#[command(version)]
struct Cli {
    /// Site directory (holds config.toml and the content root)
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    /// Log at debug level and print error causes
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show how a request path resolves: menus, articles, index, content
    Outline {
        /// Request path, e.g. /menu1/article1
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print the rendered HTML of the page's content article
    Render {
        /// Request path, e.g. /menu1/article1
        #[arg(default_value = "/")]
        path: String,
    },
    /// Load every entry and render every article, reporting problems
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = run(&cli);
    if let Err(err) = &result {
        if cli.debug {
            let mut source = err.source();
            while let Some(cause) = source {
                tracing::debug!("caused by: {cause}");
                source = cause.source();
            }
        }
    }
    result
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Outline { path } => {
            let page = open_site(cli)?.page(path)?;
            output::print_outline(&page);
        }
        Command::Render { path } => {
            let page = open_site(cli)?.page(path)?;
            let content = page
                .content()
                .ok_or_else(|| format!("no content at {}", page.path()))?;
            match content.render() {
                Some(Ok(html)) => println!("{html}"),
                Some(Err(err)) => return Err(err.to_string().into()),
                None => return Err(format!("{} is not an article", content.link()).into()),
            }
        }
        Command::Check => {
            let site = open_site(cli)?;
            println!("==> Checking {}", cli.site.display());
            let report = site.check();
            output::print_check_report(&report);
            if !report.is_clean() {
                return Err(format!("{} issue(s) found", report.issues.len()).into());
            }
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn open_site(cli: &Cli) -> Result<Site, config::ConfigError> {
    let site = Site::open(&cli.site)?;
    init_thread_pool(&site.config().processing);
    Ok(site)
}

fn init_tracing(debug: bool) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(debug, env.as_deref()))
        .with_writer(std::io::stderr)
        .init();
}

/// `--debug` wins over `RUST_LOG`; otherwise `RUST_LOG`, falling back to `info`.
fn log_filter(debug: bool, env: Option<&str>) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
