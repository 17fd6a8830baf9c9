use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;

use subnet_rollup::config_loader::{self, CliOverrides};
use subnet_rollup::session::{OutputFormat, Session};
use subnet_rollup::tree::AddressTree;

/// Track host up/down state in an IPv4 subnet and print the minimal covering prefixes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Network prefix in dotted-quad form, e.g. 128.250.1.0
    prefix: Option<String>,

    /// Network prefix width, 16..32
    width: Option<u8>,

    /// YAML startup configuration; positional arguments override its network
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Format used by the `p` command
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Default log filter (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,

    /// Check the tree invariants after every up/down command
    #[arg(long)]
    verify: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            prefix: self.prefix.clone(),
            width: self.width,
            format: self.format,
            log_level: self.log_level.clone(),
        }
    }
}

fn usage(exec_name: &str) -> String {
    format!(
        "{0} <network_ipv4_prefix> <network_prefix_width>\n\n\
         The network_prefix_width must be in the range 16..32\n\
         eg. {0} 128.250.1.0 24\n",
        exec_name
    )
}

fn exit_with_usage(reason: &str) -> ! {
    let exec_name = std::env::args().next().unwrap_or_else(|| "subnet-rollup".to_string());
    eprintln!("{}\n", reason.trim_end());
    eprint!("{}", usage(&exec_name));
    process::exit(1);
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => exit_with_usage(&e.to_string()),
        Err(e) => e.exit(),
    };

    let config = args
        .config
        .as_deref()
        .map(config_loader::load_config)
        .transpose()?;

    let settings = match config_loader::resolve_settings(config.as_ref(), &args.overrides()) {
        Ok(settings) => settings,
        Err(e) => exit_with_usage(&e.to_string()),
    };

    // Logs go to stderr alongside command diagnostics, so stay quiet by default
    env_logger::Builder::from_env(Env::default().default_filter_or(&settings.log_level)).init();

    if let Some(path) = &args.config {
        info!("Configuration file: {:?}", path);
    }
    info!(
        "Tracking {} ({} hosts, {} format)",
        settings.subnet,
        settings.subnet.size(),
        if settings.format == OutputFormat::Json { "json" } else { "text" }
    );

    let mut tree = AddressTree::build(settings.subnet.prefix(), settings.subnet.width())
        .wrap_err("Failed to build address tree")?;
    for host in &settings.hosts_up {
        tree.mark_up(*host)?;
    }
    if !settings.hosts_up.is_empty() {
        info!("Marked {} configured hosts up", settings.hosts_up.len());
    }

    let mut session = Session::new(tree, settings.format).with_verification(args.verify);
    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();

    let summary = match &args.script {
        Some(path) => {
            info!("Reading commands from {:?}", path);
            let file = File::open(path)
                .wrap_err_with(|| format!("Failed to open command script '{}'", path.display()))?;
            session.run(BufReader::new(file), &mut out, &mut err)
        }
        None => session.run(io::stdin().lock(), &mut out, &mut err),
    }
    .wrap_err("Command loop failed")?;

    info!(
        "Processed {} commands ({} rejected)",
        summary.executed, summary.rejected
    );
    Ok(())
}
