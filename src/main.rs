//! Framescope - devtools for an embedded frame
//!
//! Opens a page in a headless Host, runs console commands against it and
//! prints what the panels show.

use framescope::devtools::{PanelTab, create_bookmarklet};
use framescope::host::MemoryStore;
use framescope::storage::StorageKind;
use framescope::{Host, HostConfig, HttpLoader, NAME, VERSION};
use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Options {
    address: Option<String>,
    commands: Vec<String>,
    source: bool,
    tree: bool,
    storage: Option<StorageKind>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }
    if args[0] == "--bookmarklet" {
        let origin = args.get(1).map(String::as_str).unwrap_or("http://localhost:8080");
        println!("{}", create_bookmarklet(origin));
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} failed: {}", NAME, e);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("{} v{}", NAME, VERSION);
    println!();
    println!("usage: framescope [options] <url-or-file> [code ...]");
    println!("       framescope --bookmarklet [origin]");
    println!();
    println!("  --source          print the formatted page source");
    println!("  --tree            print the element tree");
    println!("  --storage <kind>  print localStorage, sessionStorage or cookies");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--source" => options.source = true,
            "--tree" => options.tree = true,
            "--storage" => {
                let kind = iter.next().ok_or("--storage needs a kind")?;
                options.storage =
                    Some(StorageKind::parse(kind).ok_or(format!("unknown storage kind {}", kind))?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
            _ if options.address.is_none() => options.address = Some(arg.clone()),
            _ => options.commands.push(arg.clone()),
        }
    }
    Ok(options)
}

/// Local paths become `file://` URLs; everything else goes to the address bar as is
fn address_for(input: &str) -> String {
    let path = Path::new(input);
    if path.exists() {
        if let Some(url) = path
            .canonicalize()
            .ok()
            .and_then(|p| url::Url::from_file_path(p).ok())
        {
            return url.to_string();
        }
    }
    input.to_string()
}

fn run(options: Options) -> framescope::Result<()> {
    let config = HostConfig::from_env()?;
    let mut host = Host::new(config, HttpLoader::new()?, MemoryStore::new());

    if options.tree {
        host.switch_tab(PanelTab::Elements);
    }
    match &options.address {
        Some(address) => host.open(&address_for(address))?,
        None => host.open_home()?,
    }
    println!("Loaded {}", host.address());

    for code in &options.commands {
        host.run_console_code(code)?;
        while host.pending_count() > 0 {
            host.tick();
            if host.pending_count() > 0 {
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
    host.tick();

    for line in host.console().lines() {
        println!("{}", line);
    }
    if options.tree {
        println!();
        for line in host.dom_inspector().lines() {
            println!("{}", line);
        }
    }
    if let Some(kind) = options.storage {
        println!();
        for (key, value) in host.load_storage_data(kind)? {
            println!("{} = {}", key, value);
        }
    }
    if options.source {
        println!();
        println!("{}", host.view_page_source()?);
    }
    Ok(())
}
