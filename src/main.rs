use anyhow::{anyhow, bail, Context, Result};
use env_logger::Builder;
use log::{info, LevelFilter};
use solana_idl_viewer::server::{self, AppState};
use solana_idl_viewer::views::{self, DiagramKind, View};
use solana_idl_viewer::{
    fetch, load_idl_with, normalize_with, Cache, Cluster, ExplorerClient, NormalizeOptions,
    ProgramModel, ViewerConfig,
};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::watch;

/// How a loaded program is printed
struct Output {
    view: View,
    diagram: Option<DiagramKind>,
    json: bool,
}

fn print_usage(program: &str) {
    println!("Solana IDL Viewer v{}", solana_idl_viewer::VERSION);
    println!("\nUsage:");
    println!("  {} <IDL_FILE> [--view VIEW] [--diagram KIND] [--json] [--strict]", program);
    println!("  {} --fetch <PROGRAM_ID> [--cluster NAME] [--no-cache] [--download]", program);
    println!("  {} --serve [ADDR]", program);
    println!("  {} --clear-cache [PROGRAM_ID]", program);
    println!("  {} --version", program);
    println!("\nOptions:");
    println!("  --view VIEW          overview, instructions, state, programs or all (default: all)");
    println!("  --diagram KIND       Print mermaid text: flow, accounts, instructions, er, overview");
    println!("  --json               Print the normalized program model as JSON");
    println!("  --strict             Fail when the IDL has no instructions array");
    println!("  --cluster NAME       Explorer cluster: devnet, mainnet-beta, testnet (default: devnet)");
    println!("  --no-cache           Don't use cached IDLs");
    println!("  --download           Download and display the IDL instead of printing its link");
    println!("  --serve [ADDR]       Run the JSON API server (default: 127.0.0.1:3000)");
    println!("  --clear-cache        Clear the cache for all programs or a specific program");
    println!("  --version, -v        Show version information");
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing value for {}", flag))
}

fn print_program(model: &ProgramModel, output: &Output) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(model)?);
    } else if let Some(kind) = output.diagram {
        let diagrams = views::diagram::render(model, kind);
        println!("{}", diagrams.join("\n"));
    } else {
        print!("{}", views::render(model, output.view));
    }
    Ok(())
}

// Simple CLI without clap
#[tokio::main]
async fn main() -> Result<()> {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("solana-idl-viewer");

    if args.len() < 2 {
        print_usage(program);
        return Ok(());
    }

    match args[1].as_str() {
        "--version" | "-v" => {
            println!("Solana IDL Viewer v{}", solana_idl_viewer::VERSION);
            Ok(())
        }
        "--help" | "-h" => {
            print_usage(program);
            Ok(())
        }
        "--clear-cache" => clear_cache(args.get(2).map(String::as_str)),
        "--serve" => serve(args.get(2).map(String::as_str)).await,
        "--fetch" => {
            let program_id = value_of(&args, 1, "--fetch")?;
            fetch_program(program_id, &args[3..]).await
        }
        _ => show_file(PathBuf::from(&args[1]), &args[2..]),
    }
}

fn clear_cache(program_id: Option<&str>) -> Result<()> {
    let cache = Cache::new(Cache::default_dir());
    match program_id {
        Some(id) => {
            let pubkey = fetch::validate_program_id(id)?;
            if cache.clear(&pubkey)? {
                println!("Cleared cache for program: {}", pubkey);
            } else {
                println!("No cached IDL for program: {}", pubkey);
            }
        }
        None => {
            cache.clear_all()?;
            println!("Cleared all cached IDLs");
        }
    }
    Ok(())
}

async fn serve(addr: Option<&str>) -> Result<()> {
    let mut config = ViewerConfig::from_env();
    if let Some(addr) = addr {
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("Invalid bind address: {}", addr))?;
        config = config.with_bind_addr(addr);
    }

    let explorer = ExplorerClient::new(&config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt");
            let _ = shutdown_tx.send(());
        }
    });

    server::run_server(AppState::new(explorer), &config, shutdown_rx)
        .await
        .context("API server failed")?;
    Ok(())
}

/// Parse display flags shared by the file and fetch commands
fn parse_output(args: &[String], options: &mut NormalizeOptions) -> Result<(Output, Vec<usize>)> {
    let mut output = Output {
        view: View::All,
        diagram: None,
        json: false,
    };
    let mut unused = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--view" => {
                output.view = value_of(args, i, "--view")?
                    .parse()
                    .map_err(|e: String| anyhow!(e))?;
                i += 2;
            }
            "--diagram" | "-d" => {
                output.diagram = Some(
                    value_of(args, i, "--diagram")?
                        .parse()
                        .map_err(|e: String| anyhow!(e))?,
                );
                i += 2;
            }
            "--json" => {
                output.json = true;
                i += 1;
            }
            "--strict" => {
                options.strict = true;
                i += 1;
            }
            _ => {
                unused.push(i);
                i += 1;
            }
        }
    }

    Ok((output, unused))
}

fn show_file(path: PathBuf, args: &[String]) -> Result<()> {
    let mut options = NormalizeOptions::default();
    let (output, unused) = parse_output(args, &mut options)?;
    if let Some(&i) = unused.first() {
        bail!("Unknown argument: {}", args[i]);
    }

    let model = load_idl_with(&path, &options)
        .with_context(|| format!("Failed to load IDL from {}", path.display()))?;
    print_program(&model, &output)
}

async fn fetch_program(program_id: &str, args: &[String]) -> Result<()> {
    let mut options = NormalizeOptions::default();
    let (output, unused) = parse_output(args, &mut options)?;
    let mut config = ViewerConfig::from_env();
    let mut download = false;

    let mut rest = unused.into_iter();
    while let Some(i) = rest.next() {
        match args[i].as_str() {
            "--cluster" | "-c" => {
                let cluster: Cluster = value_of(args, i, "--cluster")?
                    .parse()
                    .map_err(|e: String| anyhow!(e))?;
                config = config.with_cluster(cluster);
                rest.next();
            }
            "--no-cache" => config = config.with_cache(false),
            "--download" => download = true,
            other => bail!("Unknown argument: {}", other),
        }
    }

    if !download {
        let client = ExplorerClient::new(&config)?;
        let link = client
            .find_idl_link(program_id)
            .await
            .with_context(|| format!("Failed to look up IDL for {}", program_id))?;
        println!("{}", link);
        return Ok(());
    }

    println!("Fetching IDL for program: {}", program_id);
    let cache = config.use_cache.then(|| Cache::new(Cache::default_dir()));
    let raw = solana_idl_viewer::fetch_idl(program_id, &config, cache.as_ref())
        .await
        .with_context(|| format!("Failed to fetch IDL for {}", program_id))?;
    let model = normalize_with(&raw, &options)?;
    print_program(&model, &output)
}
