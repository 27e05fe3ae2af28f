use anyhow::{Context, bail};
use nutprobe::config::ScannerConfig;
use nutprobe::scanner::{NutScanner, ScanRecorder, SystemRunner};
use std::env;
use std::fs;
use std::net::IpAddr;
use std::process;

fn print_usage() {
    eprintln!(
        "Usage: cargo run --example probe_device -- <device-name> <address> [--netxml] [--enhanced] [--community <c>] [--record <out.jsonl>]"
    );
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        print_usage();
        process::exit(2);
    }

    let device = &args[1];
    let address: IpAddr = args[2]
        .parse()
        .with_context(|| format!("invalid address '{}'", args[2]))?;

    let mut netxml = false;
    let mut enhanced = false;
    let mut community: Option<String> = None;
    let mut record_to: Option<String> = None;

    let mut rest = args.iter().skip(3);
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--netxml" => netxml = true,
            "--enhanced" => enhanced = true,
            "--community" => {
                community = Some(
                    rest.next()
                        .context("--community requires a value")?
                        .clone(),
                );
            }
            "--record" => {
                record_to = Some(rest.next().context("--record requires a path")?.clone());
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            unknown => bail!("unknown flag: {unknown}"),
        }
    }

    let scanner = NutScanner::with_runner(
        ScannerConfig::from_env(),
        ScanRecorder::new(SystemRunner::new()),
    );

    let result = if netxml {
        scanner.probe_netxml_http(device, address)
    } else {
        scanner.probe_snmp(device, address, community.as_deref(), enhanced)
    };

    if let Some(path) = record_to {
        let transcript = scanner.runner().to_jsonl()?;
        fs::write(&path, transcript).with_context(|| format!("writing transcript to {path}"))?;
        eprintln!("Transcript written to {path}");
    }

    let snippets = result.with_context(|| format!("probing {device} at {address}"))?;
    println!("# {} suggestion(s) for {device}", snippets.len());
    for snippet in &snippets {
        print!("{snippet}");
    }
    Ok(())
}
