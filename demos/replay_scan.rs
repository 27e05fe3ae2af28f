use nutprobe::config::ScannerConfig;
use nutprobe::scanner::{NutScanner, ScanReplayer};
use std::env;
use std::fs;
use std::net::IpAddr;
use std::process;

fn print_usage() {
    eprintln!(
        "Usage: cargo run --example replay_scan -- <transcript.jsonl> <device-name> <address> [--netxml] [--enhanced] [--community <c>]"
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        print_usage();
        process::exit(2);
    }

    let transcript_path = &args[1];
    let device = &args[2];
    let address: IpAddr = match args[3].parse() {
        Ok(address) => address,
        Err(err) => {
            eprintln!("Invalid address '{}': {err}", args[3]);
            process::exit(2);
        }
    };

    let mut netxml = false;
    let mut enhanced = false;
    let mut community: Option<String> = None;

    let mut rest = args.iter().skip(4);
    while let Some(flag) = rest.next() {
        match flag.as_str() {
            "--netxml" => netxml = true,
            "--enhanced" => enhanced = true,
            "--community" => match rest.next() {
                Some(value) => community = Some(value.clone()),
                None => {
                    eprintln!("--community requires a value");
                    process::exit(2);
                }
            },
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            unknown => {
                eprintln!("Unknown flag: {unknown}");
                print_usage();
                process::exit(2);
            }
        }
    }

    let transcript = match fs::read_to_string(transcript_path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read transcript '{transcript_path}': {err}");
            process::exit(1);
        }
    };

    let replayer = match ScanReplayer::from_jsonl(&transcript) {
        Ok(replayer) => replayer,
        Err(err) => {
            eprintln!("Failed to load transcript: {err}");
            process::exit(1);
        }
    };

    let scanner = NutScanner::with_runner(ScannerConfig::default(), replayer);
    let result = if netxml {
        scanner.probe_netxml_http(device, address)
    } else {
        scanner.probe_snmp(device, address, community.as_deref(), enhanced)
    };

    match result {
        Ok(snippets) => {
            println!("# {} suggestion(s) for {device}", snippets.len());
            for snippet in &snippets {
                print!("{snippet}");
            }
        }
        Err(err) => {
            eprintln!("Replay failed: {err}");
            process::exit(1);
        }
    }
}
