use crate::chain::factorial;
use cacti::api::SystemConfig;
use log::warn;
use std::io::Read;
use std::process;

mod chain;

const CONFIG_PATHS: [&str; 2] = ["./cacti.cfg", "./cfg/cacti.cfg"];

fn main() {
    if let Err(e) = simple_logger::init_with_level(log::Level::Warn) {
        eprintln!("Failed to set up logging: {}", e);
    }

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("Failed to read input: {}", e);
        process::exit(1);
    }
    let n = match input.split_whitespace().next().map(str::parse::<i64>) {
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("Invalid argument: {}", e);
            process::exit(1);
        }
        None => {
            eprintln!("Expected a number on standard input");
            process::exit(1);
        }
    };

    let config = match SystemConfig::load_first_or_default(&CONFIG_PATHS) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, using the defaults", e);
            SystemConfig::default()
        }
    };

    match factorial(n, config) {
        Ok(result) => println!("{}", result),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
