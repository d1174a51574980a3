use crate::columns::row_sums;
use crate::matrix::Matrix;
use cacti::api::SystemConfig;
use log::warn;
use std::io::Read;
use std::process;

pub mod columns;
pub mod matrix;

/// Where a config written by `cfg-generator` is looked for.
const CONFIG_PATHS: [&str; 2] = ["./cacti.cfg", "./cfg/cacti.cfg"];

fn main() {
    if let Err(e) = simple_logger::init_with_level(log::Level::Warn) {
        eprintln!("Failed to set up logging: {}", e);
    }

    let config = match SystemConfig::load_first_or_default(&CONFIG_PATHS) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, using the defaults", e);
            SystemConfig::default()
        }
    };

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        eprintln!("Failed to read input: {}", e);
        process::exit(1);
    }
    let matrix = match Matrix::parse(&input) {
        Ok(matrix) => matrix,
        Err(e) => {
            eprintln!("Invalid input: {}", e);
            process::exit(1);
        }
    };

    match row_sums(matrix, config) {
        Ok(sums) => {
            for sum in sums {
                println!("{}", sum);
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
