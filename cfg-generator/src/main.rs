use cacti::api::SystemConfig;
use log::info;
use std::path::Path;

///
/// Generate Runtime Configuration
///
/// We use this to generate a serialized configuration file that's easy to
/// load. Each limit can be overridden by a `name=value` argument, e.g.
/// `cfg-generator pool_size=8 batch_size=4`.
///
fn main() {
    if let Err(e) = simple_logger::init_with_level(log::Level::Info) {
        eprintln!("Failed to set up logging: {}", e);
    }

    let mut config = SystemConfig::default();
    for argument in std::env::args().skip(1) {
        if let Err(e) = apply(&mut config, &argument) {
            panic!("{}", e);
        }
    }
    if let Err(e) = config.validate() {
        panic!("{}", e);
    }
    info!("{:#?}", config);

    if let Err(e) = std::fs::create_dir_all("./cfg") {
        panic!("Failed to create ./cfg: {}", e);
    }
    if let Err(e) = config.store(Path::new("./cfg/cacti.cfg")) {
        panic!("{}", e);
    };
}

fn apply(config: &mut SystemConfig, argument: &str) -> Result<(), String> {
    let mut parts = argument.splitn(2, '=');
    let name = parts.next().unwrap_or_default();
    let value = parts
        .next()
        .ok_or_else(|| format!("expected name=value, got '{}'", argument))?;
    let invalid = |e: &dyn std::fmt::Display| format!("invalid value for {}: {}", name, e);
    match name {
        "pool_size" => config.pool_size = value.parse().map_err(|e| invalid(&e))?,
        "mailbox_capacity" => config.mailbox_capacity = value.parse().map_err(|e| invalid(&e))?,
        "actor_limit" => config.actor_limit = value.parse().map_err(|e| invalid(&e))?,
        "batch_size" => config.batch_size = value.parse().map_err(|e| invalid(&e))?,
        "poll_interval_ms" => config.poll_interval_ms = value.parse().map_err(|e| invalid(&e))?,
        "handle_interrupt" => config.handle_interrupt = value.parse().map_err(|e| invalid(&e))?,
        _ => return Err(format!("unknown setting '{}'", name)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_are_applied() {
        let mut config = SystemConfig::default();
        apply(&mut config, "pool_size=8").unwrap();
        apply(&mut config, "handle_interrupt=false").unwrap();
        assert_eq!(config.pool_size, 8);
        assert!(!config.handle_interrupt);
    }

    #[test]
    fn bad_overrides_are_reported() {
        let mut config = SystemConfig::default();
        assert!(apply(&mut config, "pool_size").is_err());
        assert!(apply(&mut config, "pool_size=many").is_err());
        assert!(apply(&mut config, "workers=2").is_err());
        assert_eq!(config, SystemConfig::default());
    }
}
