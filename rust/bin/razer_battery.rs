//! razer-battery
//!
//! Query battery state of attached Razer wireless devices. Results are
//! printed to stdout as JSON; logs go to stderr.

use clap::{ArgGroup, Args as ClapArgs, Parser, Subcommand};
use razer_battery::{logging, BatteryService, Config, DeviceClass, Selector};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "razer-battery")]
#[command(author, version, about = "Read battery levels from Razer wireless devices")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List attached devices from the catalogue
    List,
    /// Read battery state; prints null when no device answered
    Query(QueryArgs),
}

#[derive(ClapArgs, Debug)]
#[command(group(ArgGroup::new("target").args(["keyboard", "mouse", "product_id"])))]
struct QueryArgs {
    /// First wireless keyboard
    #[arg(long)]
    keyboard: bool,

    /// First wireless mouse (the default)
    #[arg(long)]
    mouse: bool,

    /// Exact USB product id, e.g. 0x007B
    #[arg(long, value_name = "PID", value_parser = parse_product_id)]
    product_id: Option<u16>,

    /// Rescan the bus before querying
    #[arg(long)]
    refresh: bool,
}

impl QueryArgs {
    fn selector(&self) -> Selector {
        match (self.product_id, self.keyboard) {
            (Some(pid), _) => Selector::Product(pid),
            (None, true) => Selector::Class(DeviceClass::Keyboard),
            (None, false) => Selector::Class(DeviceClass::Mouse),
        }
    }
}

fn parse_product_id(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid product id '{s}': {e}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    logging::init_logging(log_level)?;

    let service = BatteryService::usb(&config);

    let output = match &args.command {
        Command::List => serde_json::to_string_pretty(&service.list_devices().await)?,
        Command::Query(query) => {
            let reading = service.query_battery(query.selector(), query.refresh).await;
            serde_json::to_string_pretty(&reading)?
        }
    };
    println!("{output}");

    service.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("0x007B"), Ok(0x007B));
        assert_eq!(parse_product_id("00b7"), Ok(0x00B7));
        assert!(parse_product_id("0xZZ").is_err());
        assert!(parse_product_id("0x10000").is_err());
    }

    #[test]
    fn test_selector_defaults_to_mouse() {
        let args = Args::parse_from(["razer-battery", "query"]);
        let Command::Query(query) = args.command else {
            panic!("expected query");
        };
        assert_eq!(query.selector(), Selector::Class(DeviceClass::Mouse));
    }

    #[test]
    fn test_selector_product() {
        let args = Args::parse_from(["razer-battery", "query", "--product-id", "0x007A", "--refresh"]);
        let Command::Query(query) = args.command else {
            panic!("expected query");
        };
        assert_eq!(query.selector(), Selector::Product(0x007A));
        assert!(query.refresh);
    }

    #[test]
    fn test_target_flags_conflict() {
        assert!(Args::try_parse_from(["razer-battery", "query", "--mouse", "--keyboard"]).is_err());
    }
}
