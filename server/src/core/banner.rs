//! Startup banner

use super::config::AppConfig;
use super::constants::APP_NAME;

// Label width: "OTLP gRPC receiver:" is 19 chars, pad to 21 for alignment
const W: usize = 21;

fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

/// Print receiver endpoints, the usage oracle and the export destination
pub fn print_banner(config: &AppConfig) {
    let host = config.server.host.as_str();
    let display_host = if is_all_interfaces(host) {
        "localhost"
    } else {
        host
    };

    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/v1/metrics",
        "OTLP HTTP receiver:", display_host, config.server.port
    );
    if config.otel.grpc_enabled {
        println!(
            "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}:{}",
            "OTLP gRPC receiver:", display_host, config.otel.grpc_port
        );
    }
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m http://{}:{}/api/v1/stats",
        "Stats:", display_host, config.server.port
    );
    println!(
        "  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Usage oracle:", config.usage.address
    );

    match &config.exporter {
        Some(exporter) => println!(
            "  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
            "Export to:", exporter.endpoint
        ),
        None => println!(
            "  \x1b[90m➜  {:<W$} none (pruned batches are discarded)\x1b[0m",
            "Export to:"
        ),
    }

    if host == "127.0.0.1" || host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to expose\x1b[0m",
            "Network:"
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(is_all_interfaces("[::]"));
        assert!(!is_all_interfaces("127.0.0.1"));
        assert!(!is_all_interfaces("localhost"));
    }
}
