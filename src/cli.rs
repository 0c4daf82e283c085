use clap::Parser;
use std::path::PathBuf;

/// Calypso - multi-agent vacation planning service
#[derive(Parser, Debug, Clone)]
#[command(name = "calypso", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "CALYPSO_CONFIG", default_value = "calypso.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "CALYPSO_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "CALYPSO_PORT")]
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_calypso_toml() {
        let cli = Cli::parse_from(["calypso"]);
        assert_eq!(cli.config, PathBuf::from("calypso.toml"));
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn overrides_host_and_port() {
        let cli = Cli::parse_from(["calypso", "--host", "127.0.0.1", "--port", "9000"]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
    }
}
