//! Network CLI arguments.

use std::net::IpAddr;

use clap::Args;
use swarmctl_engine_api::EngineOptions;

use crate::error::AgentError;

/// Parameters for the engine's network behavior.
#[derive(Debug, Args, Clone, PartialEq, Eq)]
#[command(next_help_heading = "Networking")]
pub struct NetworkArgs {
    /// Port to listen on. Nodes do not require listening; 0 lets the
    /// engine pick.
    #[arg(long, short = 'p', default_value_t = 49737, value_name = "PORT")]
    pub port: u16,

    /// Address to listen on (only used together with --port).
    #[arg(long, short = 'a', default_value = "0.0.0.0", value_name = "ADDR")]
    pub address: String,

    /// Comma separated bootstrap peers as host:port.
    ///
    /// --bootstrap 198.51.100.1:49737,198.51.100.2:49737
    #[arg(long, short = 'b', value_delimiter = ',', value_name = "PEERS")]
    pub bootstrap: Vec<String>,

    /// Disable adaptive ephemerality (run persistent from the start).
    #[arg(long)]
    pub no_adaptive: bool,

    /// Host other peers' keys and values.
    #[arg(long)]
    pub no_ephemeral: bool,
}

impl Default for NetworkArgs {
    fn default() -> Self {
        Self {
            port: 49737,
            address: "0.0.0.0".to_string(),
            bootstrap: Vec::new(),
            no_adaptive: false,
            no_ephemeral: false,
        }
    }
}

impl NetworkArgs {
    /// Validate the listen combination before an engine is constructed.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.address.parse::<IpAddr>().is_err() {
            return Err(AgentError::InvalidListenOptions(format!(
                "{} is not an IP address",
                self.address
            )));
        }
        Ok(())
    }

    pub fn adaptive(&self) -> bool {
        !self.no_adaptive
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            adaptive: !self.no_adaptive,
            ephemeral: !self.no_ephemeral,
            bootstrap: self.bootstrap.clone(),
            port: self.port,
            address: self.address.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn default_listen_options_are_valid() {
        let args = NetworkArgs::default();
        args.validate().unwrap();
        assert_eq!(args.port, 49737);
        assert!(args.adaptive());
    }

    #[test]
    fn non_ip_address_is_rejected() {
        let args = NetworkArgs {
            address: "not-an-address".to_string(),
            ..NetworkArgs::default()
        };
        assert_matches!(args.validate(), Err(AgentError::InvalidListenOptions(_)));
    }
}
