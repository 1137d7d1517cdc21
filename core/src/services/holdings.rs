use std::{path::PathBuf, process::Command};

use anyhow::anyhow;
use tracing::{debug, error};

use crate::{
    models::holding::Holding,
    services::shared::env::{get_env_variable, project_root},
};

const MIX_HOLDINGS_QUERY: &str = r#"
import Ecto.Query
Dividendsomatic.Repo.all(
  from h in Dividendsomatic.Portfolio.Holding,
  select: {h.symbol, h.listing_exchange, h.isin},
  distinct: true
) |> Enum.each(fn {s, e, isin} -> IO.puts(s <> "\t" <> (e || "") <> "\t" <> (isin || "")) end)
"#;

/// Anything that can list the instruments currently held.
pub trait HoldingsSource {
    fn list_symbols(&self) -> anyhow::Result<Vec<Holding>>;
}

/// Parses `symbol\texchange\tisin` lines. Lines starting with `[` are log output of the
/// store and get ignored.
pub fn parse_holdings(output: &str) -> Vec<Holding> {
    output
        .trim()
        .split('\n')
        .filter(|line| line.contains('\t') && !line.starts_with('['))
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 2 {
                return None;
            }
            Some(Holding {
                symbol: parts[0].to_string(),
                exchange: parts[1].to_string(),
                isin: parts
                    .get(2)
                    .map(|isin| isin.trim())
                    .filter(|isin| !isin.is_empty())
                    .map(String::from),
            })
        })
        .collect()
}

/// Asks the portfolio store for its holdings by running an external command.
pub struct CommandHoldingsSource {
    command: Option<String>,
    working_dir: PathBuf,
}

impl CommandHoldingsSource {
    pub fn new(command: Option<String>, working_dir: PathBuf) -> Self {
        Self {
            command,
            working_dir,
        }
    }

    pub fn from_env() -> Self {
        Self::new(get_env_variable("HOLDINGS_COMMAND"), project_root())
    }

    fn build_command(&self) -> Command {
        match &self.command {
            Some(command) => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c").arg(command);
                cmd
            }
            None => {
                let mut cmd = Command::new("mix");
                cmd.args(["run", "-e", MIX_HOLDINGS_QUERY]);
                cmd
            }
        }
    }

    fn run(&self) -> anyhow::Result<Vec<Holding>> {
        let output = self.build_command().current_dir(&self.working_dir).output()?;
        if !output.status.success() {
            debug!(
                "Holdings command stderr: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| anyhow!("Holdings command returned invalid UTF-8: {}", e))?;
        Ok(parse_holdings(&stdout))
    }
}

impl HoldingsSource for CommandHoldingsSource {
    fn list_symbols(&self) -> anyhow::Result<Vec<Holding>> {
        match self.run() {
            Ok(holdings) => Ok(holdings),
            Err(e) => {
                error!("Error fetching symbols from DB: {}", e);
                Ok(vec![])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_holdings() {
        let output = "[warning] compiling 2 files\n\
                      KEK\tHEX\tFI0009000202\n\
                      AAPL\tNASDAQ\t\n\
                      no tabs here\n\
                      700\tSEHK\n";
        let holdings = parse_holdings(output);
        assert_eq!(
            holdings,
            vec![
                Holding {
                    symbol: "KEK".to_string(),
                    exchange: "HEX".to_string(),
                    isin: Some("FI0009000202".to_string()),
                },
                Holding {
                    symbol: "AAPL".to_string(),
                    exchange: "NASDAQ".to_string(),
                    isin: None,
                },
                Holding {
                    symbol: "700".to_string(),
                    exchange: "SEHK".to_string(),
                    isin: None,
                },
            ]
        );
    }

    #[test]
    fn test_parse_holdings_ignores_bracketed_lines_with_tabs() {
        assert!(parse_holdings("[info]\tsomething\tlogged").is_empty());
        assert!(parse_holdings("").is_empty());
    }

    #[test]
    fn test_command_source_reads_stdout() {
        let source = CommandHoldingsSource::new(
            Some("printf 'NOKIA\\tHEX\\tFI0009000681\\n'".to_string()),
            std::env::temp_dir(),
        );
        let holdings = source.list_symbols().unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "NOKIA");
    }

    #[test]
    fn test_command_source_failure_yields_empty_list() {
        let source = CommandHoldingsSource::new(
            None,
            PathBuf::from("/nonexistent/directory/for/holdings"),
        );
        assert!(source.list_symbols().unwrap().is_empty());
    }
}
