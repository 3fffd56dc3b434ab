use anyhow::{Result, anyhow, bail};
use jt_types::NetworkId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Connect,
    Disconnect,
    Switch(NetworkId),
    /// Simulates the user picking another account inside the extension.
    Account { address: String, name: Option<String> },
    Deny(bool),
    Unavailable(bool),
    Status,
    Sign(String),
    Quit,
}

pub(crate) fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "connect" => Command::Connect,
        "disconnect" => Command::Disconnect,
        "switch" => Command::Switch(rest.parse()?),
        "account" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            let address = parts
                .next()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| anyhow!("usage: account <address> [name]"))?;
            let name = parts
                .next()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned);
            Command::Account {
                address: address.to_owned(),
                name,
            }
        }
        "deny" => Command::Deny(toggle(rest)?),
        "unavailable" => Command::Unavailable(toggle(rest)?),
        "status" => Command::Status,
        "sign" => {
            if rest.is_empty() {
                bail!("usage: sign <text>");
            }
            Command::Sign(rest.to_owned())
        }
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command: {other}"),
    };

    Ok(Some(command))
}

fn toggle(value: &str) -> Result<bool> {
    match value {
        "" | "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(anyhow!("expected on/off, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_commands() -> Result<()> {
        assert_eq!(parse("connect")?, Some(Command::Connect));
        assert_eq!(parse("  switch Testnet ")?, Some(Command::Switch(NetworkId::Testnet)));
        assert_eq!(parse("deny off")?, Some(Command::Deny(false)));
        assert_eq!(parse("unavailable")?, Some(Command::Unavailable(true)));
        assert_eq!(parse("sign hello world")?, Some(Command::Sign("hello world".to_owned())));
        assert_eq!(parse("# comment")?, None);
        assert_eq!(parse("")?, None);
        Ok(())
    }

    #[test]
    fn parses_account_with_optional_name() -> Result<()> {
        assert_eq!(
            parse("account juno1xyz Bob Smith")?,
            Some(Command::Account {
                address: "juno1xyz".to_owned(),
                name: Some("Bob Smith".to_owned()),
            })
        );
        assert_eq!(
            parse("account juno1xyz")?,
            Some(Command::Account {
                address: "juno1xyz".to_owned(),
                name: None,
            })
        );
        Ok(())
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse("switch devnet").is_err());
        assert!(parse("account").is_err());
        assert!(parse("sign").is_err());
        assert!(parse("deny maybe").is_err());
        assert!(parse("launch").is_err());
    }
}
