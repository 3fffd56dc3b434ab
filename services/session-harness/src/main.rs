//! Drives a wallet session from stdin against the in-memory extension.
//!
//! One command per line; every command answers with a JSON line on stdout.
//! Logs go to stderr (`RUST_LOG` filters them).

mod command;

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use command::Command;
use jt_network::{JUNO_MAINNET_CHAIN_ID, NetworkRegistry};
use jt_session::{ErrorKind, InMemoryNetworkPreference, SessionController, SessionError};
use jt_types::{ChainId, NetworkId, SessionSnapshot};
use jt_wallet_provider::{InMemoryWalletProvider, LocalSigner, MemoryAccount, Signer, WalletProvider};
use serde::Serialize;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

type Controller = SessionController<Rc<InMemoryWalletProvider>, NetworkRegistry>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: Option<ErrorKind>,
    message: String,
}

#[derive(Debug, Serialize)]
struct Reply {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
    session: SessionSnapshot,
}

impl Reply {
    fn ok(session: SessionSnapshot) -> Self {
        Self {
            ok: true,
            error: None,
            signature: None,
            session,
        }
    }

    fn session_error(err: &SessionError, session: SessionSnapshot) -> Self {
        Self {
            ok: false,
            error: Some(ErrorBody {
                kind: Some(err.kind()),
                message: err.to_string(),
            }),
            signature: None,
            session,
        }
    }

    fn usage_error(err: &anyhow::Error, session: SessionSnapshot) -> Self {
        Self {
            ok: false,
            error: Some(ErrorBody {
                kind: None,
                message: format!("{err:#}"),
            }),
            signature: None,
            session,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let registry = NetworkRegistry::from_env().context("invalid network configuration")?;
    let preference = match std::env::var("JT_NETWORK") {
        Ok(value) => InMemoryNetworkPreference::with_network(
            value
                .parse::<NetworkId>()
                .context("JT_NETWORK must be mainnet or testnet")?,
        ),
        Err(_) => InMemoryNetworkPreference::default(),
    };

    let account = std::env::var("JT_ACCOUNT").unwrap_or_else(|_| {
        LocalSigner::new_random(ChainId(JUNO_MAINNET_CHAIN_ID.to_owned()), "juno")
            .address()
            .0
            .clone()
    });
    let provider = Rc::new(InMemoryWalletProvider::new().with_account(&account, None));
    let controller = Rc::new(SessionController::new(provider.clone(), registry, preference));

    info!(account = %account, network = %controller.network(), "session harness ready");

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async move {
            let listener = controller.clone();
            tokio::task::spawn_local(async move {
                listener.listen_for_account_changes().await;
            });
            run(&controller, &provider).await
        })
        .await
}

async fn run(controller: &Controller, provider: &InMemoryWalletProvider) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                write_reply(&mut stdout, &Reply::usage_error(&err, controller.snapshot())).await?;
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        let reply = execute(controller, provider, command).await;
        write_reply(&mut stdout, &reply).await?;
    }

    Ok(())
}

async fn execute(controller: &Controller, provider: &InMemoryWalletProvider, command: Command) -> Reply {
    let result = match command {
        Command::Connect => controller.connect().await,
        Command::Disconnect => controller.disconnect(),
        Command::Switch(network) => controller.switch_network(network).await,
        Command::Account { address, name } => {
            provider.switch_account(MemoryAccount::new(&address, name.as_deref()));
            // Let the listener task pick up the notification.
            tokio::task::yield_now().await;
            Ok(controller.snapshot())
        }
        Command::Deny(deny) => {
            provider.set_deny(deny);
            Ok(controller.snapshot())
        }
        Command::Unavailable(unavailable) => {
            provider.set_available(!unavailable);
            info!(available = provider.is_available(), "extension availability changed");
            Ok(controller.snapshot())
        }
        Command::Status => Ok(controller.snapshot()),
        Command::Sign(text) => return sign(controller, &text).await,
        Command::Quit => Ok(controller.snapshot()),
    };

    match result {
        Ok(session) => Reply::ok(session),
        Err(err) => Reply::session_error(&err, controller.snapshot()),
    }
}

async fn sign(controller: &Controller, text: &str) -> Reply {
    let Some(signer) = controller.current_signer() else {
        let err = anyhow::anyhow!("wallet is not connected");
        return Reply::usage_error(&err, controller.snapshot());
    };

    match signer.sign(text.as_bytes()).await {
        Ok(signature) => Reply {
            signature: Some(STANDARD.encode(signature)),
            ..Reply::ok(controller.snapshot())
        },
        Err(err) => Reply::session_error(&SessionError::Provider(err), controller.snapshot()),
    }
}

async fn write_reply(stdout: &mut tokio::io::Stdout, reply: &Reply) -> Result<()> {
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;
    Ok(())
}
