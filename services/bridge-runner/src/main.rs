//! Drives the bridge against a development node over HTTP JSON-RPC:
//! initialize, connect when nothing is pre-authorized, read, and optionally
//! write `MSGBRIDGE_SET_MESSAGE`.

use mb_bridge::{Bridge, BridgeConfig, Outcome, Session, SessionState};
use mb_provider::{Eip1193Provider, TokioTimer};
use mb_rpc_http::HttpTransport;
use std::rc::Rc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BridgeConfig::from_env();
    let transport = HttpTransport::new(None);
    info!(
        endpoint = transport.endpoint(),
        contract = %config.contract_address,
        "bridge-runner starting"
    );

    let bridge = Bridge::new(
        Some(Rc::new(Eip1193Provider::new(transport))),
        Rc::new(TokioTimer),
        config,
    );

    let mut outcome = bridge.initialize().await;
    alert(&outcome);

    if outcome.session.state() == SessionState::AccountsEnumerated {
        outcome = bridge.connect(outcome.session).await;
        alert(&outcome);
    }

    if let Some(new_message) = std::env::var("MSGBRIDGE_SET_MESSAGE").ok().filter(|m| !m.is_empty()) {
        outcome = bridge.write_message(outcome.session, &new_message).await;
        alert(&outcome);
    }

    render(&outcome.session);

    if let Some(last) = outcome.notices.last() {
        anyhow::bail!("{last}");
    }
    Ok(())
}

fn alert(outcome: &Outcome) {
    for notice in &outcome.notices {
        eprintln!("! {notice}");
    }
}

fn render(session: &Session) {
    match session.active_account() {
        Some(account) => {
            println!("Connected Account: {account}");
            println!(
                "Current Message from Contract: {}",
                session.message().unwrap_or_default()
            );
        }
        None => println!("Not connected ({:?})", session.state()),
    }
}
