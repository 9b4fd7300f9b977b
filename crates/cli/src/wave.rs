use anyhow::Context;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use wave_portal_sdk::{
    contract::Gateway,
    session::{Session, Update, View},
    wallet::WalletProvider,
};

use crate::print_notices;

pub(crate) async fn render<W: WalletProvider, G: Gateway>(
    mut session: Session<W, G>,
    message: String,
    no_wait: bool,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    match session.view() {
        View::NoWallet => return Err(anyhow::anyhow!("no wallet found")),
        View::Connect => {
            session.connect().await;
        },
        View::Compose { .. } => (),
    }
    let Some(account) = session.account() else {
        print_notices(&mut session);
        return Err(anyhow::anyhow!("no account authorized, see `connect`"));
    };

    session.set_message(message);
    let result = session.submit().await;
    print_notices(&mut session);
    let tx_hash = result.context("sending wave")?;

    println!("{}", format!("Waved from {} in tx {}", account, tx_hash).bright_blue());

    if no_wait {
        session.unmount();
        return Ok(());
    }

    loop {
        let update = tokio::select! {
            _ = cancellation_token.cancelled() => break,
            update = session.next_update() => update,
        };
        match update {
            Some(Update::Settled { tx_hash: settled, mined }) if settled == tx_hash => {
                print_notices(&mut session);
                if !mined {
                    return Err(anyhow::anyhow!("transaction {} failed", tx_hash));
                }
                break;
            },
            Some(_) => print_notices(&mut session),
            None => break,
        }
    }

    session.unmount();

    Ok(())
}
