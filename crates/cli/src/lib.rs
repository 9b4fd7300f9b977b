pub mod args;
mod feed;
mod status;
mod wave;

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
};
use anyhow::Context;
use args::Cli;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use wave_portal_sdk::{
    Deployment,
    contract::{AlloyGateway, Gateway},
    session::Session,
    submission::Notice,
    wallet::{RpcWallet, WalletProvider},
};

use crate::args::Commands;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = RpcClient::builder().connect(&cli.rpc).await.context("connecting to RPC")?;
    let poll_interval = Duration::from_millis(cli.poll_interval_ms);
    client.set_poll_interval(poll_interval);

    let (provider, wallet) = match &cli.private_key {
        Some(signer) => {
            let account = signer.address();
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer.clone()))
                .connect_client(client)
                .erased();
            (provider.clone(), RpcWallet::with_local_account(provider, account))
        },
        None => {
            let provider = ProviderBuilder::new().connect_client(client).erased();
            (provider.clone(), RpcWallet::new(provider))
        },
    };

    let rinkeby = Deployment::rinkeby();
    let deployment = Deployment::custom(
        cli.chain_id.unwrap_or(rinkeby.chain_id()),
        cli.contract.unwrap_or(rinkeby.wave_portal()),
        cli.explorer.clone().unwrap_or_else(|| rinkeby.explorer().to_string()),
    );

    let wallet = wallet.with_poll_interval(poll_interval);

    // An unreachable node is the terminal counterpart of a missing wallet
    let wallet = match wallet.chain_id().await {
        Ok(_) => Some(wallet),
        Err(err) => {
            warn!("wallet node is not reachable: {}", err);
            None
        },
    };
    let session = Session::mount(&deployment, wallet, AlloyGateway::new(&deployment, provider)).await;

    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        cancellation_signal.cancel();
    });

    match cli.command {
        Commands::Status => status::render(session).await,
        Commands::Connect => status::connect(session).await,
        Commands::Feed { follow, num_updates, table } => {
            feed::render(session, follow, num_updates, table, cancellation_token).await?
        },
        Commands::Wave { message, no_wait } => {
            wave::render(session, message, no_wait, cancellation_token).await?
        },
    }

    Ok(())
}

/// Prints notices raised by the session since the last call.
pub(crate) fn print_notices<W: WalletProvider, G: Gateway>(session: &mut Session<W, G>) {
    for notice in session.take_notices() {
        let text = notice.to_string();
        let text = match notice {
            Notice::NoWallet => text.bold().bright_red(),
            Notice::Rejected(_) | Notice::Failed(_) => text.red(),
            Notice::NoAuthorizedAccount | Notice::Pending(_) => text.yellow(),
            Notice::Mined(_) => text.green(),
        };
        println!("{}", text);
    }
}

/// Unix timestamp to render relative times against.
pub(crate) fn now() -> u64 { chrono::Utc::now().timestamp().max(0) as u64 }
