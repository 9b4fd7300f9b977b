use colored::Colorize;
use wave_portal_sdk::{
    contract::Gateway,
    session::{Session, View},
    wallet::WalletProvider,
};

use crate::print_notices;

pub(crate) async fn render<W: WalletProvider, G: Gateway>(mut session: Session<W, G>) {
    print_notices(&mut session);

    let deployment = session.deployment();
    println!("{}", format!("{:#^80}", " Wave Portal ").bold().purple());
    println!("Contract: {} (chain {})", deployment.wave_portal(), deployment.chain_id());

    match session.view() {
        View::NoWallet => {
            println!("{}", "Please install a wallet".bold().bright_red());
            return;
        },
        View::Connect => println!("Account:  {}", "not connected, see `connect`".yellow()),
        View::Compose { account, can_submit: _ } => {
            println!("Account:  {}", account.to_string().blue());
        },
    }

    if session.network_correct() {
        println!("Network:  {}", "ok".green());
    } else {
        println!("Network:  {}", "wrong network, switch to the required test network".red());
    }

    match session.total_waves().await {
        Ok(total) => println!("Waves:    {}", total),
        Err(err) => println!("Waves:    {} ({})", "unavailable".dimmed(), err),
    }

    session.unmount();
}

pub(crate) async fn connect<W: WalletProvider, G: Gateway>(mut session: Session<W, G>) {
    if session.account().is_none() {
        session.connect().await;
    }
    render(session).await
}
