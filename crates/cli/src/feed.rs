use std::io::Write;

use colored::Colorize;
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    execute,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wave_portal_sdk::{
    contract::Gateway,
    session::{Session, View},
    wallet::WalletProvider,
};

use crate::{now, print_notices};

pub(crate) async fn render<W: WalletProvider, G: Gateway>(
    mut session: Session<W, G>,
    follow: bool,
    num_updates: Option<u64>,
    table: bool,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    if session.view() == View::NoWallet {
        println!("{}", "Please install a wallet".bold().bright_red());
        return Ok(());
    }

    if !follow {
        println!("{}", header(&session));
        println!("{}", feed(&session, table));
        session.unmount();
        return Ok(());
    }

    let mut updates_left = num_updates;

    let mut stdout = std::io::stdout();

    execute!(stdout, EnterAlternateScreen, Clear(ClearType::All), MoveTo(0, 0))?;
    draw(&mut stdout, &session, table)?;

    while updates_left.is_none_or(|count| count > 0) {
        let update = tokio::select! {
            _ = cancellation_token.cancelled() => break,
            update = session.next_update() => update,
        };
        let Some(update) = update else { break };
        debug!(?update, "feed update");

        draw(&mut stdout, &session, table)?;

        if let Some(ref mut count) = updates_left {
            *count -= 1;
        }
    }

    execute!(stdout, LeaveAlternateScreen)?;

    // Notices raised while the alternate screen was shown
    print_notices(&mut session);
    session.unmount();

    Ok(())
}

fn draw<W: WalletProvider, G: Gateway>(
    stdout: &mut std::io::Stdout,
    session: &Session<W, G>,
    table: bool,
) -> std::io::Result<()> {
    stdout.queue(Clear(ClearType::All))?;
    stdout.queue(MoveTo(0, 0))?;
    stdout.queue(Print(format!("{}\n", header(session))))?;
    stdout.queue(Print(feed(session, table)))?;
    stdout.flush()
}

fn header<W: WalletProvider, G: Gateway>(session: &Session<W, G>) -> String {
    let account = match session.account() {
        Some(account) => account.to_string().blue(),
        None => "not connected".yellow(),
    };
    format!(
        "{}\n{} | {} | {} wave(s)\n",
        format!("{:#^80}", " Wave Portal ").bold().purple(),
        account,
        if session.network_correct() { "network ok".green() } else { "wrong network".red() },
        session.feed().len(),
    )
}

fn feed<W: WalletProvider, G: Gateway>(session: &Session<W, G>, table: bool) -> String {
    let view = session.feed().view(session.deployment().explorer(), now());
    if table { format!("{:#}", view) } else { format!("{}", view) }
}
