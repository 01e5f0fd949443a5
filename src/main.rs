use clap::Parser;
use log::{error, LevelFilter};
use std::path::Path;
use std::process;
use std::time::Duration;
use tinychain::{
    send_request, Account, Command, Difficulty, Genesis, Ledger, Node, NodeConfig, Opt, Request,
    Response, DEFAULT_REQUEST_TIMEOUT,
};

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Run {
            datadir,
            ip,
            port,
            miner,
            bootstrap_ip,
            bootstrap_port,
            sync_interval,
            disable_pow,
        } => {
            let mut config = NodeConfig::new(Path::new(&datadir), ip, port, Account::new(miner));
            if let (Some(bootstrap_ip), Some(bootstrap_port)) = (bootstrap_ip, bootstrap_port) {
                config = config.with_bootstrap(bootstrap_ip, bootstrap_port);
            }
            if let Some(secs) = sync_interval {
                config = config.with_sync_interval(Duration::from_secs(secs));
            }
            if disable_pow {
                config = config.with_difficulty(Difficulty::Disabled);
            }

            let node = Node::new(config)?;
            node.run()?;
        }
        Command::Balances { datadir } => {
            let datadir = Path::new(&datadir);
            let genesis = Genesis::load(&datadir.join("genesis.json"))?;
            // Read-only inspection of the local log; the stored hashes are
            // still verified during replay, but the difficulty check is
            // skipped so logs from disabled-pow nodes print too.
            let ledger = Ledger::open(
                &genesis,
                &datadir.join("blocks.db"),
                Difficulty::Disabled,
            )?;

            println!("Account balances at {}:", ledger.latest_hash());
            let mut balances: Vec<_> = ledger.balances().iter().collect();
            balances.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
            for (account, balance) in balances {
                println!("  {account}: {balance}");
            }
        }
        Command::TxAdd {
            node,
            from,
            to,
            value,
            data,
        } => {
            let request = Request::SubmitTx {
                from: Account::new(from),
                to: Account::new(to),
                value,
                data,
            };
            match send_request(&node, &request, DEFAULT_REQUEST_TIMEOUT)? {
                Response::Ack => println!("Transaction accepted; it will be mined shortly."),
                Response::Error { message } => return Err(message.into()),
                other => return Err(format!("unexpected response: {other:?}").into()),
            }
        }
        Command::Status { node } => {
            match send_request(&node, &Request::GetStatus, DEFAULT_REQUEST_TIMEOUT)? {
                Response::Status {
                    latest_hash,
                    height,
                    known_peers,
                } => {
                    println!("Height:      {height}");
                    println!("Latest hash: {latest_hash}");
                    println!("Known peers: {}", known_peers.len());
                    for peer in known_peers {
                        println!("  {} (bootstrap: {})", peer.address(), peer.is_bootstrap);
                    }
                }
                Response::Error { message } => return Err(message.into()),
                other => return Err(format!("unexpected response: {other:?}").into()),
            }
        }
    }

    Ok(())
}
