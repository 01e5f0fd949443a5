use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tinychain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "run", about = "Run a ledger node (serves peers, mines, syncs)")]
    Run {
        #[arg(long = "datadir", help = "Directory for the genesis file and block log")]
        datadir: String,
        #[arg(long = "ip", default_value = "127.0.0.1", help = "IP to listen on")]
        ip: String,
        #[arg(long = "port", default_value_t = crate::config::DEFAULT_PORT, help = "Port to listen on")]
        port: u16,
        #[arg(long = "miner", help = "Account credited with block rewards")]
        miner: String,
        #[arg(long = "bootstrap-ip", help = "IP of a bootstrap peer to sync with")]
        bootstrap_ip: Option<String>,
        #[arg(long = "bootstrap-port", help = "Port of the bootstrap peer")]
        bootstrap_port: Option<u16>,
        #[arg(long = "sync-interval", help = "Seconds between sync cycles")]
        sync_interval: Option<u64>,
        #[arg(
            long = "disable-pow",
            help = "Accept any block hash (local experimentation only)"
        )]
        disable_pow: bool,
    },
    #[command(name = "balances", about = "Replay the local block log and print balances")]
    Balances {
        #[arg(long = "datadir", help = "Directory for the genesis file and block log")]
        datadir: String,
    },
    #[command(name = "tx-add", about = "Submit a transaction to a running node")]
    TxAdd {
        #[arg(long = "node", default_value = "127.0.0.1:8080", help = "Node address")]
        node: String,
        #[arg(long = "from", help = "Sender account")]
        from: String,
        #[arg(long = "to", help = "Recipient account")]
        to: String,
        #[arg(long = "value", help = "Amount to transfer")]
        value: u64,
        #[arg(long = "data", default_value = "", help = "Optional free-text tag")]
        data: String,
    },
    #[command(name = "status", about = "Query a running node's chain tip and peers")]
    Status {
        #[arg(long = "node", default_value = "127.0.0.1:8080", help = "Node address")]
        node: String,
    },
}
