use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "coldchain-router", version, about = "Cold-chain routing engine")]
pub struct Args {
    #[arg(long)]
    pub bind_addr: Option<String>,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}
