use clap::{Parser, Subcommand};
use storefront_app::config::LoggingConfig;

mod db;
mod order;
mod product;
mod review;

#[derive(Debug, Parser)]
#[command(name = "storefront-app", about = "Storefront admin CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Product(product::ProductCommand),
    Order(order::OrderCommand),
    Review(review::ReviewCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Product(command) => product::run(command).await,
            Commands::Order(command) => order::run(command).await,
            Commands::Review(command) => review::run(command).await,
        }
    }
}
