use clap::{Args, Subcommand};
use storefront_app::domain::products::records::ProductRecord;

mod create;
mod show;

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    Create(create::CreateProductArgs),
    Show(show::ShowProductArgs),
}

pub(crate) async fn run(command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::Create(args) => create::run(args).await,
        ProductSubcommand::Show(args) => show::run(args).await,
    }
}

fn print_product(product: &ProductRecord) {
    println!("product_uuid: {}", product.uuid);
    println!("name: {}", product.name);
    println!("price: {}", product.price);
    println!("rating_average: {:.2}", product.rating.average);
    println!("rating_count: {}", product.rating.count);
}
