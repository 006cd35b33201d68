use clap::Args;
use storefront_app::{
    config::AppConfig, context::AppContext, domain::products::records::ProductUuid,
};

#[derive(Debug, Args)]
pub(crate) struct ShowProductArgs {
    /// Product UUID
    #[arg(long)]
    product: ProductUuid,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: ShowProductArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let product = context
        .products
        .get_product(args.product)
        .await
        .map_err(|error| format!("failed to load product: {error}"))?;

    super::print_product(&product);

    Ok(())
}
