use clap::Args;
use storefront_app::{
    config::AppConfig, context::AppContext, domain::products::records::ProductUuid,
};

/// Rebuild a product's rating aggregate from its reviews.
#[derive(Debug, Args)]
pub(crate) struct RecalculateArgs {
    /// Product UUID
    #[arg(long)]
    product: ProductUuid,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: RecalculateArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let rating = context
        .reviews
        .recalculate_product_rating(args.product)
        .await
        .map_err(|error| format!("failed to recalculate rating: {error}"))?;

    println!("product_uuid: {}", args.product);
    println!("rating_average: {:.4}", rating.average);
    println!("rating_count: {}", rating.count);

    Ok(())
}
