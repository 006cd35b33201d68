use clap::Args;
use storefront_app::{
    config::AppConfig,
    context::AppContext,
    domain::products::{data::NewProduct, records::ProductUuid},
};

#[derive(Debug, Args)]
pub(crate) struct CreateProductArgs {
    /// Product display name
    #[arg(long)]
    name: String,

    /// Price in minor units
    #[arg(long)]
    price: u64,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<ProductUuid>,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: CreateProductArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let product = context
        .products
        .create_product(NewProduct {
            uuid: args.product_uuid.unwrap_or_else(ProductUuid::new),
            name: args.name,
            price: args.price,
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    super::print_product(&product);

    Ok(())
}
