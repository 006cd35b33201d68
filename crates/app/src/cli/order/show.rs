use clap::Args;
use storefront_app::{config::AppConfig, context::AppContext, domain::orders::records::OrderUuid};

#[derive(Debug, Args)]
pub(crate) struct ShowOrderArgs {
    /// Order UUID
    #[arg(long)]
    order: OrderUuid,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: ShowOrderArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let order = context
        .orders
        .get_order(args.order)
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    super::print_order(&order);

    for line in &order.items {
        println!(
            "item: {} x {} @ {} ({})",
            line.quantity, line.name, line.unit_price, line.product_uuid
        );
    }

    Ok(())
}
