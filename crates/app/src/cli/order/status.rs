use clap::Args;
use storefront::prelude::OrderStatus;
use storefront_app::{config::AppConfig, context::AppContext, domain::orders::records::OrderUuid};

#[derive(Debug, Args)]
pub(crate) struct UpdateStatusArgs {
    /// Order UUID
    #[arg(long)]
    order: OrderUuid,

    /// New status (processing, completed, cancelled)
    #[arg(long)]
    status: OrderStatus,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: UpdateStatusArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let order = context
        .orders
        .update_order_status(args.order, args.status)
        .await
        .map_err(|error| format!("failed to update order status: {error}"))?;

    super::print_order(&order);

    Ok(())
}
