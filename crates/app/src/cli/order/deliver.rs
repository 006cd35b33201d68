use clap::Args;
use storefront_app::{
    config::AppConfig,
    context::AppContext,
    domain::orders::records::{DeliveryPayload, OrderUuid},
};

#[derive(Debug, Args)]
pub(crate) struct DeliverOrderArgs {
    /// Order UUID
    #[arg(long)]
    order: OrderUuid,

    /// Credentials or license keys to send to the customer
    #[arg(long, env = "DELIVERY_PAYLOAD", hide_env_values = true)]
    payload: String,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: DeliverOrderArgs) -> Result<(), String> {
    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let order = context
        .orders
        .add_order_delivery_info(args.order, DeliveryPayload::new(args.payload))
        .await
        .map_err(|error| format!("failed to record delivery: {error}"))?;

    super::print_order(&order);
    println!("delivery_email: {}", order.delivery_email);

    Ok(())
}
