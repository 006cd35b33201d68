use clap::Args;
use jiff::Timestamp;
use storefront::prelude::{OrderStatus, PaymentStatus};
use storefront_app::{
    config::AppConfig,
    context::AppContext,
    domain::{
        orders::data::{OrderFilter, PageRequest},
        users::UserId,
    },
};

#[derive(Debug, Args)]
pub(crate) struct ListOrdersArgs {
    /// Only orders in this status
    #[arg(long)]
    status: Option<OrderStatus>,

    /// Only orders with this payment status
    #[arg(long)]
    payment_status: Option<PaymentStatus>,

    /// Only orders placed by this user
    #[arg(long)]
    user_id: Option<String>,

    /// Only orders created at or after this instant (RFC 3339)
    #[arg(long)]
    created_from: Option<Timestamp>,

    /// Only orders created at or before this instant (RFC 3339)
    #[arg(long)]
    created_to: Option<Timestamp>,

    /// Page size
    #[arg(long, default_value_t = PageRequest::DEFAULT_LIMIT)]
    limit: usize,

    /// Cursor from a previous page
    #[arg(long)]
    cursor: Option<String>,

    #[command(flatten)]
    app: AppConfig,
}

pub(crate) async fn run(args: ListOrdersArgs) -> Result<(), String> {
    let user_id = args
        .user_id
        .as_deref()
        .map(UserId::parse)
        .transpose()
        .map_err(|error| format!("invalid user id: {error}"))?;

    let context = AppContext::from_config(&args.app)
        .await
        .map_err(|error| format!("failed to initialise application: {error}"))?;

    let page = context
        .orders
        .list_orders(
            OrderFilter {
                status: args.status,
                payment_status: args.payment_status,
                user_id,
                created_from: args.created_from,
                created_to: args.created_to,
            },
            PageRequest {
                limit: args.limit,
                cursor: args.cursor,
            },
        )
        .await
        .map_err(|error| format!("failed to list orders: {error}"))?;

    for order in &page.orders {
        println!(
            "{}  {}  {:<10}  {:<8}  {} {}  {}",
            order.uuid,
            order.order_number,
            order.status,
            order.payment_status,
            order.totals.total,
            order.currency,
            order.created_at
        );
    }

    if let Some(cursor) = page.next_cursor {
        println!("next_cursor: {cursor}");
    }

    Ok(())
}
