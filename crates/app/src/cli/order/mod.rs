use clap::{Args, Subcommand};
use storefront_app::domain::orders::records::OrderRecord;

mod deliver;
mod list;
mod show;
mod status;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    Show(show::ShowOrderArgs),
    List(list::ListOrdersArgs),
    Status(status::UpdateStatusArgs),
    Deliver(deliver::DeliverOrderArgs),
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Show(args) => show::run(args).await,
        OrderSubcommand::List(args) => list::run(args).await,
        OrderSubcommand::Status(args) => status::run(args).await,
        OrderSubcommand::Deliver(args) => deliver::run(args).await,
    }
}

fn print_order(order: &OrderRecord) {
    println!("order_uuid: {}", order.uuid);
    println!("order_number: {}", order.order_number);
    println!("user_id: {}", order.user_id);
    println!("status: {}", order.status);
    println!("payment_status: {}", order.payment_status);
    println!("subtotal: {}", order.totals.subtotal);
    println!("tax: {}", order.totals.tax);
    println!("discount: {}", order.totals.discount);
    println!("total: {} {}", order.totals.total, order.currency);
    println!("delivery_method: {}", order.delivery_method);

    match &order.delivery {
        Some(delivery) => println!("delivered_at: {}", delivery.sent_at),
        None => println!("delivered_at: -"),
    }

    println!("created_at: {}", order.created_at);
}
