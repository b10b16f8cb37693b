use clap::Args;
use storefront::delivery::DeliveryInfo;

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct SetDeliveryArgs {
    /// City
    #[arg(long)]
    city: String,

    /// Neighborhood within the city
    #[arg(long)]
    neighborhood: String,
}

pub(crate) async fn run(args: SetDeliveryArgs, storefront: &Storefront) -> Result<(), String> {
    if args.city.trim().is_empty() || args.neighborhood.trim().is_empty() {
        return Err("city and neighborhood cannot be empty".to_string());
    }

    let mut session = storefront.session().await;

    output::notices(&session.set_delivery(DeliveryInfo::new(
        args.city.trim(),
        args.neighborhood.trim(),
    )));

    println!(
        "delivery fee: {}",
        output::price(session.totals().delivery_fee, storefront.currency)
    );
    output::summary(&session, storefront.currency);

    Ok(())
}
