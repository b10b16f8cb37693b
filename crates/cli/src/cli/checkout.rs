use clap::Args;
use storefront::checkout::CustomerDetails;

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Full name
    #[arg(long)]
    name: String,

    /// Email address
    #[arg(long)]
    email: String,

    /// Phone number
    #[arg(long, default_value = "")]
    phone: String,

    /// Street address
    #[arg(long)]
    address: String,

    /// Print the order as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run(args: CheckoutArgs, storefront: &Storefront) -> Result<(), String> {
    let mut session = storefront.session().await;

    let draft = session
        .checkout(CustomerDetails {
            name: args.name,
            email: args.email,
            phone: args.phone,
            address: args.address,
        })
        .map_err(|error| format!("checkout failed: {error}"))?;

    if args.json {
        return output::json(&draft);
    }

    let currency = storefront.currency;

    println!("order for {} <{}>", draft.customer.name, draft.customer.email);
    println!(
        "deliver to {}, {}, {}",
        draft.customer.address, draft.delivery.neighborhood, draft.delivery.city
    );

    for line in &draft.lines {
        println!(
            "  {} x {} @ {} = {}",
            line.quantity,
            line.title,
            output::price(line.unit_price, currency),
            output::price(line.line_total, currency)
        );
    }

    if let Some(code) = &draft.promotion_code {
        println!(
            "promotion {code}: -{}",
            output::price(draft.totals.promotion_discount, currency)
        );
    }

    println!("delivery: {}", output::price(draft.totals.delivery_fee, currency));
    println!("total: {}", output::price(draft.totals.total, currency));
    println!("loyalty points earned: {}", draft.loyalty_points);

    if let Some(commission) = &draft.influencer_commission {
        println!(
            "commission for {}: {} ({}%)",
            commission.handle,
            output::price(commission.amount, currency),
            commission.percent
        );
    }

    Ok(())
}
