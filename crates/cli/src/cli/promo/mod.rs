use clap::{Args, Subcommand};

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct PromoCommand {
    #[command(subcommand)]
    command: PromoSubcommand,
}

#[derive(Debug, Subcommand)]
enum PromoSubcommand {
    /// Validate a code and apply it to the cart
    Apply(ApplyPromotionArgs),

    /// Remove the applied code
    Remove,
}

#[derive(Debug, Args)]
struct ApplyPromotionArgs {
    /// Promotion code, in any case
    code: String,
}

pub(crate) async fn run(command: PromoCommand, storefront: &Storefront) -> Result<(), String> {
    let mut session = storefront.session().await;

    let notices = match command.command {
        PromoSubcommand::Apply(args) => session.apply_promotion(&args.code).await,
        PromoSubcommand::Remove => {
            if session.cart().promotion_code().is_none() {
                println!("no promotion applied");
                return Ok(());
            }

            session.remove_promotion()
        }
    };

    output::notices(&notices);

    let totals = session.totals();

    if !totals.promotion_discount.is_zero() {
        println!(
            "discount: {}",
            output::price(totals.promotion_discount, storefront.currency)
        );
    }

    output::summary(&session, storefront.currency);

    Ok(())
}
