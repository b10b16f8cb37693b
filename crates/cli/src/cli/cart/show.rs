use std::io;

use clap::Args;
use storefront::receipt::write_receipt;

use crate::cli::{
    Storefront,
    output::{self, CartView},
};

#[derive(Debug, Args)]
pub(crate) struct ShowCartArgs {
    /// Print the cart as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run(args: ShowCartArgs, storefront: &Storefront) -> Result<(), String> {
    let session = storefront.session().await;

    if args.json {
        return output::json(&CartView::of(&session));
    }

    if let Some(error) = session.cart().error() {
        println!("last error: {error}");
    }

    write_receipt(
        &mut io::stdout().lock(),
        session.cart(),
        &session.totals(),
        storefront.currency,
    )
    .map_err(|error| format!("failed to print cart: {error}"))
}
