use clap::Args;

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct RemoveItemArgs {
    /// Product identifier
    id: String,
}

pub(crate) async fn run(args: RemoveItemArgs, storefront: &Storefront) -> Result<(), String> {
    let mut session = storefront.session().await;

    if session.cart().item(&args.id).is_none() {
        println!("{} is not in the cart", args.id);
        return Ok(());
    }

    output::notices(&session.remove_item(&args.id));
    output::summary(&session, storefront.currency);

    Ok(())
}
