use clap::Args;

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct UpdateQuantityArgs {
    /// Product identifier
    id: String,

    /// New quantity; zero removes the product
    #[arg(allow_negative_numbers = true)]
    quantity: i64,
}

pub(crate) async fn run(args: UpdateQuantityArgs, storefront: &Storefront) -> Result<(), String> {
    let mut session = storefront.session().await;

    let notices = session
        .update_quantity(&args.id, args.quantity)
        .map_err(|error| error.to_string())?;

    output::notices(&notices);
    output::summary(&session, storefront.currency);

    Ok(())
}
