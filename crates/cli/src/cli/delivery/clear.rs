use crate::cli::{Storefront, output};

pub(crate) async fn run(storefront: &Storefront) -> Result<(), String> {
    let mut session = storefront.session().await;

    output::notices(&session.clear_delivery());
    output::summary(&session, storefront.currency);

    Ok(())
}
