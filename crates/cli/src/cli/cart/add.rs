use clap::Args;
use storefront::{items::LineItem, prices::Price};

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct AddItemArgs {
    /// Product identifier
    id: String,

    /// Units to add
    #[arg(short, long, default_value_t = 1_u32)]
    quantity: u32,

    /// Title, for products missing from the local catalog
    #[arg(long, requires = "price")]
    title: Option<String>,

    /// List price in minor units, for products missing from the local catalog
    #[arg(long, requires = "title")]
    price: Option<u64>,

    /// Promotional price in minor units
    #[arg(long)]
    promo_price: Option<u64>,

    /// Units in stock
    #[arg(long)]
    stock: Option<u32>,

    /// Category name
    #[arg(long)]
    category: Option<String>,
}

impl AddItemArgs {
    /// Line item described by the flags, or by the local catalog entry for `id`.
    fn line_item(&self, storefront: &Storefront) -> Result<LineItem, String> {
        let mut item = match (&self.title, self.price) {
            (Some(title), Some(price)) => {
                LineItem::new(self.id.clone(), title.clone(), Price::new(price))
            }
            _ => storefront
                .context
                .catalog
                .local()
                .get(&self.id)
                .map(|product| product.to_line_item())
                .ok_or_else(|| {
                    format!(
                        "unknown product {}; pass --title and --price to add it anyway",
                        self.id
                    )
                })?,
        };

        if let Some(promo_price) = self.promo_price {
            item = item.with_promo_price(Price::new(promo_price));
        }

        if let Some(stock) = self.stock {
            item = item.with_stock(stock);
        }

        if let Some(category) = &self.category {
            item = item.with_category(category.clone());
        }

        Ok(item)
    }
}

pub(crate) async fn run(args: AddItemArgs, storefront: &Storefront) -> Result<(), String> {
    let item = args.line_item(storefront)?;
    let mut session = storefront.session().await;

    output::notices(&session.add_item(item, args.quantity));
    output::summary(&session, storefront.currency);

    Ok(())
}
