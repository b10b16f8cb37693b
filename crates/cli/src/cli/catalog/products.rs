use clap::Args;
use storefront_app::catalog::{ProductQuery, SortDirection};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

use crate::cli::{Storefront, output};

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Args)]
pub(crate) struct ListProductsArgs {
    /// Free text search
    #[arg(long)]
    search: Option<String>,

    /// Category identifier
    #[arg(long)]
    category: Option<String>,

    /// City identifier
    #[arg(long)]
    city: Option<String>,

    /// Sort field, e.g. price or name
    #[arg(long)]
    sort: Option<String>,

    /// Sort direction
    #[arg(long, value_enum)]
    direction: Option<Direction>,

    /// Page number, starting at 1
    #[arg(long)]
    page: Option<u32>,

    /// Products per page
    #[arg(long)]
    per_page: Option<u32>,

    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

impl ListProductsArgs {
    fn query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.clone(),
            category: self.category.clone(),
            city: self.city.clone(),
            sort: self.sort.clone(),
            direction: self.direction.map(|direction| match direction {
                Direction::Asc => SortDirection::Asc,
                Direction::Desc => SortDirection::Desc,
            }),
            page: self.page,
            per_page: self.per_page,
        }
    }
}

pub(crate) async fn run(args: ListProductsArgs, storefront: &Storefront) -> Result<(), String> {
    let listing = storefront.context.catalog.products(&args.query()).await;

    if args.json {
        return output::json(&listing);
    }

    super::print_provenance(listing.origin, listing.notice.as_ref());

    let page = &listing.data;

    if page.data.is_empty() {
        println!("no products found");
        return Ok(());
    }

    let mut builder = Builder::default();

    builder.push_record(["ID", "Product", "Category", "Price", "Stock"]);

    for product in &page.data {
        let price = match product.promo_price {
            Some(promo) => format!(
                "{} (was {})",
                output::price(promo, storefront.currency),
                output::price(product.price, storefront.currency)
            ),
            None => output::price(product.price, storefront.currency),
        };

        let stock = if product.stock == 0 {
            "-".to_string()
        } else {
            product.stock.to_string()
        };

        builder.push_record([
            product.id.clone(),
            product.title.clone(),
            product.category.clone(),
            price,
            stock,
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(3..5), Alignment::right());

    println!("{table}");
    println!(
        "page {} of {} ({} products)",
        page.current_page, page.last_page, page.total
    );

    Ok(())
}
