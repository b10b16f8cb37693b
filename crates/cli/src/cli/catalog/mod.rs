use clap::{Args, Subcommand};
use storefront_app::{
    catalog::{Listing, ListingOrigin, NamedEntry},
    notice::Notice,
};

use crate::cli::{Storefront, output};

mod products;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List products
    Products(products::ListProductsArgs),

    /// List categories
    Categories(ListEntriesArgs),

    /// List cities
    Cities(ListEntriesArgs),
}

#[derive(Debug, Args)]
struct ListEntriesArgs {
    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) async fn run(command: CatalogCommand, storefront: &Storefront) -> Result<(), String> {
    let catalog = &storefront.context.catalog;

    match command.command {
        CatalogSubcommand::Products(args) => products::run(args, storefront).await,
        CatalogSubcommand::Categories(args) => {
            print_entries(&catalog.categories().await, args.json)
        }
        CatalogSubcommand::Cities(args) => print_entries(&catalog.cities().await, args.json),
    }
}

fn print_entries(listing: &Listing<Vec<NamedEntry>>, json: bool) -> Result<(), String> {
    if json {
        return output::json(listing);
    }

    print_provenance(listing.origin, listing.notice.as_ref());

    if listing.data.is_empty() {
        println!("nothing found");
    }

    for entry in &listing.data {
        match entry.products_count {
            Some(count) => println!("{}  {} ({count})", entry.id, entry.name),
            None => println!("{}  {}", entry.id, entry.name),
        }
    }

    Ok(())
}

fn print_provenance(origin: ListingOrigin, notice: Option<&Notice>) {
    if let Some(notice) = notice {
        output::notices(std::slice::from_ref(notice));
    }

    match origin {
        ListingOrigin::Remote => {}
        ListingOrigin::Cached => println!("(saved results)"),
        ListingOrigin::Local => println!("(local products)"),
    }
}
