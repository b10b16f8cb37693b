use clap::Args;

use crate::cli::{Storefront, output};

#[derive(Debug, Args)]
pub(crate) struct ListDestinationsArgs {
    /// Only list neighborhoods of this city
    #[arg(long)]
    city: Option<String>,
}

pub(crate) fn run(args: &ListDestinationsArgs, storefront: &Storefront) {
    let table = &storefront.context.delivery;

    let cities: Vec<&str> = match &args.city {
        Some(city) => vec![city.as_str()],
        None => table.cities().collect(),
    };

    for city in cities {
        let neighborhoods = table.neighborhoods(city);

        if neighborhoods.is_empty() {
            println!("no delivery configured for {city}");
            continue;
        }

        println!("{city}");

        let width = neighborhoods
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);

        for (name, fee) in neighborhoods {
            println!("  {name:<width$}  {}", output::price(fee, storefront.currency));
        }
    }
}
