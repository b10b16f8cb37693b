use clap::{Parser, Subcommand};
use rusty_money::iso::Currency;
use storefront::receipt::find_currency;
use storefront_app::{context::AppContext, session::CartSession};

use crate::config::Settings;

mod cart;
mod catalog;
mod checkout;
mod delivery;
mod output;
mod promo;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront cart CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart(cart::CartCommand),

    /// Choose where the order is delivered
    Delivery(delivery::DeliveryCommand),

    /// Apply or remove a promotion code
    Promo(promo::PromoCommand),

    /// Browse the product catalog
    Catalog(catalog::CatalogCommand),

    /// Turn the cart into an order
    Checkout(checkout::CheckoutArgs),
}

/// What every command runs against.
pub(crate) struct Storefront {
    pub(crate) context: AppContext,
    pub(crate) currency: &'static Currency,
}

impl Storefront {
    /// Opens a session and restores the saved cart, printing any notices.
    pub(crate) async fn session(&self) -> CartSession {
        let mut session = self.context.session();
        let notices = session.load().await;

        output::notices(&notices);

        session
    }
}

impl Cli {
    pub(crate) fn load() -> Self {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let currency = find_currency(&self.settings.checkout.currency)
            .map_err(|error| error.to_string())?;

        let context = AppContext::from_settings(self.settings.app_settings())
            .map_err(|error| output::error_chain(&error))?;

        let storefront = Storefront { context, currency };

        match self.command {
            Commands::Cart(command) => cart::run(command, &storefront).await,
            Commands::Delivery(command) => delivery::run(command, &storefront).await,
            Commands::Promo(command) => promo::run(command, &storefront).await,
            Commands::Catalog(command) => catalog::run(command, &storefront).await,
            Commands::Checkout(args) => checkout::run(args, &storefront).await,
        }
    }
}
