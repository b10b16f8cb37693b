use clap::{Args, Subcommand};

use crate::cli::Storefront;

mod clear;
mod list;
mod set;

#[derive(Debug, Args)]
pub(crate) struct DeliveryCommand {
    #[command(subcommand)]
    command: DeliverySubcommand,
}

#[derive(Debug, Subcommand)]
enum DeliverySubcommand {
    /// Choose the delivery city and neighborhood
    Set(set::SetDeliveryArgs),

    /// Forget the delivery selection
    Clear,

    /// List destinations and their fees
    List(list::ListDestinationsArgs),
}

pub(crate) async fn run(command: DeliveryCommand, storefront: &Storefront) -> Result<(), String> {
    match command.command {
        DeliverySubcommand::Set(args) => set::run(args, storefront).await,
        DeliverySubcommand::Clear => clear::run(storefront).await,
        DeliverySubcommand::List(args) => {
            list::run(&args, storefront);
            Ok(())
        }
    }
}
