use clap::{Args, Subcommand};

use crate::cli::Storefront;

mod add;
mod clear;
mod remove;
mod show;
mod update;

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart and its totals
    Show(show::ShowCartArgs),

    /// Add a product
    Add(add::AddItemArgs),

    /// Remove a product
    Remove(remove::RemoveItemArgs),

    /// Change the quantity of a product
    Update(update::UpdateQuantityArgs),

    /// Empty the cart, its delivery selection and promotion
    Clear,
}

pub(crate) async fn run(command: CartCommand, storefront: &Storefront) -> Result<(), String> {
    match command.command {
        CartSubcommand::Show(args) => show::run(args, storefront).await,
        CartSubcommand::Add(args) => add::run(args, storefront).await,
        CartSubcommand::Remove(args) => remove::run(args, storefront).await,
        CartSubcommand::Update(args) => update::run(args, storefront).await,
        CartSubcommand::Clear => clear::run(storefront).await,
    }
}
