// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use expense_tracker::config::{Config, StorageBackend, DEFAULT_CONFIG_FILE};
use expense_tracker::{
    category_label, logging, open_storage, Category, Expense, ExpenseFilter, ExpenseStore,
    KeyValueStore, Notice, StoredExpense,
};
use std::path::PathBuf;

type Store = ExpenseStore<Box<dyn KeyValueStore + Send>>;

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", about = "Record and query personal expenses", version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "EXPENSE_TRACKER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// SQLite database file (overrides config file)
    #[arg(long, env = "EXPENSE_TRACKER_DB")]
    db: Option<PathBuf>,

    /// Keep everything in memory for this run (overrides config file)
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new expense (every field is required)
    Add(ExpenseArgs),
    /// Show every stored expense
    List,
    /// Show the expenses matching all given fields
    Search(ExpenseArgs),
    /// Remove an expense by id
    Delete { id: u64 },
    /// Show the category codes
    Categories,
    /// Browse expenses interactively
    Ui,
}

#[derive(Args, Debug, Default)]
struct ExpenseArgs {
    #[arg(long, default_value = "")]
    year: String,
    #[arg(long, default_value = "")]
    month: String,
    #[arg(long, default_value = "")]
    day: String,
    /// Category code: 1=Food 2=Education 3=Leisure 4=Health 5=Transport
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    amount: String,
}

impl From<ExpenseArgs> for Expense {
    fn from(args: ExpenseArgs) -> Self {
        Expense::new(
            args.year,
            args.month,
            args.day,
            args.category,
            args.description,
            args.amount,
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(db) = cli.db {
        config.storage.path = db;
    }
    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }

    logging::init(&config.logging);

    let storage = open_storage(&config.storage).context("Failed to open storage")?;
    let mut store = ExpenseStore::new(storage).context("Failed to initialize expense store")?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Add(args) => run_add(&mut store, args.into())?,
        Command::List => print_expenses(&store.list_all()?),
        Command::Search(args) => {
            let criteria = ExpenseFilter::from(Expense::from(args));
            print_expenses(&store.filter(&criteria)?);
        }
        Command::Delete { id } => run_delete(&mut store, id)?,
        Command::Categories => {
            for category in Category::ALL {
                println!("{}  {}", category.code(), category.label());
            }
        }
        Command::Ui => run_ui_mode(&mut store)?,
    }

    Ok(())
}

fn run_add(store: &mut Store, expense: Expense) -> Result<()> {
    if !expense.validate() {
        let notice = Notice::incomplete();
        eprintln!("❌ {}", notice.title);
        eprintln!("   {}", notice.body);
        eprintln!("   Missing: {}", expense.missing_fields().join(", "));
        std::process::exit(1);
    }

    let id = store.save(&expense)?;
    let notice = Notice::saved();
    println!("✓ {}", notice.title);
    println!("   {} (id {})", notice.body, id);

    Ok(())
}

fn run_delete(store: &mut Store, id: u64) -> Result<()> {
    match store.get(id) {
        Ok(Some(expense)) => {
            store.delete(id)?;
            println!(
                "✓ Deleted expense {}: {} {}",
                id,
                expense.display_date(),
                expense.description
            );
        }
        Ok(None) => {
            store.delete(id)?;
            println!("✓ Nothing stored under id {}", id);
        }
        Err(e) => {
            tracing::warn!(id, error = %e, "Deleting unreadable expense record");
            store.delete(id)?;
            println!("✓ Deleted unreadable record {}", id);
        }
    }

    Ok(())
}

fn print_expenses(expenses: &[StoredExpense]) {
    if expenses.is_empty() {
        println!("No expenses found");
        return;
    }

    println!(
        "{:>5}  {:<12} {:<12} {:<30} {:>12}",
        "Id", "Date", "Category", "Description", "Amount"
    );
    println!("{}", "─".repeat(75));

    for stored in expenses {
        let expense = &stored.expense;
        println!(
            "{:>5}  {:<12} {:<12} {:<30} {:>12}",
            stored.id,
            expense.display_date(),
            category_label(&expense.category),
            expense.description,
            expense.amount
        );
    }

    println!("{}", "─".repeat(75));
    println!("{} expense(s)", expenses.len());
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: &mut Store) -> Result<()> {
    let expenses = store.list_all()?;

    let mut app = ui::App::new(expenses);
    ui::run_ui(&mut app, store)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: &mut Store) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: add, list, search, delete");
    std::process::exit(1);
}
