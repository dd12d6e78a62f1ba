use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use fincontrol::{
    PasswordHash, ValidatedPassword, YearMonth, initialize_db,
    seed::{
        CategoryKind, NewAccount, NewCard, NewProvisioned, PaymentSource, Recurrence,
        TransactionKind, create_account, create_card, create_category, create_control,
        create_provisioned, create_user, generate_through, parse_email,
    },
};

/// A utility for creating a demo database for the fincontrol server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user test@example.com with the password 'test'...");
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(
        parse_email("test@example.com")?,
        "Test User",
        password_hash,
        &conn,
    )?;

    println!("Creating a household control...");
    let control = create_control("Household", user.id, &conn)?;

    let checking = create_account(
        control.id,
        &NewAccount {
            name: "Checking".to_owned(),
            opening_balance: 2500.0,
        },
        &conn,
    )?;
    create_account(
        control.id,
        &NewAccount {
            name: "Savings".to_owned(),
            opening_balance: 8000.0,
        },
        &conn,
    )?;
    let card = create_card(
        control.id,
        &NewCard {
            name: "Visa".to_owned(),
            closing_day: 5,
            due_day: 15,
            credit_limit: 5000.0,
            payment_account_id: checking.id,
        },
        &conn,
    )?;

    let salary = create_category(control.id, "Salary", CategoryKind::Income, &conn)?;
    let housing = create_category(control.id, "Housing", CategoryKind::Expense, &conn)?;
    let utilities = create_category(control.id, "Utilities", CategoryKind::Expense, &conn)?;
    let shopping = create_category(control.id, "Shopping", CategoryKind::Expense, &conn)?;

    let this_month = YearMonth::from_date(OffsetDateTime::now_utc().date());
    let start_month = this_month.add_months(-2);

    println!("Creating provisioned transactions from {start_month}...");
    let plans = [
        (
            "Salary",
            4200.0,
            TransactionKind::Income,
            PaymentSource::Account(checking.id),
            salary.id,
            1,
            Recurrence::Monthly { end_month: None },
        ),
        (
            "Rent",
            1400.0,
            TransactionKind::Expense,
            PaymentSource::Account(checking.id),
            housing.id,
            3,
            Recurrence::Monthly { end_month: None },
        ),
        (
            "Internet",
            80.0,
            TransactionKind::Expense,
            PaymentSource::Card(card.id),
            utilities.id,
            10,
            Recurrence::Monthly { end_month: None },
        ),
        (
            "Laptop",
            1800.0,
            TransactionKind::Expense,
            PaymentSource::Card(card.id),
            shopping.id,
            12,
            Recurrence::Installments { count: 6 },
        ),
    ];

    for (description, amount, kind, source, category_id, day_of_month, recurrence) in plans {
        create_provisioned(
            control.id,
            &NewProvisioned {
                description: description.to_owned(),
                amount,
                kind,
                source,
                category_id: Some(category_id),
                classification_id: None,
                start_month,
                day_of_month,
                recurrence,
            },
            &conn,
        )?;
    }

    let through = this_month.add_months(1);
    let created = generate_through(control.id, through, &conn)?;
    println!("Generated {created} ledger entries through {through}.");

    println!("Success!");

    Ok(())
}
