use std::{str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use inventory_check::{
    client::ApiClient,
    config::{self, AppConfig},
    events::{EventSender, Notification},
    models::{CheckRow, InventoryCheckPayload, Product, RowKey, Warehouse},
    services::{lookup_stock, CatalogLookup, StockLookup, WarehouseLookup},
    workflow::{
        classify_row, row_variance, submit_stock_in, CheckDependencies, CheckSession,
        StockInReceipt, VarianceSummary,
    },
};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize()?;

    match cli.command {
        Commands::Products => handle_products(&context, cli.json).await?,
        Commands::Warehouses => handle_warehouses(&context, cli.json).await?,
        Commands::Stock(args) => handle_stock(&context, args, cli.json).await?,
        Commands::Count(args) => handle_count(&context, args, cli.json).await?,
        Commands::StockIn(args) => handle_stock_in(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "inventory-check",
    about = "Count warehouse stock and record stock-in receipts",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products available for counting
    Products,
    /// List warehouses
    Warehouses,
    /// Show the recorded stock of one product
    Stock(StockArgs),
    /// Run a physical count and submit it
    Count(CountArgs),
    /// Record goods received into a warehouse
    StockIn(StockInArgs),
}

#[derive(Args)]
struct StockArgs {
    #[arg(long, help = "Product identifier")]
    product: String,
}

#[derive(Args)]
struct CountArgs {
    #[arg(long, help = "Warehouse being counted")]
    warehouse: String,
    #[arg(
        long = "product",
        action = ArgAction::Append,
        required = true,
        help = "Product to count; repeat for several products"
    )]
    products: Vec<String>,
    #[arg(
        long = "actual",
        value_parser = parse_counted,
        action = ArgAction::Append,
        help = "Counted quantity as PRODUCT_ID=QTY; products left out are counted as 0"
    )]
    actual: Vec<CountedQuantity>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Show the count and payload without submitting"
    )]
    dry_run: bool,
}

#[derive(Args)]
struct StockInArgs {
    #[arg(long, help = "Warehouse receiving the goods")]
    warehouse: String,
    #[arg(
        long = "line",
        value_parser = parse_receipt_line,
        action = ArgAction::Append,
        required = true,
        help = "Received line as PRODUCT_ID=QTY@UNIT_COST (e.g. P1=12@3.50)"
    )]
    lines: Vec<ReceiptLineInput>,
    #[arg(long, help = "Optional note to attach to the receipt")]
    note: Option<String>,
}

/// Largest magnitude accepted for a counted quantity on the command line.
const MAX_COUNTED_QUANTITY: u64 = 1_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CountedQuantity {
    product_id: String,
    quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReceiptLineInput {
    product_id: String,
    quantity: i64,
    unit_cost: Decimal,
}

struct CliContext {
    _config: AppConfig,
    client: Arc<ApiClient>,
}

impl CliContext {
    fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let client = ApiClient::from_config(&config).context("failed to build API client")?;
        debug!(base_url = %client.base_url(), environment = %config.environment, "client ready");

        Ok(Self {
            _config: config,
            client: Arc::new(client),
        })
    }

    /// A session whose notifications are printed to stderr until it is dropped.
    fn session(&self, quiet: bool) -> (CheckSession, JoinHandle<()>) {
        let (events, rx) = EventSender::channel(32);
        let printer = tokio::spawn(print_notifications(rx, quiet));
        let session = CheckSession::new(CheckDependencies::from_client(self.client.clone()))
            .with_events(events);
        (session, printer)
    }
}

async fn print_notifications(mut rx: mpsc::Receiver<Notification>, quiet: bool) {
    while let Some(notice) = rx.recv().await {
        debug!(target: "inventory_check_cli", event = ?notice.event, "notification");
        if !quiet {
            eprintln!("[{}] {}", notice.level, notice.event.message());
        }
    }
}

async fn handle_products(context: &CliContext, json: bool) -> Result<()> {
    let products = context
        .client
        .fetch_products()
        .await
        .context("failed to load products")?;

    if json {
        print_json(&products)?;
    } else if products.is_empty() {
        println!("No products found.");
    } else {
        products.iter().for_each(render_product);
    }
    Ok(())
}

async fn handle_warehouses(context: &CliContext, json: bool) -> Result<()> {
    let warehouses = context
        .client
        .fetch_warehouses()
        .await
        .context("failed to load warehouses")?;

    if json {
        print_json(&warehouses)?;
    } else if warehouses.is_empty() {
        println!("No warehouses found.");
    } else {
        warehouses.iter().for_each(render_warehouse);
    }
    Ok(())
}

async fn handle_stock(context: &CliContext, args: StockArgs, json: bool) -> Result<()> {
    let lookup = lookup_stock(context.client.as_ref(), &args.product).await;

    if json {
        print_json(&StockReport {
            product_id: &args.product,
            quantity: lookup.quantity(),
            lookup: &lookup,
        })?;
    } else {
        match &lookup {
            StockLookup::Recorded { quantity } => {
                println!("Product {} • {} on hand", args.product, quantity)
            }
            StockLookup::Substituted { reason } => println!(
                "Product {} • stock unavailable ({}), counted as 0",
                args.product, reason
            ),
        }
    }
    Ok(())
}

async fn handle_count(context: &CliContext, args: CountArgs, json: bool) -> Result<()> {
    let (session, printer) = context.session(json);

    session
        .load_warehouses()
        .await
        .context("failed to load warehouses")?;
    let catalog = session
        .load_products()
        .await
        .context("failed to load products")?;

    session
        .choose_warehouse(&args.warehouse)
        .await
        .map_err(|e| anyhow!(e))?;

    let mut selection = args
        .products
        .iter()
        .map(|id| find_product(&catalog, id))
        .collect::<Result<Vec<_>>>()?;
    let rows = session
        .add_products(&mut selection)
        .await
        .map_err(|e| anyhow!(e))?;

    for counted in &args.actual {
        let keys = rows_for_product(&rows, &counted.product_id);
        if keys.is_empty() {
            return Err(anyhow!(
                "--actual given for {} which is not being counted",
                counted.product_id
            ));
        }
        for key in keys {
            session
                .edit_actual_quantity(key, Some(counted.quantity))
                .await;
        }
    }

    let rows = session.rows().await;
    let summary = session.summary().await;

    if args.dry_run {
        let payload = session
            .snapshot()
            .await
            .submission_payload()
            .map_err(|e| anyhow!(e))?;
        if json {
            print_json(&CountReport {
                submitted: false,
                rows: &rows,
                summary: &summary,
                payload: Some(&payload),
            })?;
        } else {
            render_count(&rows, &summary);
            println!("Dry run: nothing submitted.");
        }
    } else {
        session.submit().await.map_err(|e| anyhow!(e))?;
        if json {
            print_json(&CountReport {
                submitted: true,
                rows: &rows,
                summary: &summary,
                payload: None,
            })?;
        } else {
            render_count(&rows, &summary);
            println!("Inventory check submitted for warehouse {}.", args.warehouse);
        }
    }

    drop(session);
    printer.await.context("notification printer failed")?;
    Ok(())
}

async fn handle_stock_in(context: &CliContext, args: StockInArgs, json: bool) -> Result<()> {
    let catalog = context
        .client
        .fetch_products()
        .await
        .context("failed to load products")?;

    let mut receipt = StockInReceipt::new();
    receipt.set_warehouse(args.warehouse.clone());
    if let Some(note) = args.note.as_deref() {
        receipt.set_note(note);
    }
    for line in &args.lines {
        let product = find_product(&catalog, &line.product_id)?;
        receipt.add_line(&product, line.quantity, line.unit_cost);
    }

    let payload = submit_stock_in(context.client.as_ref(), &receipt, None)
        .await
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("failed to record stock-in for {}", args.warehouse))?;

    let totals = receipt.totals();
    if json {
        print_json(&serde_json::json!({ "payload": payload, "totals": totals }))?;
    } else {
        for line in receipt.lines() {
            println!(
                "  • {} x {} @ {} (total {})",
                line.quantity,
                line.product_name,
                line.unit_cost,
                line.line_total()
            );
        }
        println!(
            "Stock-in recorded for warehouse {}: {} line(s), {} unit(s), cost {}",
            args.warehouse, totals.line_count, totals.total_quantity, totals.total_cost
        );
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StockReport<'a> {
    product_id: &'a str,
    quantity: i64,
    lookup: &'a StockLookup,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CountReport<'a> {
    submitted: bool,
    rows: &'a [CheckRow],
    summary: &'a VarianceSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a InventoryCheckPayload>,
}

fn find_product(catalog: &[Product], id: &str) -> Result<Product> {
    catalog
        .iter()
        .find(|product| product.id == id)
        .cloned()
        .ok_or_else(|| anyhow!("unknown product '{id}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_product(product: &Product) {
    match product.price {
        Some(price) => println!("- Product {} • {} • price {}", product.id, product.name, price),
        None => println!("- Product {} • {}", product.id, product.name),
    }
}

fn render_warehouse(warehouse: &Warehouse) {
    println!("- Warehouse {} • {}", warehouse.id, warehouse.name);
}

fn render_count(rows: &[CheckRow], summary: &VarianceSummary) {
    for row in rows {
        println!(
            "  • {} ({}) system {} • actual {} • variance {:+} [{}]",
            row.product_name.as_deref().unwrap_or("-"),
            row.product_id.as_deref().unwrap_or("-"),
            row.system_quantity,
            row.actual_quantity,
            row_variance(row),
            classify_row(row)
        );
    }
    println!(
        "Totals: system {} • actual {} • variance {:+} ({} surplus, {} shortage, {} balanced)",
        summary.total_system_quantity,
        summary.total_actual_quantity,
        summary.total_variance,
        summary.surplus_rows,
        summary.shortage_rows,
        summary.balanced_rows
    );
}

/// Keys of every row counting `product_id`; a product listed twice has two rows.
fn rows_for_product(rows: &[CheckRow], product_id: &str) -> Vec<RowKey> {
    rows.iter()
        .filter(|row| row.product_id.as_deref() == Some(product_id))
        .map(|row| row.key)
        .collect()
}

fn parse_counted(raw: &str) -> Result<CountedQuantity, String> {
    let (product_id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid count '{raw}', expected PRODUCT_ID=QTY"))?;
    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err("product id cannot be empty".to_string());
    }
    let quantity: i64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity.trim()))?;
    if quantity.unsigned_abs() > MAX_COUNTED_QUANTITY {
        return Err(format!(
            "quantity {quantity} is out of range (at most {MAX_COUNTED_QUANTITY} either way)"
        ));
    }

    Ok(CountedQuantity {
        product_id: product_id.to_string(),
        quantity,
    })
}

fn parse_receipt_line(raw: &str) -> Result<ReceiptLineInput, String> {
    let (product_id, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid line '{raw}', expected PRODUCT_ID=QTY@UNIT_COST"))?;
    let (quantity, unit_cost) = rest
        .split_once('@')
        .ok_or_else(|| format!("invalid line '{raw}', missing @UNIT_COST"))?;

    let product_id = product_id.trim();
    if product_id.is_empty() {
        return Err("product id cannot be empty".to_string());
    }
    let quantity = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", quantity.trim()))?;
    let unit_cost = Decimal::from_str(unit_cost.trim())
        .map_err(|_| format!("invalid unit cost '{}'", unit_cost.trim()))?;
    if unit_cost.is_sign_negative() {
        return Err("unit cost cannot be negative".to_string());
    }

    Ok(ReceiptLineInput {
        product_id: product_id.to_string(),
        quantity,
        unit_cost,
    })
}
