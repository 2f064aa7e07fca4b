use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "order-cli")]
#[command(about = "Operator CLI for the order service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place an order
    Place {
        /// Line item as CODE:QTY, repeatable
        #[arg(short, long = "item", value_parser = parse_item, required = true)]
        items: Vec<(String, u32)>,
    },
    /// Show service health
    Health,
    /// Show the inventory circuit breaker
    Circuit,
}

fn parse_item(raw: &str) -> Result<(String, u32), String> {
    let (code, qty) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected CODE:QTY, got '{}'", raw))?;
    let qty = qty
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity in '{}': {}", raw, e))?;
    Ok((code.to_string(), qty))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Place { items } => {
            let line_items: Vec<Value> = items
                .into_iter()
                .map(|(code, qty)| json!({ "itemCode": code, "requestedQuantity": qty }))
                .collect();
            client
                .post(format!("{}/api/order", cli.url))
                .json(&json!({ "lineItems": line_items }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
        Commands::Circuit => {
            client
                .get(format!("{}/api/inventory/circuit", cli.url))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    println!("HTTP {}", status);
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
