//! Loads two mock Cyclos wallets through the aggregator and prints their merged history,
//! newest first, using the default reqwest transport and a file-backed token store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use finbridge::{
	aggregate::Aggregator,
	backend::BackendRegistry,
	capability::Capabilities,
	store::{CredentialStore, FileStore},
	stream::collect,
};

async fn mock_wallet(server: &MockServer, days: &[u8]) {
	let items = days
		.iter()
		.map(|day| {
			json!({
				"id": format!("{}-{day}", server.port()),
				"amount": "2.50",
				"currency": { "symbol": "LOK" },
				"date": format!("2024-06-{day:02}T08:00:00Z"),
				"description": "Market stall",
			})
		})
		.collect::<Vec<_>>();

	server
		.mock_async(|when, then| {
			when.method(GET).path("/1/transactions");
			then.status(200)
				.header("content-type", "application/json")
				.header("X-Has-Next-Page", "false")
				.body(json!(items).to_string());
		})
		.await;
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let first = MockServer::start_async().await;
	let second = MockServer::start_async().await;

	mock_wallet(&first, &[12, 7, 3]).await;
	mock_wallet(&second, &[10, 4]).await;

	let path = std::env::temp_dir().join("finbridge-demo-tokens.json");
	let store: Arc<dyn CredentialStore> = Arc::new(FileStore::open(path.clone())?);
	let aggregator =
		Aggregator::new(BackendRegistry::with_defaults()?, Capabilities::with_reqwest(store));
	let wallet = |server: &MockServer, token: &str| {
		json!({
			"host": format!("http://127.0.0.1:{}", server.port()),
			"cyclos_id": "1",
			"cyclos_token": token,
		})
	};
	let credentials = json!({ "cyclos": [wallet(&first, "a"), wallet(&second, "b")] });

	aggregator.load(&credentials).await?;

	let mut merged = aggregator.recent_transactions()?;

	for transaction in collect(&mut merged).await? {
		println!("{} {} {}", transaction.date.date(), transaction.amount, transaction.id);
	}

	println!("Session tokens persisted in {}.", path.display());

	Ok(())
}
