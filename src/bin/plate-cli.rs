// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use plate_reader_node::cli::{execute, render, PlateCliArgs};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    // stdout carries the JSON result
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = PlateCliArgs::parse();

    if !args.image.is_file() {
        println!("{}", serde_json::json!({ "error": "File not found" }));
        std::process::exit(1);
    }

    match execute(&args).await.and_then(|result| render(&result, args.pretty)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}
