use anyhow::{Context, Result};
use rusty_smartsheet::{Filter, IndexSpec, Sheet, Tabular};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn payload() -> serde_json::Value {
    let contacts = [
        (525791232583556i64, "Alice Smith", "alice.smith@acme.com", "ACME"),
        (5029390859954052, "Bob Lee", "bob.lee@acme.com", "ACME"),
        (2777591046268804, "Charlie Brown", "charlie.brown@globex.com", "Globex"),
    ];
    let rows: Vec<_> = contacts
        .iter()
        .enumerate()
        .map(|(position, (id, name, email, company))| {
            json!({
                "id": id,
                "rowNumber": position + 1,
                "cells": [
                    {"columnId": 1, "value": name},
                    {"columnId": 2, "value": email},
                    {"columnId": 3, "value": company},
                ],
            })
        })
        .collect();
    json!({
        "id": 1,
        "name": "Index Test Sheet",
        "columns": [
            {"id": 1, "title": "Full Name", "type": "TEXT_NUMBER", "primary": true},
            {"id": 2, "title": "Email Address", "type": "TEXT_NUMBER"},
            {"id": 3, "title": "Company Name", "type": "TEXT_NUMBER"},
        ],
        "rows": rows,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A sheet body saved from the API can be passed as the first argument
    let json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read '{}'", path))?,
        None => payload().to_string(),
    };

    let mut sheet = Sheet::from_json(&json)?;
    sheet.build_index(vec![
        IndexSpec::non_unique(["Company Name"]),
        IndexSpec::unique(["Company Name", "Full Name"]),
        IndexSpec::unique(["Email Address"]),
    ])?;

    for index in sheet.indexes().iter() {
        println!("{:?} (unique: {}): {} keys", index.columns(), index.is_unique(), index.len());
    }

    println!("{:#?}", sheet.as_list());

    let row = sheet
        .get_row(Filter::new().with("Email Address", "charlie.brown@globex.com"))?
        .context("Charlie Brown not found")?;
    println!("{:#?}", row.as_map());

    let row = sheet
        .get_row(Filter::new().with("Full Name", "Alice Smith").with("Company Name", "ACME"))?
        .context("Alice Smith not found")?;
    println!("{:#?}", row.as_map());

    let rows = sheet.get_rows(&Filter::new().with("Company Name", "ACME"))?;
    let rows: Vec<_> = rows.into_iter().map(|row| row.as_map()).collect();
    println!("{:#?}", rows);

    Ok(())
}
